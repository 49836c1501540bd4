//! # Cart Module
//!
//! The in-progress sale: lines, pricing passes, totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Front Desk Action        Register Session        Cart Change           │
//! │  ─────────────────        ────────────────        ───────────           │
//! │                                                                         │
//! │  Scan Product ───────────► add_product() ───────► add_line()            │
//! │                                                                         │
//! │  Change Quantity ────────► update_quantity() ───► lines[i].qty = n      │
//! │                                                                         │
//! │  Click Remove ───────────► remove_line() ───────► lines.remove(i)       │
//! │                                                                         │
//! │  Attach Customer ────────► attach_customer() ───► recompute()           │
//! │                                                                         │
//! │  Every mutation is followed by recompute(): discounts are derived       │
//! │  state, recalculated from the ledger + catalog, never edited by hand.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! Lines are keyed by a generated `line_id`, NOT by product: the same
//! grooming service can appear twice in one cart for two different pets.
//! Adding the same product for the same pet merges into the existing line.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::benefit::resolve_discount;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, TaxRate, UserLedger};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of an in-progress sale.
///
/// ## Snapshot Semantics
/// `product` is a frozen copy taken when the line was added. Catalog edits
/// after that moment (price changes, deactivation) do not touch this line.
/// `product.price_cents` stays pristine even while a redemption zeroes the
/// display price, so un-redeeming can restore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Generated line identifier (UUID v4), unique within the cart.
    pub line_id: String,

    /// Frozen product snapshot from the moment of adding.
    pub product: Product,

    /// Unit price the customer currently sees. Equals the snapshot price,
    /// except on redeemed lines where it is zero.
    pub price_cents: i64,

    /// Quantity on this line.
    pub quantity: i64,

    /// Flat membership discount for the line, in cents. Computed off ONE
    /// unit price regardless of quantity (a deliberate membership rule:
    /// "5% off your groom", not "5% off each of seven grooms").
    pub discount_cents: i64,

    /// Which pet receives the service, when the front desk recorded one.
    pub pet_id: Option<String>,

    /// Benefit that produced `discount_cents`, for receipt display.
    pub applied_benefit_id: Option<String>,

    /// Credit provisionally paying for this line, if any.
    pub redeemed_credit_id: Option<String>,

    /// Whether this line is being paid with a prepaid credit.
    pub is_redemption: bool,
}

impl CartLine {
    /// Creates a new line from a product snapshot.
    ///
    /// ## Price Freezing
    /// The price is captured at this moment. If the product price changes
    /// in the catalog, this line retains the original price.
    pub fn from_product(product: &Product, quantity: i64, pet_id: Option<String>) -> Self {
        CartLine {
            line_id: Uuid::new_v4().to_string(),
            product: product.clone(),
            price_cents: product.price_cents,
            quantity,
            discount_cents: 0,
            pet_id,
            applied_benefit_id: None,
            redeemed_credit_id: None,
            is_redemption: false,
        }
    }

    /// The display unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Line subtotal: display price × quantity, minus the flat discount.
    /// Redeemed lines contribute zero (price and discount both zeroed).
    pub fn line_subtotal_cents(&self) -> i64 {
        self.price_cents * self.quantity - self.discount_cents
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale.
///
/// ## Invariants
/// - Lines are unique by `line_id`
/// - Same (product, pet) pairs merge on add; redeemed lines never merge
/// - Quantity per line is 1..=999, line count is at most 100
/// - `discount_cents` and `price_cents` are derived state, owned by
///   `recompute` and the redemption toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    /// Lines in the sale, in add order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product to the cart, merging with an existing line when the
    /// same product was already added for the same pet.
    ///
    /// ## Returns
    /// The id of the line that now carries the product (existing on merge,
    /// fresh otherwise).
    pub fn add_line(
        &mut self,
        product: &Product,
        quantity: i64,
        pet_id: Option<String>,
    ) -> CoreResult<String> {
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        // Merge with an existing (product, pet) line. Redeemed lines are
        // frozen at their credit terms and never absorb new quantity.
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product.id == product.id && l.pet_id == pet_id && !l.is_redemption)
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(line.line_id.clone());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let line = CartLine::from_product(product, quantity, pet_id);
        let line_id = line.line_id.clone();
        self.lines.push(line);
        Ok(line_id)
    }

    /// Updates the quantity of a line.
    ///
    /// ## Behavior
    /// - Quantity 0 removes the line
    /// - Negative quantity is rejected with a validation error
    /// - Unknown line id is a `LineNotFound` error
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(line_id);
        }

        if quantity < 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.line_id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotFound(line_id.to_string())),
        }
    }

    /// Removes a line by id.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound(line_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Looks up a line by id.
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    /// Looks up a line by id, mutably.
    pub fn line_mut(&mut self, line_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.line_id == line_id)
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Re-derives price and discount on every line from the ledger and
    /// catalog.
    ///
    /// ## When To Call
    /// After ANY event that could change pricing: line added or edited,
    /// customer attached or detached, redemption toggled. The pass is
    /// idempotent, so over-calling is merely wasted work.
    ///
    /// ## Redeemed Lines
    /// Lines paid by credit keep their zeroed price and discount; only the
    /// redemption toggle changes them.
    pub fn recompute(&mut self, ledger: &UserLedger, catalog: &Catalog) {
        for line in self.lines.iter_mut() {
            if line.is_redemption {
                continue;
            }
            line.price_cents = line.product.price_cents;
            let resolution = resolve_discount(line, ledger, catalog);
            line.discount_cents = resolution.discount_cents;
            line.applied_benefit_id = resolution.benefit_id;
        }
    }

    /// Calculates the subtotal (after per-line discounts, before tax).
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_subtotal_cents()).sum()
    }

    /// Calculates the total membership discount across all lines.
    pub fn discount_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.discount_cents).sum()
    }

    /// Calculates the cart totals at a given tax rate.
    ///
    /// Tax applies to the discounted subtotal as ONE rounding operation,
    /// never per line: rounding per line then summing can differ by a cent
    /// from what the shop's filing expects.
    pub fn totals(&self, tax_rate: TaxRate) -> CartTotals {
        let subtotal_cents = self.subtotal_cents();
        let tax_cents = Money::from_cents(subtotal_cents)
            .calculate_tax(tax_rate)
            .cents();

        CartTotals {
            line_count: self.line_count(),
            total_quantity: self.total_quantity(),
            subtotal_cents,
            discount_cents: self.discount_cents(),
            tax_cents,
            total_cents: subtotal_cents + tax_cents,
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart totals summary, frozen onto orders and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    /// Sum of line subtotals (discounts already subtracted).
    pub subtotal_cents: i64,
    /// Sum of line discounts (informational; already inside subtotal).
    pub discount_cents: i64,
    /// Tax on the discounted subtotal, rounded half away from zero.
    pub tax_cents: i64,
    /// subtotal + tax.
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Checkout
//!
//! Finalizes the session's cart: freezes an order, derives the successor
//! ledger, commits it, and hands back a receipt.
//!
//! ## Commit Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Commit Loop                               │
//! │                                                                         │
//! │  cart ──reprice──► Order (frozen) ──apply_order──► successor ledger    │
//! │                                                          │              │
//! │                                                    store.save()         │
//! │                                                    │          │         │
//! │                                             Ok(version)   conflict      │
//! │                                                    │          │         │
//! │                                                receipt    reload ledger │
//! │                                                           reprice cart  │
//! │                                                           try again     │
//! │                                                           (3 attempts)  │
//! │                                                                         │
//! │  The cart is REPRICED against every freshly loaded ledger: when a      │
//! │  rival terminal spent the credit we were about to redeem, the re-run   │
//! │  reports it missing instead of double-spending it. The customer still  │
//! │  pays the price the register showed; the report tells the back office  │
//! │  what went sideways.                                                    │
//! │                                                                         │
//! │  Walk-ins skip the loop entirely: no customer, no ledger, no save.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use pawdesk_core::{apply_order, CartLine, FinalizeReport, Order};
use pawdesk_ledger::{LedgerStore, StoreError};

use crate::error::{RegisterError, RegisterResult};
use crate::session::{AttachedCustomer, RegisterSession};

/// How many times a checkout re-runs finalization against a freshly loaded
/// ledger before giving up with `CheckoutConflict`. Conflicts need a rival
/// terminal writing the SAME customer mid-checkout, so one retry almost
/// always settles it.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

// =============================================================================
// Receipt DTOs
// =============================================================================

/// One printed line on the receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    /// Display unit price; zero on redeemed lines.
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub line_total_cents: i64,
    /// Whether a prepaid credit paid for this line.
    pub redeemed: bool,
}

impl From<&CartLine> for ReceiptLine {
    fn from(line: &CartLine) -> Self {
        ReceiptLine {
            name: line.product.name.clone(),
            sku: line.product.sku.clone(),
            quantity: line.quantity,
            unit_price_cents: line.price_cents,
            discount_cents: line.discount_cents,
            line_total_cents: line.line_subtotal_cents(),
            redeemed: line.is_redemption,
        }
    }
}

/// One credit spend on the receipt's loyalty section.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditSpend {
    pub credit_id: String,
    pub units_spent: i64,
    pub exhausted: bool,
}

/// What this sale did to the customer's loyalty ledger.
///
/// `missing_credits` and `skipped_definitions` surface the fail-open
/// misses: things the register honored at the counter but could not settle
/// against the ledger or catalog. Empty on a clean sale and always empty
/// for walk-ins.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoyaltySummary {
    pub memberships_activated: Vec<String>,
    pub credits_issued: Vec<String>,
    pub credits_consumed: Vec<CreditSpend>,
    pub missing_credits: Vec<String>,
    pub skipped_definitions: Vec<String>,
    /// Ledger version the sale committed as. `None` for walk-ins.
    pub ledger_version: Option<u64>,
}

impl LoyaltySummary {
    fn from_report(report: &FinalizeReport, ledger_version: Option<u64>) -> Self {
        LoyaltySummary {
            memberships_activated: report.memberships_activated.clone(),
            credits_issued: report.credits_issued.clone(),
            credits_consumed: report
                .credits_consumed
                .iter()
                .map(|consumed| CreditSpend {
                    credit_id: consumed.credit_id.clone(),
                    units_spent: consumed.units_spent,
                    exhausted: consumed.exhausted,
                })
                .collect(),
            missing_credits: report.missing_credits.clone(),
            skipped_definitions: report.skipped_definitions.clone(),
            ledger_version,
        }
    }
}

/// An inventory delta the host application should apply for a sold product.
///
/// The register does not own the product database; it reports what the sale
/// consumed (from the frozen line snapshots) and the console applies it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockAdjustment {
    pub product_id: String,
    pub sku: String,
    /// Negative: units leaving the shelf.
    pub delta: i64,
    /// Whether the post-sale stock level sits at or under the product's
    /// reorder threshold.
    pub below_threshold: bool,
}

/// The completed sale, ready for printing and for the console to act on.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub receipt_number: String,
    pub store_name: String,
    pub terminal_id: String,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
    pub customer_id: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub loyalty: LoyaltySummary,
    pub stock_adjustments: Vec<StockAdjustment>,
}

// =============================================================================
// Checkout
// =============================================================================

impl RegisterSession {
    /// Completes the sale.
    ///
    /// For a customer sale this freezes the cart into an order, derives the
    /// successor ledger, and commits it with optimistic concurrency: a
    /// version conflict reloads the ledger, reprices, and re-runs
    /// finalization, up to three attempts. Walk-in sales skip the ledger
    /// entirely.
    ///
    /// On success the cart is cleared and the session keeps the customer
    /// attached at the committed ledger version. On `CheckoutConflict` the
    /// cart is left intact so the front desk can try again.
    pub async fn checkout<S>(&mut self, store: &S, now: DateTime<Utc>) -> RegisterResult<Receipt>
    where
        S: LedgerStore + ?Sized,
    {
        if self.cart.is_empty() {
            return Err(RegisterError::EmptyCart);
        }

        let attached = self.attached.clone();
        let (order, report, ledger_version) = match attached {
            None => {
                let order = Order::from_cart(&self.cart, None, self.config.tax_rate, now);
                debug!(order_id = %order.id, "Walk-in checkout, no ledger touched");
                (order, FinalizeReport::default(), None)
            }
            Some(att) => {
                let AttachedCustomer {
                    customer_id,
                    mut ledger,
                } = att;
                let mut attempt: u32 = 1;

                loop {
                    self.cart.recompute(&ledger, &self.catalog);
                    let order = Order::from_cart(
                        &self.cart,
                        Some(customer_id.clone()),
                        self.config.tax_rate,
                        now,
                    );
                    let (next, report) = apply_order(&order, &ledger, &self.catalog);

                    match store.save(&next).await {
                        Ok(version) => {
                            let mut committed = next;
                            committed.version = version;
                            self.attached = Some(AttachedCustomer {
                                customer_id: customer_id.clone(),
                                ledger: committed,
                            });
                            break (order, report, Some(version));
                        }
                        Err(StoreError::VersionConflict {
                            expected, found, ..
                        }) => {
                            warn!(
                                customer_id = %customer_id,
                                expected,
                                found,
                                attempt,
                                "Ledger changed during checkout, reloading"
                            );
                            if attempt >= MAX_COMMIT_ATTEMPTS {
                                return Err(RegisterError::CheckoutConflict { attempts: attempt });
                            }
                            attempt += 1;
                            ledger = store.load(&customer_id).await?;
                        }
                        Err(other) => return Err(other.into()),
                    }
                }
            }
        };

        for definition_id in &report.skipped_definitions {
            warn!(
                order_id = %order.id,
                definition_id = %definition_id,
                "Definition did not resolve during finalization"
            );
        }
        for credit_id in &report.missing_credits {
            warn!(
                order_id = %order.id,
                credit_id = %credit_id,
                "Redeemed credit was gone at finalization"
            );
        }

        let receipt = Receipt {
            receipt_number: receipt_number(now),
            store_name: self.config.store_name.clone(),
            terminal_id: self.config.terminal_id.clone(),
            completed_at: order.completed_at.to_rfc3339(),
            customer_id: order.customer_id.clone(),
            lines: order.lines.iter().map(ReceiptLine::from).collect(),
            subtotal_cents: order.totals.subtotal_cents,
            discount_cents: order.totals.discount_cents,
            tax_cents: order.totals.tax_cents,
            total_cents: order.totals.total_cents,
            loyalty: LoyaltySummary::from_report(&report, ledger_version),
            stock_adjustments: stock_adjustments(&order),
        };

        self.cart.clear();
        info!(
            receipt_number = %receipt.receipt_number,
            total_cents = receipt.total_cents,
            lines = receipt.lines.len(),
            customer = receipt.customer_id.is_some(),
            "Sale completed"
        );
        Ok(receipt)
    }
}

/// Builds a human-readable receipt number: date-time plus a micro suffix
/// to keep two receipts in the same second distinct.
fn receipt_number(now: DateTime<Utc>) -> String {
    format!(
        "{}-{:04}",
        now.format("%y%m%d-%H%M%S"),
        now.timestamp_subsec_micros() % 10_000
    )
}

/// Aggregates inventory deltas per product across the order's lines.
///
/// Uses the frozen product snapshots, so the threshold math reflects stock
/// as the register saw it when the lines were added. Redeemed lines count
/// too: goods leave the shelf whether paid by cash or credit.
fn stock_adjustments(order: &Order) -> Vec<StockAdjustment> {
    let mut adjustments: Vec<StockAdjustment> = Vec::new();

    for line in &order.lines {
        if !line.product.track_inventory {
            continue;
        }

        match adjustments
            .iter_mut()
            .find(|a| a.product_id == line.product.id)
        {
            Some(adjustment) => adjustment.delta -= line.quantity,
            None => adjustments.push(StockAdjustment {
                product_id: line.product.id.clone(),
                sku: line.product.sku.clone(),
                delta: -line.quantity,
                below_threshold: false,
            }),
        }
    }

    for adjustment in adjustments.iter_mut() {
        let snapshot = order
            .lines
            .iter()
            .find(|l| l.product.id == adjustment.product_id)
            .map(|l| &l.product);

        if let Some(product) = snapshot {
            if let (Some(stock), Some(threshold)) =
                (product.current_stock, product.low_stock_threshold)
            {
                adjustment.below_threshold = stock + adjustment.delta <= threshold;
            }
        }
    }

    adjustments
}

// =============================================================================
// Unit Tests
// =============================================================================

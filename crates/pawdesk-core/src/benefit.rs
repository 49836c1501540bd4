//! # Benefit Resolution
//!
//! Decides what membership discount (if any) a cart line earns.
//!
//! ## Resolution Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    resolve_discount(line)                               │
//! │                                                                         │
//! │  1. Redeemed line? ──────────► keep current values (credit pays it)     │
//! │                                                                         │
//! │  2. Active membership? ──no──► (0, None)   Cancelled/PastDue = no perks │
//! │                                                                         │
//! │  3. Definition in catalog? ──no──► (0, None)   stale ledger never       │
//! │                                                blocks the sale          │
//! │                                                                         │
//! │  4. Scan benefits IN DECLARATION ORDER, take the FIRST whose target     │
//! │     matches the line's category:                                        │
//! │       PercentOff → round(unit_price × value%)  half away from zero      │
//! │       FixedOff   → min(value, unit_price), floor 0                      │
//! │       CreditDrop → (0, None)   billing-time perk, scan still stops      │
//! │                                                                         │
//! │  5. Nothing matched ──► (0, None)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## First Match Wins
//! Declaration order in the plan IS the precedence order. Plan authors put
//! "10% off grooming" above "5% off everything" and the resolver honors
//! that, even when a later benefit would be worth more to the customer.
//! Changing this to best-match would silently change what existing plans
//! mean, so the scan stays order-based.
//!
//! ## Discount Basis: One Unit
//! Percent and fixed discounts are computed off a SINGLE unit price, not
//! the line total. Quantity 7 still earns one flat discount.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::catalog::Catalog;
use crate::types::{BenefitKind, UserLedger};

// =============================================================================
// Resolution
// =============================================================================

/// The outcome of resolving benefits for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Resolution {
    /// Flat discount for the line, in cents. Zero when nothing applies.
    pub discount_cents: i64,

    /// The benefit that produced the discount, for receipt display.
    pub benefit_id: Option<String>,
}

impl Resolution {
    /// No discount applies.
    pub fn none() -> Self {
        Resolution {
            discount_cents: 0,
            benefit_id: None,
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves the membership discount for a single cart line.
///
/// Misses never block the sale: an absent membership, a non-Active status,
/// or a ledger pointing at a definition the catalog no longer carries all
/// price the line at full price. Catalog repair is a back-office job;
/// finalization separately reports definition misses it encounters.
pub fn resolve_discount(line: &CartLine, ledger: &UserLedger, catalog: &Catalog) -> Resolution {
    // Redeemed lines are priced by their credit, not by benefits.
    if line.is_redemption {
        return Resolution {
            discount_cents: line.discount_cents,
            benefit_id: line.applied_benefit_id.clone(),
        };
    }

    let Some(membership) = ledger.active_membership() else {
        return Resolution::none();
    };

    let Ok(definition) = catalog.membership_definition(&membership.definition_id) else {
        return Resolution::none();
    };

    // Discounts are computed off the pristine snapshot price, one unit only.
    let unit_price = line.product.price();

    for benefit in &definition.benefits {
        if !benefit.applies_to(line.product.category) {
            continue;
        }

        return match benefit.kind {
            BenefitKind::PercentOff => Resolution {
                discount_cents: unit_price.percent_of(benefit.value).cents(),
                benefit_id: Some(benefit.id.clone()),
            },
            BenefitKind::FixedOff => Resolution {
                // A fixed discount larger than the unit price would push the
                // line negative; clamp to the unit price (and to zero for a
                // misconfigured negative value).
                discount_cents: benefit.value.clamp(0, line.product.price_cents),
                benefit_id: Some(benefit.id.clone()),
            },
            // The scan still stops here: a matching CreditDrop shadows any
            // later benefit, exactly as declaration order promises.
            BenefitKind::CreditDrop => Resolution::none(),
        };
    }

    Resolution::none()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Credit Redemption
//!
//! Pays for service lines with prepaid package credits.
//!
//! ## Provisional Until Finalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Redemption Lifecycle                                   │
//! │                                                                         │
//! │  eligible_credit(line)  ──► "this groom could be paid by credit cb-42"  │
//! │          │                                                              │
//! │          ▼  front desk accepts                                          │
//! │  toggle_redemption(line, Some("cb-42"))                                 │
//! │          │    line.price_cents = 0, discount = 0, benefit cleared       │
//! │          │    LEDGER IS NOT TOUCHED                                     │
//! │          ▼                                                              │
//! │  ... customer changes mind? toggle_redemption(line, None)               │
//! │          │    price restored from snapshot, benefit re-resolved         │
//! │          ▼                                                              │
//! │  checkout ──► finalization consumes the units, exhausted balances       │
//! │               are deleted from the successor ledger                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Abandoned carts therefore cost nothing to clean up: no holds, no
//! reservations, nothing to roll back.

use chrono::{DateTime, Utc};

use crate::benefit::resolve_discount;
use crate::cart::CartLine;
use crate::catalog::Catalog;
use crate::types::{CreditBalance, UserLedger};

// =============================================================================
// Eligibility
// =============================================================================

/// Finds the first credit that could pay for this line.
///
/// Credits are scanned in ledger order (issue order), so the oldest usable
/// balance is offered first. A credit qualifies when its category matches
/// the line's product, it has units remaining, and it expires strictly
/// after `now`.
///
/// Returns `None` for lines no credit covers; the caller decides whether
/// that means "don't show a redeem button" or nothing at all.
pub fn eligible_credit<'a>(
    line: &CartLine,
    ledger: &'a UserLedger,
    now: DateTime<Utc>,
) -> Option<&'a CreditBalance> {
    ledger
        .credits
        .iter()
        .find(|credit| credit.is_usable_for(line.product.category, now))
}

// =============================================================================
// Toggle
// =============================================================================

/// Applies or clears a provisional credit redemption on a line.
///
/// ## Apply (`Some(credit_id)`)
/// Zeroes the display price and discount and records the credit id. The
/// credit itself is NOT verified here: checkout re-checks against the
/// freshly loaded ledger and reports ids that no longer resolve, so a
/// stale register view can never block the sale.
///
/// ## Clear (`None`)
/// Restores the display price from the product snapshot and re-runs
/// benefit resolution, as if the redemption had never happened.
pub fn toggle_redemption(
    line: &mut CartLine,
    credit_id: Option<&str>,
    ledger: &UserLedger,
    catalog: &Catalog,
) {
    match credit_id {
        Some(credit_id) => {
            line.is_redemption = true;
            line.redeemed_credit_id = Some(credit_id.to_string());
            line.price_cents = 0;
            line.discount_cents = 0;
            line.applied_benefit_id = None;
        }
        None => {
            line.is_redemption = false;
            line.redeemed_credit_id = None;
            line.price_cents = line.product.price_cents;

            let resolution = resolve_discount(line, ledger, catalog);
            line.discount_cents = resolution.discount_cents;
            line.applied_benefit_id = resolution.benefit_id;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BenefitKind, BenefitTarget, BillingPeriod, MembershipBenefit, MembershipDefinition,
        MembershipStatus, Product, ProductCategory, UserMembership,
    };
    use chrono::Duration;
    use uuid::Uuid;

    fn product(category: ProductCategory, price_cents: i64) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            sku: "SVC-1".to_string(),
            name: "Daycare Full Day".to_string(),
            category,
            price_cents,
            definition_id: None,
            is_active: true,
            track_inventory: false,
            current_stock: None,
            low_stock_threshold: None,
        }
    }

    fn credit(
        id: &str,
        category: ProductCategory,
        remaining: i64,
        expires_at: DateTime<Utc>,
    ) -> CreditBalance {
        CreditBalance {
            id: id.to_string(),
            customer_id: "cust-1".to_string(),
            package_id: "pack-1".to_string(),
            service_category: category,
            remaining,
            is_hourly: false,
            expires_at,
        }
    }

    fn member_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_membership(MembershipDefinition {
            id: "club".to_string(),
            name: "Club".to_string(),
            billing_period: BillingPeriod::Monthly,
            benefits: vec![MembershipBenefit {
                id: "all-10".to_string(),
                kind: BenefitKind::PercentOff,
                value: 10,
                target: BenefitTarget::All,
                description: "10% off everything".to_string(),
            }],
        });
        catalog
    }

    fn member_ledger(now: DateTime<Utc>, credits: Vec<CreditBalance>) -> UserLedger {
        let mut ledger = UserLedger::empty("cust-1");
        ledger.membership = Some(UserMembership {
            id: "m-1".to_string(),
            customer_id: "cust-1".to_string(),
            definition_id: "club".to_string(),
            status: MembershipStatus::Active,
            started_at: now,
            next_bill_at: now + Duration::days(30),
            contract_ref: None,
        });
        ledger.credits = credits;
        ledger
    }

    #[test]
    fn test_eligible_credit_matches_category_and_expiry() {
        let now = Utc::now();
        let ledger = member_ledger(
            now,
            vec![credit("cb-1", ProductCategory::Service, 3, now + Duration::days(30))],
        );

        let service_line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        let found = eligible_credit(&service_line, &ledger, now);
        assert_eq!(found.map(|c| c.id.as_str()), Some("cb-1"));

        // Wrong category: no offer
        let groom_line = CartLine::from_product(&product(ProductCategory::Grooming, 3500), 1, None);
        assert!(eligible_credit(&groom_line, &ledger, now).is_none());
    }

    #[test]
    fn test_expired_credit_is_skipped_in_favor_of_later_one() {
        let now = Utc::now();
        let ledger = member_ledger(
            now,
            vec![
                credit("cb-old", ProductCategory::Service, 5, now - Duration::days(1)),
                credit("cb-new", ProductCategory::Service, 2, now + Duration::days(90)),
            ],
        );

        let line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        let found = eligible_credit(&line, &ledger, now);
        assert_eq!(found.map(|c| c.id.as_str()), Some("cb-new"));
    }

    #[test]
    fn test_apply_zeroes_the_line() {
        let now = Utc::now();
        let catalog = member_catalog();
        let ledger = member_ledger(
            now,
            vec![credit("cb-1", ProductCategory::Service, 3, now + Duration::days(30))],
        );

        let mut line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        // Membership discount applied first, then a redemption replaces it
        let resolution = resolve_discount(&line, &ledger, &catalog);
        line.discount_cents = resolution.discount_cents;
        line.applied_benefit_id = resolution.benefit_id;
        assert_eq!(line.discount_cents, 300);

        toggle_redemption(&mut line, Some("cb-1"), &ledger, &catalog);

        assert!(line.is_redemption);
        assert_eq!(line.redeemed_credit_id.as_deref(), Some("cb-1"));
        assert_eq!(line.price_cents, 0);
        assert_eq!(line.discount_cents, 0);
        assert_eq!(line.applied_benefit_id, None);
        assert_eq!(line.line_subtotal_cents(), 0);
        // Snapshot price survives for a later un-redeem
        assert_eq!(line.product.price_cents, 3000);
    }

    #[test]
    fn test_clear_restores_price_and_benefit() {
        let now = Utc::now();
        let catalog = member_catalog();
        let ledger = member_ledger(
            now,
            vec![credit("cb-1", ProductCategory::Service, 3, now + Duration::days(30))],
        );

        let mut line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        toggle_redemption(&mut line, Some("cb-1"), &ledger, &catalog);
        toggle_redemption(&mut line, None, &ledger, &catalog);

        assert!(!line.is_redemption);
        assert_eq!(line.redeemed_credit_id, None);
        assert_eq!(line.price_cents, 3000);
        // Membership benefit re-resolved on restore
        assert_eq!(line.discount_cents, 300);
        assert_eq!(line.applied_benefit_id.as_deref(), Some("all-10"));
    }

    #[test]
    fn test_apply_accepts_unknown_credit_id() {
        // The register may hold a stale ledger view; verification happens at
        // checkout, which reports ids that no longer resolve.
        let now = Utc::now();
        let catalog = member_catalog();
        let ledger = member_ledger(now, vec![]);

        let mut line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        toggle_redemption(&mut line, Some("cb-ghost"), &ledger, &catalog);

        assert!(line.is_redemption);
        assert_eq!(line.redeemed_credit_id.as_deref(), Some("cb-ghost"));
        assert_eq!(line.price_cents, 0);
    }

    #[test]
    fn test_clear_on_never_redeemed_line_is_harmless() {
        let now = Utc::now();
        let catalog = member_catalog();
        let ledger = member_ledger(now, vec![]);

        let mut line = CartLine::from_product(&product(ProductCategory::Service, 3000), 1, None);
        toggle_redemption(&mut line, None, &ledger, &catalog);

        assert!(!line.is_redemption);
        assert_eq!(line.price_cents, 3000);
        assert_eq!(line.discount_cents, 300); // benefit resolved as usual
    }
}

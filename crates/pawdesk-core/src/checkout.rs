//! # Order Finalization
//!
//! Turns a priced cart into an immutable order and derives the successor
//! ledger a completed sale implies.
//!
//! ## Pure Successor Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        apply_order                                      │
//! │                                                                         │
//! │   (order, ledger, catalog) ──► (successor ledger, report)               │
//! │                                                                         │
//! │   The input ledger is NEVER mutated. The caller owns the commit:        │
//! │   load fresh → apply_order → save; on version conflict, reload and      │
//! │   apply again. Re-applying to a fresher ledger is always safe because   │
//! │   the function only reads the order's frozen lines.                     │
//! │                                                                         │
//! │   Per line, in cart order:                                              │
//! │     MEMBERSHIP product ──► activate plan (replaces any existing one)    │
//! │     PACKAGE product    ──► issue one credit per grant                   │
//! │     redeemed line      ──► consume units; exhausted balance is DELETED  │
//! │                                                                         │
//! │   Misses (unknown definition, vanished credit) never abort: they are    │
//! │   recorded in the FinalizeReport and the rest of the order applies.     │
//! │   The customer already paid; the ledger does its best and the report    │
//! │   tells the back office what to repair.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartLine, CartTotals};
use crate::catalog::Catalog;
use crate::types::{
    CreditBalance, MembershipStatus, ProductCategory, TaxRate, UserLedger, UserMembership,
};

// =============================================================================
// Order
// =============================================================================

/// A completed sale, frozen at checkout.
///
/// Lines and totals are copied out of the cart and never recomputed. What
/// the customer paid is what the order says, even if benefits or catalog
/// entries change a second later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The customer whose ledger this order settles against. `None` for
    /// walk-in sales, which touch no ledger.
    pub customer_id: Option<String>,

    /// Frozen cart lines.
    pub lines: Vec<CartLine>,

    /// Frozen totals at the register's tax rate.
    pub totals: CartTotals,

    /// When the sale completed. Billing anchors and credit expirations are
    /// counted from this instant.
    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
}

impl Order {
    /// Freezes a cart into an order.
    pub fn from_cart(
        cart: &Cart,
        customer_id: Option<String>,
        tax_rate: TaxRate,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            customer_id,
            lines: cart.lines.clone(),
            totals: cart.totals(tax_rate),
            completed_at,
        }
    }
}

// =============================================================================
// Finalize Report
// =============================================================================

/// One credit consumption recorded during finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsumedCredit {
    /// The balance that paid for a line.
    pub credit_id: String,

    /// Units spent (the line quantity).
    pub units_spent: i64,

    /// Whether the balance hit zero (or below) and was removed.
    pub exhausted: bool,
}

/// What finalization did to the ledger, including what it could NOT do.
///
/// The report is the visibility half of the fail-open policy: pricing and
/// finalization never block a paid sale on a catalog or ledger mismatch,
/// but every mismatch lands here for the back office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizeReport {
    /// Ids of memberships activated by this order.
    pub memberships_activated: Vec<String>,

    /// Ids of credit balances issued by this order.
    pub credits_issued: Vec<String>,

    /// Credits consumed by redemptions.
    pub credits_consumed: Vec<ConsumedCredit>,

    /// Redeemed credit ids that were absent from the loaded ledger.
    pub missing_credits: Vec<String>,

    /// Definition references that did not resolve (unknown id, or a
    /// membership/package product missing its definition link).
    pub skipped_definitions: Vec<String>,
}

impl FinalizeReport {
    /// Whether finalization hit anything the back office should look at.
    pub fn has_misses(&self) -> bool {
        !self.missing_credits.is_empty() || !self.skipped_definitions.is_empty()
    }
}

// =============================================================================
// apply_order
// =============================================================================

/// Derives the successor ledger for a completed order.
///
/// Walk-in orders (no customer) return the input ledger unchanged. The
/// successor keeps the input's version; the store bumps it on save.
pub fn apply_order(
    order: &Order,
    ledger: &UserLedger,
    catalog: &Catalog,
) -> (UserLedger, FinalizeReport) {
    let mut report = FinalizeReport::default();

    let Some(customer_id) = order.customer_id.as_deref() else {
        return (ledger.clone(), report);
    };

    let mut next = ledger.clone();

    for line in &order.lines {
        match line.product.category {
            ProductCategory::Membership => {
                activate_membership(&mut next, &mut report, line, customer_id, catalog, order.completed_at);
            }
            ProductCategory::Package => {
                issue_package_credits(&mut next, &mut report, line, customer_id, catalog, order.completed_at);
            }
            _ => {}
        }

        if line.is_redemption {
            if let Some(credit_id) = line.redeemed_credit_id.as_deref() {
                consume_credit(&mut next, &mut report, credit_id, line.quantity);
            }
        }
    }

    (next, report)
}

/// Activates the plan a MEMBERSHIP line was sold for. Replaces any existing
/// enrollment: one membership per customer, latest purchase wins.
fn activate_membership(
    next: &mut UserLedger,
    report: &mut FinalizeReport,
    line: &CartLine,
    customer_id: &str,
    catalog: &Catalog,
    purchased_at: DateTime<Utc>,
) {
    let Some(definition_id) = line.product.definition_id.as_deref() else {
        report.skipped_definitions.push(line.product.sku.clone());
        return;
    };

    let Ok(definition) = catalog.membership_definition(definition_id) else {
        report.skipped_definitions.push(definition_id.to_string());
        return;
    };

    let membership = UserMembership {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        definition_id: definition.id.clone(),
        status: MembershipStatus::Active,
        started_at: purchased_at,
        next_bill_at: purchased_at + Duration::days(definition.billing_period.days()),
        // The external billing service backfills this once it opens the
        // recurring contract.
        contract_ref: None,
    };

    report.memberships_activated.push(membership.id.clone());
    next.membership = Some(membership);
}

/// Issues the credits a PACKAGE line was sold for, one balance per grant,
/// appended in grant order.
fn issue_package_credits(
    next: &mut UserLedger,
    report: &mut FinalizeReport,
    line: &CartLine,
    customer_id: &str,
    catalog: &Catalog,
    purchased_at: DateTime<Utc>,
) {
    let Some(definition_id) = line.product.definition_id.as_deref() else {
        report.skipped_definitions.push(line.product.sku.clone());
        return;
    };

    let Ok(definition) = catalog.package_definition(definition_id) else {
        report.skipped_definitions.push(definition_id.to_string());
        return;
    };

    for grant in &definition.grants {
        let balance = CreditBalance {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            package_id: definition.id.clone(),
            service_category: grant.service_category,
            remaining: grant.units,
            is_hourly: grant.is_hourly,
            expires_at: purchased_at + Duration::days(definition.expiration_days),
        };

        report.credits_issued.push(balance.id.clone());
        next.credits.push(balance);
    }
}

/// Spends `units` from a balance. A balance at (or, if the same credit paid
/// several lines, below) zero is deleted: `remaining > 0` is a ledger
/// invariant, zero balances are never stored.
fn consume_credit(next: &mut UserLedger, report: &mut FinalizeReport, credit_id: &str, units: i64) {
    let Some(index) = next.credits.iter().position(|c| c.id == credit_id) else {
        report.missing_credits.push(credit_id.to_string());
        return;
    };

    next.credits[index].remaining -= units;
    let exhausted = next.credits[index].remaining <= 0;

    report.credits_consumed.push(ConsumedCredit {
        credit_id: credit_id.to_string(),
        units_spent: units,
        exhausted,
    });

    if exhausted {
        next.credits.remove(index);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BillingPeriod, CreditGrant, MembershipDefinition, PackageDefinition, Product,
    };

    fn product(
        sku: &str,
        category: ProductCategory,
        price_cents: i64,
        definition_id: Option<&str>,
    ) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: sku.to_string(),
            category,
            price_cents,
            definition_id: definition_id.map(String::from),
            is_active: true,
            track_inventory: false,
            current_stock: None,
            low_stock_threshold: None,
        }
    }

    fn test_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_membership(MembershipDefinition {
            id: "gold-care-club".to_string(),
            name: "Gold Care Club".to_string(),
            billing_period: BillingPeriod::Monthly,
            benefits: vec![],
        });
        catalog.insert_package(PackageDefinition {
            id: "daycare-10-pack".to_string(),
            name: "10-Visit Daycare Pack".to_string(),
            grants: vec![CreditGrant {
                service_category: ProductCategory::Service,
                units: 10,
                is_hourly: false,
            }],
            expiration_days: 365,
        });
        catalog
    }

    fn credit(id: &str, remaining: i64, expires_at: DateTime<Utc>) -> CreditBalance {
        CreditBalance {
            id: id.to_string(),
            customer_id: "cust-1".to_string(),
            package_id: "daycare-10-pack".to_string(),
            service_category: ProductCategory::Service,
            remaining,
            is_hourly: false,
            expires_at,
        }
    }

    fn order_with_lines(customer_id: Option<&str>, lines: Vec<CartLine>) -> Order {
        let cart = Cart { lines };
        Order::from_cart(
            &cart,
            customer_id.map(String::from),
            TaxRate::from_bps(800),
            Utc::now(),
        )
    }

    fn redeemed_line(price_cents: i64, quantity: i64, credit_id: &str) -> CartLine {
        let mut line = CartLine::from_product(
            &product("DAYCARE-01", ProductCategory::Service, price_cents, None),
            quantity,
            None,
        );
        line.is_redemption = true;
        line.redeemed_credit_id = Some(credit_id.to_string());
        line.price_cents = 0;
        line
    }

    #[test]
    fn test_full_finalization_flow() {
        // One order: join the club, buy a daycare pack, redeem 2 visits
        // from an older balance.
        let now = Utc::now();
        let catalog = test_catalog();

        let lines = vec![
            CartLine::from_product(
                &product("MEMB-GOLD", ProductCategory::Membership, 2900, Some("gold-care-club")),
                1,
                None,
            ),
            CartLine::from_product(
                &product("PACK-DAY10", ProductCategory::Package, 25000, Some("daycare-10-pack")),
                1,
                None,
            ),
            redeemed_line(3000, 2, "cb-old"),
        ];
        let order = order_with_lines(Some("cust-1"), lines);

        let mut ledger = UserLedger::empty("cust-1");
        ledger.credits.push(credit("cb-old", 3, now + Duration::days(30)));
        ledger.version = 7;

        let (next, report) = apply_order(&order, &ledger, &catalog);

        // Input untouched, successor keeps the version (store bumps it)
        assert_eq!(ledger.membership, None);
        assert_eq!(next.version, 7);

        // Membership activated with billing anchor one period out
        let membership = next.membership.as_ref().unwrap();
        assert_eq!(membership.definition_id, "gold-care-club");
        assert_eq!(membership.status, MembershipStatus::Active);
        assert_eq!(membership.started_at, order.completed_at);
        assert_eq!(membership.next_bill_at, order.completed_at + Duration::days(30));
        assert_eq!(report.memberships_activated.len(), 1);

        // Old balance down to 1, new 10-visit balance appended after it
        assert_eq!(next.credits.len(), 2);
        assert_eq!(next.credits[0].id, "cb-old");
        assert_eq!(next.credits[0].remaining, 1);
        assert_eq!(next.credits[1].remaining, 10);
        assert_eq!(next.credits[1].service_category, ProductCategory::Service);
        assert_eq!(
            next.credits[1].expires_at,
            order.completed_at + Duration::days(365)
        );
        assert_eq!(report.credits_issued.len(), 1);

        assert_eq!(
            report.credits_consumed,
            vec![ConsumedCredit {
                credit_id: "cb-old".to_string(),
                units_spent: 2,
                exhausted: false,
            }]
        );
        assert!(!report.has_misses());
    }

    #[test]
    fn test_exhausted_credit_is_deleted() {
        // Last visit on the balance: remaining 1 - 1 = 0, row removed.
        let now = Utc::now();
        let catalog = test_catalog();

        let order = order_with_lines(Some("cust-1"), vec![redeemed_line(3000, 1, "cb-1")]);

        let mut ledger = UserLedger::empty("cust-1");
        ledger.credits.push(credit("cb-1", 1, now + Duration::days(30)));

        let (next, report) = apply_order(&order, &ledger, &catalog);

        assert!(next.credits.is_empty());
        assert_eq!(report.credits_consumed[0].units_spent, 1);
        assert!(report.credits_consumed[0].exhausted);
    }

    #[test]
    fn test_same_credit_across_two_lines_can_overdraw() {
        // Two lines redeem the same 3-unit balance for 2 units each. The
        // second consumption drives remaining to -1; the balance is deleted
        // as exhausted rather than stored negative.
        let now = Utc::now();
        let catalog = test_catalog();

        let order = order_with_lines(
            Some("cust-1"),
            vec![redeemed_line(3000, 2, "cb-1"), redeemed_line(3000, 2, "cb-1")],
        );

        let mut ledger = UserLedger::empty("cust-1");
        ledger.credits.push(credit("cb-1", 3, now + Duration::days(30)));

        let (next, report) = apply_order(&order, &ledger, &catalog);

        assert!(next.credits.is_empty());
        assert_eq!(report.credits_consumed.len(), 1);
        assert!(report.credits_consumed[0].exhausted);
        // The second line's credit was already deleted, so it reports missing
        assert_eq!(report.missing_credits, vec!["cb-1".to_string()]);
    }

    #[test]
    fn test_walk_in_order_is_a_ledger_noop() {
        let catalog = test_catalog();
        let order = order_with_lines(
            None,
            vec![CartLine::from_product(
                &product("MEMB-GOLD", ProductCategory::Membership, 2900, Some("gold-care-club")),
                1,
                None,
            )],
        );

        let ledger = UserLedger::empty("cust-1");
        let (next, report) = apply_order(&order, &ledger, &catalog);

        assert_eq!(next, ledger);
        assert_eq!(report, FinalizeReport::default());
    }

    #[test]
    fn test_new_membership_replaces_existing() {
        let now = Utc::now();
        let catalog = test_catalog();

        let mut ledger = UserLedger::empty("cust-1");
        ledger.membership = Some(UserMembership {
            id: "m-old".to_string(),
            customer_id: "cust-1".to_string(),
            definition_id: "ancient-plan".to_string(),
            status: MembershipStatus::Cancelled,
            started_at: now - Duration::days(400),
            next_bill_at: now - Duration::days(370),
            contract_ref: Some("bill-123".to_string()),
        });

        let order = order_with_lines(
            Some("cust-1"),
            vec![CartLine::from_product(
                &product("MEMB-GOLD", ProductCategory::Membership, 2900, Some("gold-care-club")),
                1,
                None,
            )],
        );

        let (next, _) = apply_order(&order, &ledger, &catalog);

        let membership = next.membership.unwrap();
        assert_ne!(membership.id, "m-old");
        assert_eq!(membership.definition_id, "gold-care-club");
        assert_eq!(membership.contract_ref, None);
    }

    #[test]
    fn test_missing_definition_is_reported_not_fatal() {
        let catalog = test_catalog();

        // Unknown definition id, plus a membership product with no link at all
        let order = order_with_lines(
            Some("cust-1"),
            vec![
                CartLine::from_product(
                    &product("MEMB-BAD", ProductCategory::Membership, 2900, Some("no-such-plan")),
                    1,
                    None,
                ),
                CartLine::from_product(
                    &product("PACK-UNLINKED", ProductCategory::Package, 10000, None),
                    1,
                    None,
                ),
            ],
        );

        let ledger = UserLedger::empty("cust-1");
        let (next, report) = apply_order(&order, &ledger, &catalog);

        assert_eq!(next.membership, None);
        assert!(next.credits.is_empty());
        assert_eq!(
            report.skipped_definitions,
            vec!["no-such-plan".to_string(), "PACK-UNLINKED".to_string()]
        );
        assert!(report.has_misses());
    }

    #[test]
    fn test_missing_redeemed_credit_is_reported() {
        let catalog = test_catalog();
        let order = order_with_lines(Some("cust-1"), vec![redeemed_line(3000, 1, "cb-ghost")]);

        let ledger = UserLedger::empty("cust-1");
        let (next, report) = apply_order(&order, &ledger, &catalog);

        assert!(next.credits.is_empty());
        assert_eq!(report.missing_credits, vec!["cb-ghost".to_string()]);
        assert!(report.credits_consumed.is_empty());
    }

    #[test]
    fn test_package_with_multiple_grants_issues_all() {
        let mut catalog = test_catalog();
        catalog.insert_package(PackageDefinition {
            id: "combo-pack".to_string(),
            name: "Daycare + Grooming Combo".to_string(),
            grants: vec![
                CreditGrant {
                    service_category: ProductCategory::Service,
                    units: 5,
                    is_hourly: false,
                },
                CreditGrant {
                    service_category: ProductCategory::Grooming,
                    units: 2,
                    is_hourly: false,
                },
            ],
            expiration_days: 90,
        });

        let order = order_with_lines(
            Some("cust-1"),
            vec![CartLine::from_product(
                &product("PACK-COMBO", ProductCategory::Package, 40000, Some("combo-pack")),
                1,
                None,
            )],
        );

        let (next, report) = apply_order(&order, &UserLedger::empty("cust-1"), &catalog);

        assert_eq!(next.credits.len(), 2);
        assert_eq!(next.credits[0].service_category, ProductCategory::Service);
        assert_eq!(next.credits[0].remaining, 5);
        assert_eq!(next.credits[1].service_category, ProductCategory::Grooming);
        assert_eq!(next.credits[1].remaining, 2);
        assert_eq!(report.credits_issued.len(), 2);
    }

    #[test]
    fn test_order_freezes_cart_totals() {
        let mut cart = Cart::new();
        cart.add_line(&product("TOY-01", ProductCategory::Retail, 2000, None), 2, None)
            .unwrap();

        let order = Order::from_cart(&cart, None, TaxRate::from_bps(800), Utc::now());
        assert_eq!(order.totals.subtotal_cents, 4000);
        assert_eq!(order.totals.tax_cents, 320);
        assert_eq!(order.totals.total_cents, 4320);
        assert_eq!(order.lines.len(), 1);
    }
}

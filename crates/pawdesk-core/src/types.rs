//! # Domain Types
//!
//! Core domain types used throughout Pawdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │    Product      │   │ UserMembership   │   │  CreditBalance   │     │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │     │
//! │  │  id (UUID)      │   │  id (UUID)       │   │  id (UUID)       │     │
//! │  │  sku (business) │   │  definition_id   │   │  package_id      │     │
//! │  │  category       │   │  status          │   │  remaining       │     │
//! │  │  price_cents    │   │  next_bill_at    │   │  expires_at      │     │
//! │  └─────────────────┘   └──────────────────┘   └──────────────────┘     │
//! │                                 │                      │                │
//! │                                 └──────────┬───────────┘                │
//! │                                            ▼                            │
//! │                                  ┌──────────────────┐                  │
//! │                                  │   UserLedger     │                  │
//! │                                  │  one per customer│                  │
//! │                                  │  version (OCC)   │                  │
//! │                                  └──────────────────┘                  │
//! │                                                                         │
//! │  Catalog side: MembershipDefinition ──► [MembershipBenefit, ...]       │
//! │                PackageDefinition    ──► [CreditGrant, ...]             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for ledger relations
//! - Business ID: (sku, definition id, etc.) - human-readable, potentially mutable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 800 bps = 8% (typical combined city/state rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    /// Default tax rate is zero (tax-exempt until configured).
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product Category
// =============================================================================

/// The merchandising category of a product.
///
/// Categories do double duty:
/// - Benefit targeting: a membership benefit can apply to one category only
/// - Credit matching: a prepaid credit redeems against lines of its category
///
/// Two categories are special at finalization time: `Membership` products
/// activate a plan on the customer's ledger, and `Package` products issue
/// prepaid credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Pet food and treats.
    Food,
    /// General services (daycare, boarding, training).
    Service,
    /// Grooming services (baths, cuts, nail trims).
    Grooming,
    /// Retail goods (toys, leashes, beds).
    Retail,
    /// Medications and supplements.
    Medication,
    /// Recurring membership plans (activates a ledger membership when sold).
    Membership,
    /// Prepaid service packages (issues ledger credits when sold).
    Package,
}

// =============================================================================
// Product
// =============================================================================

/// A sellable product or service in the catalog.
///
/// ## Snapshot Semantics
/// When a product is added to a cart, the whole struct is cloned onto the
/// cart line. Later catalog edits (price changes, deactivation) never affect
/// an in-flight sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to front desk and on receipt.
    pub name: String,

    /// Merchandising category (drives benefits, credits, finalization).
    pub category: ProductCategory,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// For `Membership` and `Package` products: the catalog definition this
    /// product activates or issues. `None` for ordinary goods and services.
    pub definition_id: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Whether to track inventory for this product.
    /// Services, memberships and packages generally don't.
    pub track_inventory: bool,

    /// Current stock level (meaningful when track_inventory is set).
    pub current_stock: Option<i64>,

    /// Reorder alert threshold for the stock report.
    pub low_stock_threshold: Option<i64>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Membership Benefits
// =============================================================================

/// The kind of perk a membership benefit grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BenefitKind {
    /// Percentage off the unit price. `value` holds whole percents (5 = 5%).
    PercentOff,
    /// Fixed amount off the unit price. `value` holds cents.
    FixedOff,
    /// Recurring credit deposits tied to the billing cycle. Never produces a
    /// line discount at the register; the billing service handles the drops.
    CreditDrop,
}

/// What a benefit applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BenefitTarget {
    /// Applies to every cart line.
    All,
    /// Applies only to lines of the given category.
    Category(ProductCategory),
}

impl BenefitTarget {
    /// Checks whether the target covers a product category.
    pub fn matches(&self, category: ProductCategory) -> bool {
        match self {
            BenefitTarget::All => true,
            BenefitTarget::Category(c) => *c == category,
        }
    }
}

/// A single perk inside a membership plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MembershipBenefit {
    /// Stable identifier, stamped onto cart lines for receipt display.
    pub id: String,

    /// What the perk does.
    pub kind: BenefitKind,

    /// Magnitude: whole percents for PercentOff, cents for FixedOff,
    /// units per billing cycle for CreditDrop.
    pub value: i64,

    /// Which lines the perk applies to.
    pub target: BenefitTarget,

    /// Human-readable description ("10% off all grooming").
    pub description: String,
}

impl MembershipBenefit {
    /// Checks whether this benefit covers a product category.
    #[inline]
    pub fn applies_to(&self, category: ProductCategory) -> bool {
        self.target.matches(category)
    }
}

// =============================================================================
// Billing Period
// =============================================================================

/// How often a membership plan bills.
///
/// Billing itself is handled by an external service; the register only needs
/// the period to compute the first `next_bill_at` anchor at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Quarterly,
    Annual,
}

impl BillingPeriod {
    /// Length of the period in days, used for the first billing anchor.
    /// Calendar-month arithmetic is the billing service's problem.
    #[inline]
    pub const fn days(&self) -> i64 {
        match self {
            BillingPeriod::Monthly => 30,
            BillingPeriod::Quarterly => 90,
            BillingPeriod::Annual => 365,
        }
    }
}

// =============================================================================
// Membership Definition
// =============================================================================

/// A membership plan in the catalog (Gold Care Club, Puppy Starter, ...).
///
/// ## Benefit Ordering Is Contractual
/// `benefits` is scanned top to bottom during pricing and the FIRST match
/// wins. Plan authors put the specific, generous perks before the broad
/// ones ("10% off grooming" above "5% off everything").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MembershipDefinition {
    /// Stable business identifier ("gold-care-club").
    pub id: String,

    /// Display name.
    pub name: String,

    /// Billing cadence for the external billing service.
    pub billing_period: BillingPeriod,

    /// Perks in declaration order (first match wins).
    pub benefits: Vec<MembershipBenefit>,
}

// =============================================================================
// Package Definition
// =============================================================================

/// One batch of prepaid units granted when a package sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditGrant {
    /// Category the resulting credit redeems against.
    pub service_category: ProductCategory,

    /// Units granted (visits, or hours when `is_hourly`).
    pub units: i64,

    /// Whether units are hours rather than visits.
    pub is_hourly: bool,
}

/// A prepaid package in the catalog ("10-Visit Daycare Pack").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PackageDefinition {
    /// Stable business identifier ("daycare-10-pack").
    pub id: String,

    /// Display name.
    pub name: String,

    /// Credits issued when the package is sold. One CreditBalance per grant.
    pub grants: Vec<CreditGrant>,

    /// Days until issued credits expire, counted from the sale.
    pub expiration_days: i64,
}

// =============================================================================
// Membership Status
// =============================================================================

/// Lifecycle state of a customer's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// In good standing; benefits apply at the register.
    Active,
    /// Payment failed; benefits suspended until the billing service recovers.
    PastDue,
    /// Cancelled by the customer or the shop; benefits never apply.
    Cancelled,
}

impl Default for MembershipStatus {
    fn default() -> Self {
        MembershipStatus::Active
    }
}

// =============================================================================
// User Membership
// =============================================================================

/// A customer's enrollment in a membership plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserMembership {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Customer this membership belongs to.
    pub customer_id: String,

    /// The catalog plan this enrollment is for.
    pub definition_id: String,

    /// Lifecycle state (only `Active` yields benefits).
    pub status: MembershipStatus,

    /// When the membership was activated.
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,

    /// When the external billing service should bill next.
    #[ts(as = "String")]
    pub next_bill_at: DateTime<Utc>,

    /// Reference into the external billing system, once it has one.
    pub contract_ref: Option<String>,
}

impl UserMembership {
    /// Checks whether benefits from this membership apply at the register.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

// =============================================================================
// Credit Balance
// =============================================================================

/// A prepaid balance of service units owned by a customer.
///
/// ## Invariant: remaining > 0
/// A balance that reaches zero is REMOVED from the ledger at finalization,
/// never stored at zero. Anything present in `UserLedger::credits` is
/// spendable (subject to expiry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditBalance {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Customer this balance belongs to.
    pub customer_id: String,

    /// The package definition that issued this balance.
    pub package_id: String,

    /// Category the balance redeems against.
    pub service_category: ProductCategory,

    /// Units left (visits, or hours when `is_hourly`). Always positive.
    pub remaining: i64,

    /// Whether units are hours rather than visits.
    pub is_hourly: bool,

    /// Hard expiry. Usable strictly before this instant.
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl CreditBalance {
    /// Checks whether the balance has expired as of `now`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Checks whether the balance can pay for a line of `category` at `now`.
    pub fn is_usable_for(&self, category: ProductCategory, now: DateTime<Utc>) -> bool {
        self.remaining > 0 && self.service_category == category && !self.is_expired(now)
    }
}

// =============================================================================
// User Ledger
// =============================================================================

/// The source of truth for one customer's loyalty state.
///
/// ## Ownership Model
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                          UserLedger                                     │
/// │                                                                         │
/// │  membership: at most ONE enrollment (new plan replaces the old)        │
/// │  credits:    ordered list of spendable balances (issue order)          │
/// │  version:    optimistic-concurrency token, bumped by every save        │
/// │                                                                         │
/// │  Pricing READS the ledger. Only finalization WRITES it, by             │
/// │  producing a successor ledger that the store commits atomically.       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserLedger {
    /// Customer this ledger belongs to.
    pub customer_id: String,

    /// Current membership enrollment, if any.
    pub membership: Option<UserMembership>,

    /// Spendable credit balances, in issue order.
    pub credits: Vec<CreditBalance>,

    /// Optimistic-concurrency version. 0 means "never persisted".
    pub version: u64,
}

impl UserLedger {
    /// Creates an empty ledger for a customer who has no loyalty state yet.
    pub fn empty(customer_id: impl Into<String>) -> Self {
        UserLedger {
            customer_id: customer_id.into(),
            membership: None,
            credits: Vec::new(),
            version: 0,
        }
    }

    /// Returns the membership if it is in `Active` status.
    pub fn active_membership(&self) -> Option<&UserMembership> {
        self.membership.as_ref().filter(|m| m.is_active())
    }

    /// Looks up a credit balance by id.
    pub fn credit(&self, credit_id: &str) -> Option<&CreditBalance> {
        self.credits.iter().find(|c| c.id == credit_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn balance(category: ProductCategory, remaining: i64, expires_at: DateTime<Utc>) -> CreditBalance {
        CreditBalance {
            id: "cb-1".to_string(),
            customer_id: "cust-1".to_string(),
            package_id: "pack-1".to_string(),
            service_category: category,
            remaining,
            is_hourly: false,
            expires_at,
        }
    }

    #[test]
    fn test_tax_rate_conversions() {
        let rate = TaxRate::from_bps(800);
        assert_eq!(rate.bps(), 800);
        assert_eq!(rate.percentage(), 8.0);

        let from_pct = TaxRate::from_percentage(8.25);
        assert_eq!(from_pct.bps(), 825);

        assert!(TaxRate::zero().is_zero());
        assert!(TaxRate::default().is_zero());
    }

    #[test]
    fn test_benefit_target_matching() {
        assert!(BenefitTarget::All.matches(ProductCategory::Food));
        assert!(BenefitTarget::All.matches(ProductCategory::Grooming));

        let grooming_only = BenefitTarget::Category(ProductCategory::Grooming);
        assert!(grooming_only.matches(ProductCategory::Grooming));
        assert!(!grooming_only.matches(ProductCategory::Service));
    }

    #[test]
    fn test_billing_period_days() {
        assert_eq!(BillingPeriod::Monthly.days(), 30);
        assert_eq!(BillingPeriod::Quarterly.days(), 90);
        assert_eq!(BillingPeriod::Annual.days(), 365);
    }

    #[test]
    fn test_credit_balance_usability() {
        let now = Utc::now();
        let live = balance(ProductCategory::Grooming, 3, now + Duration::days(30));

        assert!(live.is_usable_for(ProductCategory::Grooming, now));
        assert!(!live.is_usable_for(ProductCategory::Service, now));

        // Expiry boundary: expires_at == now means expired
        let boundary = balance(ProductCategory::Grooming, 3, now);
        assert!(boundary.is_expired(now));
        assert!(!boundary.is_usable_for(ProductCategory::Grooming, now));

        let expired = balance(ProductCategory::Grooming, 3, now - Duration::days(1));
        assert!(!expired.is_usable_for(ProductCategory::Grooming, now));
    }

    #[test]
    fn test_ledger_active_membership_requires_active_status() {
        let now = Utc::now();
        let mut ledger = UserLedger::empty("cust-1");
        assert!(ledger.active_membership().is_none());

        ledger.membership = Some(UserMembership {
            id: "m-1".to_string(),
            customer_id: "cust-1".to_string(),
            definition_id: "gold-care-club".to_string(),
            status: MembershipStatus::PastDue,
            started_at: now,
            next_bill_at: now + Duration::days(30),
            contract_ref: None,
        });
        assert!(ledger.active_membership().is_none());

        if let Some(m) = ledger.membership.as_mut() {
            m.status = MembershipStatus::Active;
        }
        assert!(ledger.active_membership().is_some());
    }

    #[test]
    fn test_category_wire_format_is_snake_case() {
        let json = serde_json::to_string(&ProductCategory::Grooming).unwrap();
        assert_eq!(json, "\"grooming\"");

        let json = serde_json::to_string(&MembershipStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }
}

//! # Register Session
//!
//! Manages the state of one point-of-sale terminal: the cart being rung
//! up and the customer it is (optionally) attached to.
//!
//! ## Session Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Register Session Operations                          │
//! │                                                                         │
//! │  Front Desk Action        Session Call             State Change         │
//! │  ─────────────────        ────────────             ────────────         │
//! │                                                                         │
//! │  Scan member card ───────► attach_customer() ────► ledger loaded,      │
//! │                                                    cart repriced       │
//! │                                                                         │
//! │  Scan product ───────────► add_product() ────────► line added,         │
//! │                                                    benefits resolved   │
//! │                                                                         │
//! │  Tap "use credit" ───────► toggle_redemption() ──► line zeroed,        │
//! │                                                    credit earmarked    │
//! │                                                                         │
//! │  Customer leaves ────────► detach_customer() ────► redemptions undone, │
//! │                                                    list prices back    │
//! │                                                                         │
//! │  Pay ────────────────────► checkout() ───────────► ledger saved,       │
//! │                                                    receipt returned    │
//! │                                                                         │
//! │  NOTE: One session per terminal. The session exclusively owns its      │
//! │        ledger snapshot between attach and checkout; the store's        │
//! │        version check catches anyone else writing the same customer.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use pawdesk_core::{
    eligible_credit, toggle_redemption, validation, Cart, CartTotals, Catalog, CoreError, Product,
    UserLedger,
};
use pawdesk_ledger::LedgerStore;

use crate::config::RegisterConfig;
use crate::error::{RegisterError, RegisterResult};

/// The customer standing at the register, with the ledger snapshot that
/// prices their cart.
#[derive(Debug, Clone)]
pub(crate) struct AttachedCustomer {
    pub(crate) customer_id: String,
    pub(crate) ledger: UserLedger,
}

/// A line the console can offer a "use prepaid credit" toggle for,
/// together with the balance that would pay for it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RedemptionOffer {
    pub line_id: String,
    pub credit_id: String,
    pub package_id: String,
    pub remaining: i64,
    pub is_hourly: bool,
}

/// One terminal's active sale.
///
/// ## Walk-ins
/// A session without an attached customer prices everything at list: the
/// cart is repriced against an empty ledger, so no benefit or redemption
/// can apply.
pub struct RegisterSession {
    pub(crate) config: RegisterConfig,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) cart: Cart,
    pub(crate) attached: Option<AttachedCustomer>,
}

impl RegisterSession {
    /// Creates a session with an empty cart and no customer.
    pub fn new(catalog: Arc<Catalog>, config: RegisterConfig) -> Self {
        RegisterSession {
            config,
            catalog,
            cart: Cart::new(),
            attached: None,
        }
    }

    /// The register configuration this session runs under.
    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    /// Read access to the cart, for rendering.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The attached customer id, if any.
    pub fn customer_id(&self) -> Option<&str> {
        self.attached.as_ref().map(|a| a.customer_id.as_str())
    }

    /// The attached customer's ledger snapshot, if any.
    pub fn ledger(&self) -> Option<&UserLedger> {
        self.attached.as_ref().map(|a| &a.ledger)
    }

    /// Attaches a customer: loads their ledger and reprices the cart so
    /// membership benefits apply to lines already rung up.
    pub async fn attach_customer<S>(&mut self, store: &S, customer_id: &str) -> RegisterResult<()>
    where
        S: LedgerStore + ?Sized,
    {
        validation::validate_customer_id(customer_id)?;
        let customer_id = customer_id.trim();

        let ledger = store.load(customer_id).await?;
        info!(
            customer_id = %customer_id,
            version = ledger.version,
            credits = ledger.credits.len(),
            has_membership = ledger.membership.is_some(),
            "Customer attached"
        );

        self.attached = Some(AttachedCustomer {
            customer_id: customer_id.to_string(),
            ledger,
        });
        self.reprice();
        Ok(())
    }

    /// Detaches the customer. Benefits come off and any provisional
    /// redemptions are undone, since a walk-in cannot pay with credits.
    pub fn detach_customer(&mut self) {
        if let Some(att) = self.attached.take() {
            debug!(customer_id = %att.customer_id, "Customer detached");
        }

        let redeemed: Vec<String> = self
            .cart
            .lines
            .iter()
            .filter(|line| line.is_redemption)
            .map(|line| line.line_id.clone())
            .collect();

        let empty = UserLedger::empty("");
        for line_id in redeemed {
            if let Some(line) = self.cart.line_mut(&line_id) {
                toggle_redemption(line, None, &empty, &self.catalog);
            }
        }
        self.reprice();
    }

    /// Adds a product to the cart (optionally for a specific pet) and
    /// reprices.
    ///
    /// ## Returns
    /// The id of the line now carrying the product.
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: i64,
        pet_id: Option<String>,
    ) -> RegisterResult<String> {
        if !product.is_active {
            warn!(sku = %product.sku, "Rejected inactive product");
            return Err(RegisterError::InactiveProduct {
                sku: product.sku.clone(),
            });
        }

        let line_id = self.cart.add_line(product, quantity, pet_id)?;
        self.reprice();

        debug!(sku = %product.sku, quantity, line_id = %line_id, "Line added");
        Ok(line_id)
    }

    /// Updates a line's quantity (0 removes the line) and reprices.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> RegisterResult<()> {
        self.cart.update_quantity(line_id, quantity)?;
        self.reprice();
        Ok(())
    }

    /// Removes a line and reprices.
    pub fn remove_line(&mut self, line_id: &str) -> RegisterResult<()> {
        self.cart.remove_line(line_id)?;
        self.reprice();
        Ok(())
    }

    /// Empties the cart. The attached customer stays attached.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        debug!("Cart cleared");
    }

    /// Applies (`Some(credit_id)`) or clears (`None`) a credit redemption
    /// on a line.
    ///
    /// The credit is taken at face value: redemptions stay provisional
    /// until checkout, which re-checks them against a freshly loaded
    /// ledger and reports the ones that no longer resolve. A stale
    /// register view can therefore never block a sale.
    pub fn toggle_redemption(
        &mut self,
        line_id: &str,
        credit_id: Option<&str>,
    ) -> RegisterResult<()> {
        let Some(att) = &self.attached else {
            // Walk-ins have no credits; nothing to toggle
            warn!(line_id = %line_id, "Redemption toggled with no customer attached, ignoring");
            return Ok(());
        };

        let line = self
            .cart
            .line_mut(line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        toggle_redemption(line, credit_id, &att.ledger, &self.catalog);

        debug!(line_id = %line_id, redeemed = credit_id.is_some(), "Redemption toggled");
        Ok(())
    }

    /// Lists, per line, the credit balance that would pay for it, for the
    /// console to render redeem toggles. Lines already redeemed and lines
    /// no usable credit covers are omitted.
    pub fn redemption_offers(&self, now: DateTime<Utc>) -> Vec<RedemptionOffer> {
        let Some(att) = &self.attached else {
            return Vec::new();
        };

        self.cart
            .lines
            .iter()
            .filter(|line| !line.is_redemption)
            .filter_map(|line| {
                eligible_credit(line, &att.ledger, now).map(|credit| RedemptionOffer {
                    line_id: line.line_id.clone(),
                    credit_id: credit.id.clone(),
                    package_id: credit.package_id.clone(),
                    remaining: credit.remaining,
                    is_hourly: credit.is_hourly,
                })
            })
            .collect()
    }

    /// Current cart totals under the configured tax rate.
    pub fn totals(&self) -> CartTotals {
        self.cart.totals(self.config.tax_rate)
    }

    /// Reprices every non-redeemed line against the attached ledger, or
    /// an empty one for walk-ins.
    pub(crate) fn reprice(&mut self) {
        match &self.attached {
            Some(att) => self.cart.recompute(&att.ledger, &self.catalog),
            None => {
                let empty = UserLedger::empty("");
                self.cart.recompute(&empty, &self.catalog);
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pawdesk_core::{
        BenefitKind, BenefitTarget, BillingPeriod, CreditBalance, MembershipBenefit,
        MembershipDefinition, MembershipStatus, ProductCategory, UserMembership,
    };
    use pawdesk_ledger::MemoryLedgerStore;

    fn test_product(id: &str, category: ProductCategory, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            category,
            price_cents,
            definition_id: None,
            is_active: true,
            track_inventory: false,
            current_stock: None,
            low_stock_threshold: None,
        }
    }

    fn test_catalog() -> Arc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.insert_membership(MembershipDefinition {
            id: "plan-club-monthly".to_string(),
            name: "Pawdesk Club".to_string(),
            billing_period: BillingPeriod::Monthly,
            benefits: vec![
                MembershipBenefit {
                    id: "ben-groom-5".to_string(),
                    kind: BenefitKind::PercentOff,
                    value: 5,
                    target: BenefitTarget::Category(ProductCategory::Grooming),
                    description: "5% off grooming".to_string(),
                },
                MembershipBenefit {
                    id: "ben-all-10".to_string(),
                    kind: BenefitKind::PercentOff,
                    value: 10,
                    target: BenefitTarget::All,
                    description: "10% off everything".to_string(),
                },
            ],
        });
        Arc::new(catalog)
    }

    fn member_ledger(customer_id: &str) -> UserLedger {
        let now = Utc::now();
        let mut ledger = UserLedger::empty(customer_id);
        ledger.membership = Some(UserMembership {
            id: "mem-1".to_string(),
            customer_id: customer_id.to_string(),
            definition_id: "plan-club-monthly".to_string(),
            status: MembershipStatus::Active,
            started_at: now,
            next_bill_at: now + Duration::days(30),
            contract_ref: None,
        });
        ledger.credits.push(CreditBalance {
            id: "cred-groom".to_string(),
            customer_id: customer_id.to_string(),
            package_id: "pack-groom-4".to_string(),
            service_category: ProductCategory::Grooming,
            remaining: 4,
            is_hourly: false,
            expires_at: now + Duration::days(90),
        });
        ledger
    }

    fn session() -> RegisterSession {
        RegisterSession::new(test_catalog(), RegisterConfig::default())
    }

    #[tokio::test]
    async fn test_walk_in_prices_at_list() {
        let mut session = session();
        let wash = test_product("wash", ProductCategory::Grooming, 3500);

        session.add_product(&wash, 1, None).unwrap();

        let totals = session.totals();
        assert_eq!(totals.subtotal_cents, 3500);
        assert_eq!(totals.discount_cents, 0);
    }

    #[tokio::test]
    async fn test_attach_applies_benefits_to_existing_lines() {
        let store = MemoryLedgerStore::new();
        store.save(&member_ledger("cust-1")).await.unwrap();

        let mut session = session();
        let wash = test_product("wash", ProductCategory::Grooming, 3500);
        session.add_product(&wash, 1, None).unwrap();
        assert_eq!(session.totals().discount_cents, 0);

        session.attach_customer(&store, "cust-1").await.unwrap();

        // 5% of 3500 = 175, grooming benefit declared first
        assert_eq!(session.totals().discount_cents, 175);
        assert_eq!(session.customer_id(), Some("cust-1"));
    }

    #[tokio::test]
    async fn test_attach_rejects_bad_customer_id() {
        let store = MemoryLedgerStore::new();
        let mut session = session();

        let err = session.attach_customer(&store, "  ").await.unwrap_err();
        assert!(matches!(err, RegisterError::Validation(_)));
        assert!(session.customer_id().is_none());
    }

    #[tokio::test]
    async fn test_detach_reverts_benefits_and_redemptions() {
        let store = MemoryLedgerStore::new();
        store.save(&member_ledger("cust-1")).await.unwrap();

        let mut session = session();
        session.attach_customer(&store, "cust-1").await.unwrap();

        let wash = test_product("wash", ProductCategory::Grooming, 3500);
        let line_id = session.add_product(&wash, 1, None).unwrap();
        session
            .toggle_redemption(&line_id, Some("cred-groom"))
            .unwrap();
        assert_eq!(session.totals().subtotal_cents, 0);

        session.detach_customer();

        let line = session.cart().line(&line_id).unwrap();
        assert!(!line.is_redemption);
        assert_eq!(line.price_cents, 3500);
        assert_eq!(session.totals().discount_cents, 0);
        assert_eq!(session.totals().subtotal_cents, 3500);
    }

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let mut session = session();
        let mut discontinued = test_product("old", ProductCategory::Retail, 1200);
        discontinued.is_active = false;

        let err = session.add_product(&discontinued, 1, None).unwrap_err();
        assert!(matches!(err, RegisterError::InactiveProduct { .. }));
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_redemption_roundtrip() {
        let store = MemoryLedgerStore::new();
        store.save(&member_ledger("cust-1")).await.unwrap();

        let mut session = session();
        session.attach_customer(&store, "cust-1").await.unwrap();

        let wash = test_product("wash", ProductCategory::Grooming, 3500);
        let line_id = session.add_product(&wash, 1, None).unwrap();

        session
            .toggle_redemption(&line_id, Some("cred-groom"))
            .unwrap();
        let line = session.cart().line(&line_id).unwrap();
        assert!(line.is_redemption);
        assert_eq!(line.price_cents, 0);
        assert_eq!(line.discount_cents, 0);

        session.toggle_redemption(&line_id, None).unwrap();
        let line = session.cart().line(&line_id).unwrap();
        assert!(!line.is_redemption);
        assert_eq!(line.price_cents, 3500);
        assert_eq!(line.discount_cents, 175); // benefit comes back
    }

    #[tokio::test]
    async fn test_toggle_without_customer_is_noop() {
        let mut session = session();
        let wash = test_product("wash", ProductCategory::Grooming, 3500);
        let line_id = session.add_product(&wash, 1, None).unwrap();

        session
            .toggle_redemption(&line_id, Some("cred-anything"))
            .unwrap();

        let line = session.cart().line(&line_id).unwrap();
        assert!(!line.is_redemption);
        assert_eq!(line.price_cents, 3500);
    }

    #[tokio::test]
    async fn test_redemption_offers_cover_eligible_lines_only() {
        let store = MemoryLedgerStore::new();
        store.save(&member_ledger("cust-1")).await.unwrap();

        let mut session = session();
        session.attach_customer(&store, "cust-1").await.unwrap();

        let wash = test_product("wash", ProductCategory::Grooming, 3500);
        let kibble = test_product("kibble", ProductCategory::Food, 2000);
        let wash_line = session.add_product(&wash, 1, None).unwrap();
        session.add_product(&kibble, 1, None).unwrap();

        let offers = session.redemption_offers(Utc::now());
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].line_id, wash_line);
        assert_eq!(offers[0].credit_id, "cred-groom");
        assert_eq!(offers[0].remaining, 4);

        // A redeemed line stops being offered
        session
            .toggle_redemption(&wash_line, Some("cred-groom"))
            .unwrap();
        assert!(session.redemption_offers(Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn test_update_and_remove_reprice() {
        let store = MemoryLedgerStore::new();
        store.save(&member_ledger("cust-1")).await.unwrap();

        let mut session = session();
        session.attach_customer(&store, "cust-1").await.unwrap();

        let kibble = test_product("kibble", ProductCategory::Food, 2000);
        let line_id = session.add_product(&kibble, 1, None).unwrap();

        session.update_quantity(&line_id, 3).unwrap();
        // Flat discount off one unit: 10% of 2000 = 200, once
        let totals = session.totals();
        assert_eq!(totals.subtotal_cents, 3 * 2000 - 200);
        assert_eq!(totals.discount_cents, 200);

        session.remove_line(&line_id).unwrap();
        assert!(session.cart().is_empty());
    }
}

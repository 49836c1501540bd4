//! # In-Memory Ledger Store
//!
//! HashMap-backed [`LedgerStore`] with the same versioning contract as the
//! SQLite store. Used by unit tests and demo setups that don't want a
//! database file on disk.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use pawdesk_core::UserLedger;

use crate::error::{StoreError, StoreResult};
use crate::store::LedgerStore;

/// In-memory ledger store.
///
/// Ledgers are cloned on the way in and out, so a caller mutating its copy
/// never changes the stored one without going through [`LedgerStore::save`].
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledgers: RwLock<HashMap<String, UserLedger>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, UserLedger>>> {
        self.ledgers
            .read()
            .map_err(|_| StoreError::Internal("ledger map lock poisoned".to_string()))
    }

    fn write_guard(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, UserLedger>>> {
        self.ledgers
            .write()
            .map_err(|_| StoreError::Internal("ledger map lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self, customer_id: &str) -> StoreResult<UserLedger> {
        let map = self.read_guard()?;
        Ok(map
            .get(customer_id)
            .cloned()
            .unwrap_or_else(|| UserLedger::empty(customer_id)))
    }

    async fn save(&self, ledger: &UserLedger) -> StoreResult<u64> {
        let mut map = self.write_guard()?;

        let found = map
            .get(&ledger.customer_id)
            .map(|stored| stored.version)
            .unwrap_or(0);
        if found != ledger.version {
            return Err(StoreError::VersionConflict {
                customer_id: ledger.customer_id.clone(),
                expected: ledger.version,
                found,
            });
        }

        let next_version = ledger.version + 1;
        let mut stored = ledger.clone();
        stored.version = next_version;
        map.insert(stored.customer_id.clone(), stored);

        debug!(
            customer_id = %ledger.customer_id,
            version = next_version,
            "Ledger saved (memory)"
        );

        Ok(next_version)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pawdesk_core::{CreditBalance, MembershipStatus, ProductCategory, UserMembership};

    fn sample_ledger(customer_id: &str) -> UserLedger {
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
            id: "cred-1".to_string(),
            customer_id: customer_id.to_string(),
            package_id: "pack-daycare-10".to_string(),
            service_category: ProductCategory::Service,
            remaining: 10,
            is_hourly: false,
            expires_at: now + Duration::days(90),
        });
        ledger
    }

    #[tokio::test]
    async fn test_load_unknown_customer_returns_empty() {
        let store = MemoryLedgerStore::new();

        let ledger = store.load("cust-nobody").await.unwrap();
        assert_eq!(ledger.customer_id, "cust-nobody");
        assert_eq!(ledger.version, 0);
        assert!(ledger.membership.is_none());
        assert!(ledger.credits.is_empty());
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_round_trips() {
        let store = MemoryLedgerStore::new();
        let ledger = sample_ledger("cust-1");

        let version = store.save(&ledger).await.unwrap();
        assert_eq!(version, 1);

        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(
            loaded.membership.as_ref().map(|m| m.definition_id.as_str()),
            Some("plan-club-monthly")
        );
        assert_eq!(loaded.credits.len(), 1);
        assert_eq!(loaded.credits[0].remaining, 10);
    }

    #[tokio::test]
    async fn test_stale_save_rejected() {
        let store = MemoryLedgerStore::new();
        let ledger = sample_ledger("cust-1");

        store.save(&ledger).await.unwrap();

        // Saving the same version-0 snapshot again must lose.
        let err = store.save(&ledger).await.unwrap_err();
        match err {
            StoreError::VersionConflict {
                customer_id,
                expected,
                found,
            } => {
                assert_eq!(customer_id, "cust-1");
                assert_eq!(expected, 0);
                assert_eq!(found, 1);
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reload_then_save_succeeds_after_conflict() {
        let store = MemoryLedgerStore::new();
        let ledger = sample_ledger("cust-1");
        store.save(&ledger).await.unwrap();

        let mut fresh = store.load("cust-1").await.unwrap();
        fresh.credits[0].remaining = 7;
        let version = store.save(&fresh).await.unwrap();
        assert_eq!(version, 2);

        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.credits[0].remaining, 7);
    }

    #[tokio::test]
    async fn test_stored_ledger_isolated_from_caller_mutation() {
        let store = MemoryLedgerStore::new();
        let mut ledger = sample_ledger("cust-1");
        store.save(&ledger).await.unwrap();

        // Mutating the caller's copy must not leak into the store.
        ledger.credits.clear();

        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.credits.len(), 1);
    }
}

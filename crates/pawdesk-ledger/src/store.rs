//! # Ledger Store Trait
//!
//! Storage abstraction for customer loyalty ledgers.
//!
//! ## Why A Trait
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      LedgerStore Seam                                   │
//! │                                                                         │
//! │  RegisterSession::checkout()                                           │
//! │       │                                                                 │
//! │       │  store.load(customer_id)   ──►  UserLedger (with version)      │
//! │       │  ... apply_order() ...                                          │
//! │       │  store.save(&next_ledger)  ──►  new version or VersionConflict │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐      ┌──────────────────────────┐            │
//! │  │  MemoryLedgerStore   │      │   SqliteLedgerStore      │            │
//! │  │  (tests, demos)      │      │   (production)           │            │
//! │  └──────────────────────┘      └──────────────────────────┘            │
//! │                                                                         │
//! │  The register never sees SQL. Tests run against the memory store      │
//! │  with identical semantics.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use pawdesk_core::UserLedger;

use crate::error::StoreResult;

/// Persistent storage for customer loyalty ledgers.
///
/// Both implementations share the same optimistic-concurrency contract:
/// a loaded ledger carries the version it was read at, and a save only
/// succeeds if that version still matches the stored row.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads the ledger for a customer.
    ///
    /// Unknown customers are not an error: they get an empty ledger at
    /// version 0. The row is created lazily on the first save.
    async fn load(&self, customer_id: &str) -> StoreResult<UserLedger>;

    /// Persists a ledger, replacing the stored membership and credit
    /// balances wholesale.
    ///
    /// The save succeeds only if `ledger.version` matches the stored
    /// version (0 for a customer with no row yet). On success the stored
    /// version is bumped and the new version is returned.
    ///
    /// ## Errors
    /// * [`StoreError::VersionConflict`](crate::StoreError::VersionConflict) -
    ///   another writer saved this customer's ledger first; reload and retry.
    async fn save(&self, ledger: &UserLedger) -> StoreResult<u64>;
}

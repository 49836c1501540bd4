//! # SQLite Ledger Store
//!
//! [`LedgerStore`] implementation backed by the pooled SQLite database.
//!
//! ## Save Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Optimistic Save                                     │
//! │                                                                         │
//! │  save(ledger @ v3)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE ledgers SET version = 4                                        │
//! │    WHERE customer_id = ? AND version = 3   ← atomic check-and-bump     │
//! │       │                                                                 │
//! │       ├── 0 rows? → ROLLBACK, VersionConflict (caller reloads)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DELETE + re-INSERT membership row                                     │
//! │  DELETE + re-INSERT credit balances (position = vec order)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT → Ok(4)                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Children are replaced wholesale on every save. A ledger is a handful of
//! rows at most, so diffing them against the database is not worth the
//! complexity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use pawdesk_core::{CreditBalance, MembershipStatus, ProductCategory, UserLedger, UserMembership};

use crate::error::{StoreError, StoreResult};
use crate::store::LedgerStore;

// =============================================================================
// Row Types
// =============================================================================

/// Database row for the `memberships` table.
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: String,
    customer_id: String,
    definition_id: String,
    status: MembershipStatus,
    started_at: DateTime<Utc>,
    next_bill_at: DateTime<Utc>,
    contract_ref: Option<String>,
}

impl From<MembershipRow> for UserMembership {
    fn from(row: MembershipRow) -> Self {
        UserMembership {
            id: row.id,
            customer_id: row.customer_id,
            definition_id: row.definition_id,
            status: row.status,
            started_at: row.started_at,
            next_bill_at: row.next_bill_at,
            contract_ref: row.contract_ref,
        }
    }
}

/// Database row for the `credit_balances` table.
#[derive(Debug, sqlx::FromRow)]
struct CreditRow {
    id: String,
    customer_id: String,
    package_id: String,
    service_category: ProductCategory,
    remaining: i64,
    is_hourly: bool,
    expires_at: DateTime<Utc>,
}

impl From<CreditRow> for CreditBalance {
    fn from(row: CreditRow) -> Self {
        CreditBalance {
            id: row.id,
            customer_id: row.customer_id,
            package_id: row.package_id,
            service_category: row.service_category,
            remaining: row.remaining,
            is_hourly: row.is_hourly,
            expires_at: row.expires_at,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// SQLite-backed ledger store.
///
/// Obtained via [`Database::ledgers`](crate::Database::ledgers). Cheap to
/// clone; all clones share the same pool.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Creates a new SqliteLedgerStore.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedgerStore { pool }
    }

    /// Counts ledger rows.
    ///
    /// ## Usage
    /// Diagnostics and the seed binary's already-seeded guard.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledgers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn load(&self, customer_id: &str) -> StoreResult<UserLedger> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM ledgers WHERE customer_id = ?1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;

        // Unknown customer: hand back an empty ledger at version 0. The
        // row appears on the first save.
        let Some(version) = version else {
            debug!(customer_id = %customer_id, "No ledger row, returning empty ledger");
            return Ok(UserLedger::empty(customer_id));
        };

        let membership: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id,
                customer_id,
                definition_id,
                status,
                started_at,
                next_bill_at,
                contract_ref
            FROM memberships
            WHERE customer_id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        let credits: Vec<CreditRow> = sqlx::query_as(
            r#"
            SELECT
                id,
                customer_id,
                package_id,
                service_category,
                remaining,
                is_hourly,
                expires_at
            FROM credit_balances
            WHERE customer_id = ?1
            ORDER BY position
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            customer_id = %customer_id,
            version = version,
            credits = credits.len(),
            "Ledger loaded"
        );

        Ok(UserLedger {
            customer_id: customer_id.to_string(),
            membership: membership.map(UserMembership::from),
            credits: credits.into_iter().map(CreditBalance::from).collect(),
            version: version as u64,
        })
    }

    async fn save(&self, ledger: &UserLedger) -> StoreResult<u64> {
        let next_version = ledger.version + 1;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Version gate. The WHERE clause (or DO NOTHING for a fresh row)
        // makes check-and-bump a single atomic statement, so two registers
        // saving the same customer cannot both win.
        let claimed = if ledger.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO ledgers (customer_id, version, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(customer_id) DO NOTHING
                "#,
            )
            .bind(&ledger.customer_id)
            .bind(next_version as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE ledgers SET
                    version = ?2,
                    updated_at = ?3
                WHERE customer_id = ?1 AND version = ?4
                "#,
            )
            .bind(&ledger.customer_id)
            .bind(next_version as i64)
            .bind(now)
            .bind(ledger.version as i64)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if claimed == 0 {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT version FROM ledgers WHERE customer_id = ?1")
                    .bind(&ledger.customer_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(StoreError::VersionConflict {
                customer_id: ledger.customer_id.clone(),
                expected: ledger.version,
                found: found.unwrap_or(0) as u64,
            });
        }

        sqlx::query("DELETE FROM memberships WHERE customer_id = ?1")
            .bind(&ledger.customer_id)
            .execute(&mut *tx)
            .await?;

        if let Some(membership) = &ledger.membership {
            sqlx::query(
                r#"
                INSERT INTO memberships (
                    id, customer_id, definition_id, status,
                    started_at, next_bill_at, contract_ref
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&membership.id)
            .bind(&membership.customer_id)
            .bind(&membership.definition_id)
            .bind(membership.status)
            .bind(membership.started_at)
            .bind(membership.next_bill_at)
            .bind(&membership.contract_ref)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM credit_balances WHERE customer_id = ?1")
            .bind(&ledger.customer_id)
            .execute(&mut *tx)
            .await?;

        for (position, credit) in ledger.credits.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO credit_balances (
                    id, customer_id, package_id, service_category,
                    remaining, is_hourly, expires_at, position
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&credit.id)
            .bind(&credit.customer_id)
            .bind(&credit.package_id)
            .bind(credit.service_category)
            .bind(credit.remaining)
            .bind(credit.is_hourly)
            .bind(credit.expires_at)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            customer_id = %ledger.customer_id,
            version = next_version,
            credits = ledger.credits.len(),
            "Ledger saved"
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
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_store() -> SqliteLedgerStore {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.ledgers()
    }

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
            contract_ref: Some("agr-2026-0117".to_string()),
        });
        ledger.credits.push(CreditBalance {
            id: "cred-a".to_string(),
            customer_id: customer_id.to_string(),
            package_id: "pack-daycare-10".to_string(),
            service_category: ProductCategory::Service,
            remaining: 10,
            is_hourly: false,
            expires_at: now + Duration::days(90),
        });
        ledger.credits.push(CreditBalance {
            id: "cred-b".to_string(),
            customer_id: customer_id.to_string(),
            package_id: "pack-groom-4".to_string(),
            service_category: ProductCategory::Grooming,
            remaining: 4,
            is_hourly: false,
            expires_at: now + Duration::days(180),
        });
        ledger
    }

    #[tokio::test]
    async fn test_load_unknown_customer_returns_empty() {
        let store = test_store().await;

        let ledger = store.load("cust-nobody").await.unwrap();
        assert_eq!(ledger.customer_id, "cust-nobody");
        assert_eq!(ledger.version, 0);
        assert!(ledger.membership.is_none());
        assert!(ledger.credits.is_empty());

        // Loading must not create a row
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = test_store().await;
        let ledger = sample_ledger("cust-1");

        let version = store.save(&ledger).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.count().await.unwrap(), 1);

        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.version, 1);

        let membership = loaded.membership.as_ref().unwrap();
        assert_eq!(membership.id, "mem-1");
        assert_eq!(membership.definition_id, "plan-club-monthly");
        assert_eq!(membership.status, MembershipStatus::Active);
        assert_eq!(membership.contract_ref.as_deref(), Some("agr-2026-0117"));

        // Credit order is grant order, preserved via position
        assert_eq!(loaded.credits.len(), 2);
        assert_eq!(loaded.credits[0].id, "cred-a");
        assert_eq!(loaded.credits[0].remaining, 10);
        assert_eq!(
            loaded.credits[0].service_category,
            ProductCategory::Service
        );
        assert_eq!(loaded.credits[1].id, "cred-b");
        assert_eq!(
            loaded.credits[1].service_category,
            ProductCategory::Grooming
        );
    }

    #[tokio::test]
    async fn test_stale_save_rejected() {
        let store = test_store().await;
        let ledger = sample_ledger("cust-1");

        store.save(&ledger).await.unwrap();

        // Saving the same version-0 snapshot again must lose
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
    async fn test_stale_update_rejected_after_interleaved_save() {
        let store = test_store().await;
        store.save(&sample_ledger("cust-1")).await.unwrap();

        // Two sessions load v1
        let session_a = store.load("cust-1").await.unwrap();
        let mut session_b = store.load("cust-1").await.unwrap();

        // B wins the race
        session_b.credits[0].remaining = 3;
        assert_eq!(store.save(&session_b).await.unwrap(), 2);

        // A's save is now stale
        let err = store.save(&session_a).await.unwrap_err();
        match err {
            StoreError::VersionConflict {
                expected, found, ..
            } => {
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }

        // B's write is intact
        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.credits[0].remaining, 3);
    }

    #[tokio::test]
    async fn test_children_replaced_wholesale() {
        let store = test_store().await;
        store.save(&sample_ledger("cust-1")).await.unwrap();

        let mut fresh = store.load("cust-1").await.unwrap();
        fresh.membership = None;
        fresh.credits.remove(0);
        let version = store.save(&fresh).await.unwrap();
        assert_eq!(version, 2);

        let loaded = store.load("cust-1").await.unwrap();
        assert!(loaded.membership.is_none());
        assert_eq!(loaded.credits.len(), 1);
        assert_eq!(loaded.credits[0].id, "cred-b");
    }

    #[tokio::test]
    async fn test_empty_ledger_still_persists_version() {
        let store = test_store().await;

        // Even a ledger with nothing in it keeps its row, so the version
        // history survives credits being exhausted
        let empty = UserLedger::empty("cust-1");
        assert_eq!(store.save(&empty).await.unwrap(), 1);

        let loaded = store.load("cust-1").await.unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.credits.is_empty());
    }

    #[tokio::test]
    async fn test_ledgers_are_per_customer() {
        let store = test_store().await;
        store.save(&sample_ledger("cust-1")).await.unwrap();
        store.save(&sample_ledger("cust-2")).await.unwrap();

        let mut first = store.load("cust-1").await.unwrap();
        first.credits.clear();
        store.save(&first).await.unwrap();

        let second = store.load("cust-2").await.unwrap();
        assert_eq!(second.credits.len(), 2);
        assert_eq!(second.version, 1);
    }
}

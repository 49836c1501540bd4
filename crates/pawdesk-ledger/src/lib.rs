//! # pawdesk-ledger: Loyalty Ledger Persistence for Pawdesk
//!
//! This crate provides durable storage for customer loyalty ledgers.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pawdesk Ledger Data Flow                           │
//! │                                                                         │
//! │  Register checkout (pawdesk-register)                                  │
//! │       │                                                                 │
//! │       │  load / save via the LedgerStore trait                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  pawdesk-ledger (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │    Stores     │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (sqlite.rs /  │    │  (embedded)  │  │   │
//! │  │   │               │    │  memory.rs)   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SqliteLedger  │    │ 001_loyalty_ │  │   │
//! │  │   │ Connection    │    │ Store         │    │ schema.sql   │  │   │
//! │  │   │ Management    │    │ MemoryLedger  │    │              │  │   │
//! │  │   └───────────────┘    │ Store         │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./data/pawdesk.db (one file per store location)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`store`] - The [`LedgerStore`] trait
//! - [`sqlite`] - SQLite-backed store
//! - [`memory`] - In-memory store for tests and demos
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pawdesk_ledger::{Database, DbConfig, LedgerStore};
//!
//! // Create database with default config (runs migrations)
//! let config = DbConfig::new("path/to/pawdesk.db");
//! let db = Database::new(config).await?;
//!
//! // Load, mutate, save
//! let store = db.ledgers();
//! let ledger = store.load("cust-1042").await?;
//! // ... apply an order in pawdesk-core ...
//! let new_version = store.save(&ledger).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use store::LedgerStore;

// Store re-exports for convenience
pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

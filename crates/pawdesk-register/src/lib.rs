//! # Pawdesk Register
//!
//! Session and checkout orchestration for the Pawdesk point of sale: the
//! layer the operations console talks to.
//!
//! ## Crate Stack
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Operations Console (frontend)                       │
//! │                    renders carts, receipts, offers                      │
//! └──────────────────────────────┬──────────────────────────────────────────┘
//!                                │ camelCase DTOs (ts-rs bindings)
//! ┌──────────────────────────────▼──────────────────────────────────────────┐
//! │  pawdesk-register (this crate)                                          │
//! │  ├── RegisterSession: one terminal's cart + attached customer           │
//! │  ├── checkout: commit loop, receipts, stock adjustments                 │
//! │  └── RegisterConfig: store identity, tax rate, currency display         │
//! └──────────────┬────────────────────────────────┬─────────────────────────┘
//!                │                                │
//! ┌──────────────▼─────────────┐   ┌──────────────▼─────────────────────────┐
//! │  pawdesk-core              │   │  pawdesk-ledger                        │
//! │  pure pricing, benefits,   │   │  LedgerStore: SQLite (versioned) or    │
//! │  redemption, finalization  │   │  in-memory                             │
//! └────────────────────────────┘   └────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use pawdesk_core::Catalog;
//! use pawdesk_ledger::MemoryLedgerStore;
//! use pawdesk_register::{RegisterConfig, RegisterSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryLedgerStore::new();
//! let mut session = RegisterSession::new(Arc::new(Catalog::new()), RegisterConfig::default());
//!
//! session.attach_customer(&store, "cust-0001").await?;
//! // ... add products, toggle redemptions ...
//! let receipt = session.checkout(&store, Utc::now()).await?;
//! println!("sold: {}", receipt.receipt_number);
//! # Ok(())
//! # }
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod session;

pub use checkout::{CreditSpend, LoyaltySummary, Receipt, ReceiptLine, StockAdjustment};
pub use config::RegisterConfig;
pub use error::{RegisterError, RegisterResult};
pub use session::{RedemptionOffer, RegisterSession};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for a host application.
///
/// Respects `RUST_LOG` when set; otherwise defaults to info globally with
/// debug for the pawdesk crates and warn for sqlx query noise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pawdesk=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

//! # Register Error Type
//!
//! Unified error type for register operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow at the Register                           │
//! │                                                                         │
//! │  Console                     Register Crate                             │
//! │  ───────                     ──────────────                             │
//! │                                                                         │
//! │  session.checkout(...)                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Session Operation                                               │  │
//! │  │  Result<T, RegisterError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store Error? ──── StoreError::VersionConflict ──┐ (retried     │  │
//! │  │         │          other StoreError ─────────────┤  internally) │  │
//! │  │         ▼                                        ▼               │  │
//! │  │  Core Error? ───── CoreError::LineNotFound ─── RegisterError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Console displays the Display string to the operator                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use pawdesk_core::{CoreError, ValidationError};
use pawdesk_ledger::StoreError;

/// Errors surfaced by register session operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// An inactive product was scanned.
    ///
    /// ## When This Occurs
    /// - Product deactivated in the catalog but still on a shelf barcode
    /// - Stale search results on the console
    #[error("Product '{sku}' is inactive and cannot be sold")]
    InactiveProduct { sku: String },

    /// Checkout kept losing the ledger race and gave up.
    ///
    /// ## When This Occurs
    /// - Another terminal is finalizing sales for the same customer at the
    ///   same moment, repeatedly
    ///
    /// The sale is NOT recorded. The operator should retry once the other
    /// terminal is done.
    #[error("Checkout gave up after {attempts} ledger conflicts")]
    CheckoutConflict { attempts: u32 },

    /// Pricing or cart error from the core engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence error from the ledger store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

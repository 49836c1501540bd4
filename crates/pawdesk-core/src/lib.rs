//! # pawdesk-core: Pure Pricing & Loyalty Logic for Pawdesk
//!
//! This crate is the **heart** of Pawdesk. It contains the pricing and
//! loyalty-ledger engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pawdesk Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Operations Console (frontend)                   │   │
//! │  │    Cart UI ──► Member Panel ──► Redeem Buttons ──► Receipt UI  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              pawdesk-register (session layer)                   │   │
//! │  │    attach_customer, add_product, toggle_redemption, checkout   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pawdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  benefit  │  │   cart    │  │ checkout  │  │   │
//! │  │   │  Product  │  │ resolver  │  │   Cart    │  │apply_order│  │   │
//! │  │   │ UserLedger│  │first-match│  │ CartLine  │  │  report   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               pawdesk-ledger (persistence layer)                │   │
//! │  │         LedgerStore trait, SQLite + in-memory backends          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, UserLedger, CreditBalance, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Membership and package definition lookups
//! - [`cart`] - The in-progress sale: lines, recompute, totals
//! - [`benefit`] - First-match membership benefit resolution
//! - [`redemption`] - Provisional prepaid-credit redemption
//! - [`checkout`] - Order freezing and ledger finalization
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - time and randomness
//!    only enter as arguments (uuids for fresh entities aside)
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Fail Open, Report Loud**: Catalog/ledger mismatches never block a sale;
//!    they surface in the [`checkout::FinalizeReport`]
//!
//! ## Example Usage
//!
//! ```rust
//! use pawdesk_core::money::Money;
//! use pawdesk_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let subtotal = Money::from_cents(6000); // $60.00
//!
//! // Calculate tax with commercial rounding (half away from zero)
//! let tax_rate = TaxRate::from_bps(800); // 8%
//! let tax = subtotal.calculate_tax(tax_rate);
//!
//! // Tax on $60.00 at 8% = $4.80
//! assert_eq!(tax.cents(), 480);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod benefit;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod redemption;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pawdesk_core::Money` instead of
// `use pawdesk_core::money::Money`

pub use benefit::{resolve_discount, Resolution};
pub use cart::{Cart, CartLine, CartTotals};
pub use catalog::Catalog;
pub use checkout::{apply_order, ConsumedCredit, FinalizeReport, Order};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use redemption::{eligible_credit, toggle_redemption};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-store in future versions.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// Configurable per-store in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;

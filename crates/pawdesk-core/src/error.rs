//! # Error Types
//!
//! Domain-specific error types for pawdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pawdesk-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pawdesk-ledger errors (separate crate)                                │
//! │  └── StoreError       - Ledger persistence failures                    │
//! │                                                                         │
//! │  pawdesk-register errors (separate crate)                              │
//! │  └── RegisterError    - What the front desk sees                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → RegisterError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core pricing and loyalty errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Membership definition cannot be found in the catalog.
    ///
    /// ## When This Occurs
    /// - A ledger references a membership plan the catalog no longer carries
    /// - A MEMBERSHIP product links to a definition id with a typo
    ///
    /// Pricing paths treat this as "no benefit" so the sale is never
    /// blocked; finalization records it so back office can repair the
    /// catalog.
    #[error("Membership definition not found: {0}")]
    MembershipDefinitionNotFound(String),

    /// Package definition cannot be found in the catalog.
    #[error("Package definition not found: {0}")]
    PackageDefinitionNotFound(String),

    /// Cart line cannot be found.
    ///
    /// ## When This Occurs
    /// - Line was removed by another action on the same register
    /// - Frontend sent a stale line id after a cart clear
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

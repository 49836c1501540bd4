//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In many retail systems:                                                │
//! │    $10.00 / 3 = $3.33 (×3 = $9.99)  → Lost $0.01!                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents / 3 = 333 cents (×3 = 999 cents)                         │
//! │    We KNOW we lost 1 cent, and handle it explicitly                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pawdesk_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(3500); // $35.00 grooming visit
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // $70.00
//! let total = price + Money::from_cents(500); // $40.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(35.00); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Rounding
// =============================================================================

/// Integer division that rounds half AWAY FROM ZERO.
///
/// Rust's integer division truncates toward zero, so adding (or for negative
/// numerators, subtracting) half the denominator before dividing yields
/// commercial rounding: 2.5 → 3, -2.5 → -3.
fn div_round_half_away(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    rounded as i64
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.price_cents ──┬──► CartLine.price_cents ──► line subtotal      │
/// │                        │                                                │
/// │                        └──► Benefit discount math (percent_of)          │
/// │                                                                         │
/// │  Cart subtotal ──► Tax Calculation ──► Cart total ──► Receipt          │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use pawdesk_core::money::Money;
    ///
    /// let price = Money::from_cents(3500); // Represents $35.00
    /// assert_eq!(price.cents(), 3500);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The ledger, calculations, and API all use cents.
    /// Only the UI converts to dollars for display.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use pawdesk_core::money::Money;
    ///
    /// let price = Money::from_major_minor(35, 99); // $35.99
    /// assert_eq!(price.cents(), 3599);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -$5.50 (refund)
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        // Handle sign: if major is negative, minor should subtract
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax using commercial rounding (round half away from zero).
    ///
    /// ## Rounding Rule
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  COMMERCIAL ROUNDING (Round Half Away From Zero)                    │
    /// │                                                                     │
    /// │  Exact halves move AWAY from zero, matching what a cashier          │
    /// │  (and every till slip the shop has ever printed) expects:          │
    /// │    $0.825 → $0.83      -$0.825 → -$0.83                            │
    /// │                                                                     │
    /// │  Truncation toward zero would silently under-collect tax;          │
    /// │  round-half-up misrounds negative adjustments. Neither is OK.      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math in i128: `round(amount * bps / 10000)` with the half
    /// (5000) added or subtracted based on sign. No floats anywhere.
    ///
    /// ## Example
    /// ```rust
    /// use pawdesk_core::money::Money;
    /// use pawdesk_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(6000); // $60.00
    /// let rate = TaxRate::from_bps(800);      // 8%
    ///
    /// let tax = subtotal.calculate_tax(rate);
    /// // $60.00 × 8% = $4.80 exactly
    /// assert_eq!(tax.cents(), 480);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Cart Subtotal: $60.00
    ///      │
    ///      ▼
    /// calculate_tax(8%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Tax: $4.80
    ///      │
    ///      ▼
    /// Grand Total: $64.80
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        // rate.bps() is basis points: 800 = 8%
        Money::from_cents(div_round_half_away(
            self.0 as i128 * rate.bps() as i128,
            10_000,
        ))
    }

    /// Calculates a whole-number percentage of this amount, rounding half
    /// away from zero.
    ///
    /// Benefit discounts are expressed as whole percents (5 = 5% off), so
    /// the divisor here is 100 rather than the 10000 used for tax basis
    /// points.
    ///
    /// ## Example
    /// ```rust
    /// use pawdesk_core::money::Money;
    ///
    /// let groom = Money::from_cents(3500); // $35.00
    /// assert_eq!(groom.percent_of(5).cents(), 175); // 5% member discount
    ///
    /// let kibble = Money::from_cents(2999);
    /// assert_eq!(kibble.percent_of(10).cents(), 300); // 299.9 rounds up
    /// ```
    pub fn percent_of(&self, percent: i64) -> Money {
        Money::from_cents(div_round_half_away(self.0 as i128 * percent as i128, 100))
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use pawdesk_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1899); // $18.99 kibble bag
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 5697); // $56.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging. Use frontend formatting for actual UI display
/// to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(3599);
        assert_eq!(money.cents(), 3599);
        assert_eq!(money.dollars(), 35);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(35, 99).cents(), 3599);
        assert_eq!(Money::from_major_minor(0, 50).cents(), 50);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_zero_and_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((a * 3i64).cents(), 3000);
        assert_eq!(a.multiply_quantity(4).cents(), 4000);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1250);
        c -= b;
        assert_eq!(c.cents(), 1000);
    }

    #[test]
    fn test_calculate_tax_exact() {
        // $60.00 at 8% = $4.80 exactly, no rounding needed
        let tax = Money::from_cents(6000).calculate_tax(TaxRate::from_bps(800));
        assert_eq!(tax.cents(), 480);
    }

    #[test]
    fn test_calculate_tax_rounds_half_away_from_zero() {
        // $1.00 at 0.5% = 0.5 cents, rounds to 1 cent
        let up = Money::from_cents(100).calculate_tax(TaxRate::from_bps(50));
        assert_eq!(up.cents(), 1);

        // -$1.00 at 0.5% = -0.5 cents, rounds to -1 cent (away from zero)
        let down = Money::from_cents(-100).calculate_tax(TaxRate::from_bps(50));
        assert_eq!(down.cents(), -1);

        // $10.00 at 8.25% = 82.5 cents, rounds to 83
        let mid = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
        assert_eq!(mid.cents(), 83);
    }

    #[test]
    fn test_calculate_tax_zero_rate() {
        let tax = Money::from_cents(9999).calculate_tax(TaxRate::zero());
        assert_eq!(tax.cents(), 0);
    }

    #[test]
    fn test_percent_of() {
        // 5% of $35.00 = $1.75 exactly
        assert_eq!(Money::from_cents(3500).percent_of(5).cents(), 175);

        // 10% of $29.99 = 299.9 cents, rounds to $3.00
        assert_eq!(Money::from_cents(2999).percent_of(10).cents(), 300);

        // 5% of $10.50 = 52.5 cents, rounds up to 53
        assert_eq!(Money::from_cents(1050).percent_of(5).cents(), 53);

        // Negative amounts round away from zero
        assert_eq!(Money::from_cents(-1050).percent_of(5).cents(), -53);

        // 100% is the whole amount, 0% is nothing
        assert_eq!(Money::from_cents(777).percent_of(100).cents(), 777);
        assert_eq!(Money::from_cents(777).percent_of(0).cents(), 0);
    }

    #[test]
    fn test_percent_of_large_amount_no_overflow() {
        // Near-i64 amounts must not overflow thanks to i128 intermediate
        let big = Money::from_cents(i64::MAX / 200);
        assert_eq!(big.percent_of(100).cents(), i64::MAX / 200);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Money::from_cents(3599).to_string(), "$35.99");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }
}

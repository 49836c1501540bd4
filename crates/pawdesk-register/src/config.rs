//! # Register Configuration
//!
//! Configuration for one register terminal, loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`PAWDESK_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use pawdesk_core::TaxRate;

/// Register configuration.
///
/// ## Fields
/// All fields have sensible defaults for development. Production
/// deployments should configure these properly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterConfig {
    /// Store name (displayed on receipts)
    pub store_name: String,

    /// Store address lines (for receipts)
    pub store_address: Vec<String>,

    /// Terminal identifier, unique within the store
    pub terminal_id: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// The single configured sales tax rate, applied to the discounted
    /// subtotal at checkout
    pub tax_rate: TaxRate,
}

impl Default for RegisterConfig {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Store: "Pawdesk Dev Store"
    /// - Terminal: "reg-01"
    /// - Currency: USD ($)
    /// - Tax: 8% exclusive
    fn default() -> Self {
        RegisterConfig {
            store_name: "Pawdesk Dev Store".to_string(),
            store_address: vec![
                "472 Harbor Avenue".to_string(),
                "Maplewood, ST 12345".to_string(),
            ],
            terminal_id: "reg-01".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            tax_rate: TaxRate::from_bps(800), // 8%
        }
    }
}

impl RegisterConfig {
    /// Creates a new RegisterConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `PAWDESK_STORE_NAME`: Override store name
    /// - `PAWDESK_TERMINAL_ID`: Override terminal identifier
    /// - `PAWDESK_TAX_RATE`: Override tax rate as a percentage (e.g., "8.25")
    pub fn from_env() -> Self {
        let mut config = RegisterConfig::default();

        if let Ok(store_name) = std::env::var("PAWDESK_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Ok(terminal_id) = std::env::var("PAWDESK_TERMINAL_ID") {
            config.terminal_id = terminal_id;
        }

        if let Ok(tax_rate_str) = std::env::var("PAWDESK_TAX_RATE") {
            if let Ok(rate) = tax_rate_str.parse::<f64>() {
                config.tax_rate = TaxRate::from_percentage(rate);
            }
        }

        config
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

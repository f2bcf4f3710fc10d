//! Price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit price tagged with a display currency symbol.
///
/// The symbol is display-only; no conversion or currency arithmetic is
/// performed. All amounts in one cart share the catalog's symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g. dirhams, not fils).
    pub amount: Decimal,
    /// Display symbol, e.g. `"Dhs."`.
    pub currency_symbol: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub fn new(amount: Decimal, currency_symbol: impl Into<String>) -> Self {
        Self {
            amount,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Format for display, e.g. `"Dhs. 395.00"`.
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(&self.currency_symbol, self.amount)
    }
}

/// Format an amount with a currency symbol and two decimal places.
#[must_use]
pub fn format_amount(currency_symbol: &str, amount: Decimal) -> String {
    format!("{currency_symbol} {:.2}", amount.round_dp(2))
}

// 💱 Currency Table - fixed conversion rates and display symbols
//
// Every rate is expressed against the reference currency (USD):
//   amount_in_usd = amount * rate_to_reference
// Rates are static; there is no live rate fetching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// ============================================================================
// CURRENCY CODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyCode {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "JPY")]
    Jpy,
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "NPR")]
    Npr,
}

/// The currency all rates are defined relative to.
pub const REFERENCE_CURRENCY: CurrencyCode = CurrencyCode::Usd;

impl CurrencyCode {
    /// All known currencies, in selector order
    pub const ALL: [CurrencyCode; 6] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Gbp,
        CurrencyCode::Jpy,
        CurrencyCode::Inr,
        CurrencyCode::Npr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Npr => "NPR",
        }
    }

    /// Rate such that `amount * rate` is the amount in the reference currency
    pub fn rate_to_reference(&self) -> f64 {
        match self {
            CurrencyCode::Usd => 1.0,
            CurrencyCode::Eur => 1.08,   // 1 USD ≈ 0.93 EUR
            CurrencyCode::Gbp => 1.25,   // 1 USD ≈ 0.80 GBP
            CurrencyCode::Jpy => 0.0066, // 1 USD ≈ 150 JPY
            CurrencyCode::Inr => 0.012,  // 1 USD ≈ 83 INR
            CurrencyCode::Npr => 0.0077, // 1 USD ≈ 130 NPR
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Gbp => "£",
            CurrencyCode::Jpy => "¥",
            CurrencyCode::Inr => "₹",
            CurrencyCode::Npr => "रु",
        }
    }

    /// Next currency in selector order, wrapping around
    pub fn next(&self) -> CurrencyCode {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        REFERENCE_CURRENCY
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        CurrencyCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| ValidationError::UnknownCurrency(code.to_string()))
    }
}

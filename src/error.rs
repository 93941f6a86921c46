// ⚠️ Validation errors - rejected user input, always recoverable
//
// Each variant names the field that was missing or invalid. A rejected
// operation never mutates state.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must be a number greater than zero.")]
    InvalidAmount,

    #[error("Please choose a currency.")]
    MissingCurrency,

    #[error("Unknown currency '{0}'.")]
    UnknownCurrency(String),

    #[error("Category is required.")]
    MissingCategory,

    #[error("Date is required.")]
    MissingDate,

    #[error("Date '{0}' is not a valid YYYY-MM-DD date.")]
    InvalidDate(String),

    #[error("Please enter a valid budget amount.")]
    InvalidBudget,

    #[error("Month '{0}' is not a valid YYYY-MM month.")]
    InvalidMonth(String),

    #[error("Unknown theme '{0}'.")]
    UnknownTheme(String),
}

impl ValidationError {
    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidAmount => "amount",
            ValidationError::MissingCurrency | ValidationError::UnknownCurrency(_) => "currencyCode",
            ValidationError::MissingCategory => "category",
            ValidationError::MissingDate | ValidationError::InvalidDate(_) => "date",
            ValidationError::InvalidBudget => "budget",
            ValidationError::InvalidMonth(_) => "month",
            ValidationError::UnknownTheme(_) => "theme",
        }
    }
}

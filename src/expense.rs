// 🧾 Expense Ledger - recorded expenses and month-scoped queries
//
// Amounts are kept in the currency they were entered in. Conversion
// happens on read (see aggregation.rs); the stored currency never changes.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::currency::CurrencyCode;
use crate::error::ValidationError;
use crate::month::Month;

// ============================================================================
// IDENTITY
// ============================================================================

/// Creation-time based identifier (milliseconds since the epoch),
/// bumped forward when two expenses land in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,

    /// Strictly positive, in `currency_code`
    pub amount: f64,

    /// Currency the amount was entered in
    pub currency_code: CurrencyCode,

    /// Trimmed, never empty. Case is preserved.
    pub category: String,

    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,

    #[serde(default)]
    pub note: String,
}

impl Expense {
    pub fn new(id: ExpenseId, fields: NewExpense) -> Self {
        Expense {
            id,
            amount: fields.amount,
            currency_code: fields.currency_code,
            category: fields.category,
            date: fields.date,
            note: fields.note,
        }
    }

    /// Invariants a persisted record must still satisfy to be loaded
    fn is_well_formed(&self) -> bool {
        valid_amount(self.amount) && !self.category.trim().is_empty()
    }
}

fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

// ============================================================================
// DRAFT (raw user input) -> NEW EXPENSE (validated)
// ============================================================================

/// Unvalidated input from a form, a CLI invocation or an API request.
/// Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseDraft {
    pub amount: Option<f64>,
    pub currency_code: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub note: Option<String>,
}

/// Validated expense fields, waiting for an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub currency_code: CurrencyCode,
    pub category: String,
    pub date: NaiveDate,
    pub note: String,
}

impl ExpenseDraft {
    pub fn new(amount: f64, currency_code: &str, category: &str, date: &str) -> Self {
        ExpenseDraft {
            amount: Some(amount),
            currency_code: Some(currency_code.to_string()),
            category: Some(category.to_string()),
            date: Some(date.to_string()),
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Check every field; the first failing field is reported
    pub fn validate(&self) -> Result<NewExpense, ValidationError> {
        let amount = match self.amount {
            Some(a) if valid_amount(a) => a,
            _ => return Err(ValidationError::InvalidAmount),
        };

        let currency_code = match self.currency_code.as_deref().map(str::trim) {
            None | Some("") => return Err(ValidationError::MissingCurrency),
            Some(code) => code.parse::<CurrencyCode>()?,
        };

        let category = self.category.as_deref().map(str::trim).unwrap_or_default();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => return Err(ValidationError::MissingDate),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?,
        };

        let note = self.note.as_deref().map(str::trim).unwrap_or_default();

        Ok(NewExpense {
            amount,
            currency_code,
            category: category.to_string(),
            date,
            note: note.to_string(),
        })
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    expenses: Vec<Expense>,
    last_id: i64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> Self {
        let last_id = expenses.iter().map(|e| e.id.0).max().unwrap_or(0);
        Ledger { expenses, last_id }
    }

    /// Validate and append an expense, assigning a fresh id.
    /// Nothing changes when validation fails.
    pub fn add(&mut self, draft: &ExpenseDraft) -> Result<&Expense, ValidationError> {
        let fields = draft.validate()?;
        Ok(self.insert(fields))
    }

    /// Append already-validated fields under a fresh id
    pub fn insert(&mut self, fields: NewExpense) -> &Expense {
        let id = self.next_id();
        self.expenses.push(Expense::new(id, fields));
        &self.expenses[self.expenses.len() - 1]
    }

    fn next_id(&mut self) -> ExpenseId {
        let now = Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        ExpenseId(self.last_id)
    }

    /// Expenses dated within `month`, newest first.
    ///
    /// The sort is stable, so same-day expenses keep insertion order and
    /// repeated calls on unchanged data return the same sequence.
    pub fn for_month(&self, month: Month) -> Vec<&Expense> {
        let mut matching: Vec<&Expense> = self
            .expenses
            .iter()
            .filter(|e| month.contains(e.date))
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn clear_all(&mut self) {
        self.expenses.clear();
    }

    /// All expenses in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.expenses)
    }

    /// Rebuild from persisted JSON. Records are decoded one by one;
    /// the count of records that had to be dropped is returned alongside.
    pub fn from_value(value: Value) -> (Ledger, usize) {
        let items = match value {
            Value::Array(items) => items,
            _ => return (Ledger::new(), 1),
        };

        let total = items.len();
        let expenses: Vec<Expense> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Expense>(item).ok())
            .filter(Expense::is_well_formed)
            .collect();

        let skipped = total - expenses.len();
        (Ledger::from_expenses(expenses), skipped)
    }
}

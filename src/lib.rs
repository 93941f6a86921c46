// Finance Flow - Core Library
// Expense and budget state engine, used by the CLI, terminal UI and API server

pub mod aggregation;
pub mod budget;
pub mod colors;
pub mod config;
pub mod controller;
pub mod currency;
pub mod error;
pub mod expense;
pub mod format;
pub mod month;
pub mod preferences;
pub mod state;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use aggregation::{compute_month_view, convert, CategoryTotal, MonthView, OverspendTracker};
pub use budget::BudgetTable;
pub use colors::{CategoryColor, CategoryColorRegistry, PALETTE};
pub use config::Config;
pub use controller::{
    Action, CategorySlice, Controller, Dashboard, ExpenseRow, Notification, NotificationKind,
    Severity,
};
pub use currency::{CurrencyCode, REFERENCE_CURRENCY};
pub use error::ValidationError;
pub use expense::{Expense, ExpenseDraft, ExpenseId, Ledger, NewExpense};
pub use format::{category_icon, format_money, format_signed_money};
pub use month::Month;
pub use preferences::{Preferences, Theme};
pub use state::{AppState, Persisted};
pub use store::{MemoryStore, SqliteStore, Store, StoreError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 🗂️ App State - ledger, budgets, colors and preferences in one owned struct
//
// The store is the source of truth on startup; afterwards every mutation
// is applied in memory first and then written through. A failed write
// never rolls back the in-memory change, it is reported to the caller.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::budget::BudgetTable;
use crate::colors::CategoryColorRegistry;
use crate::currency::CurrencyCode;
use crate::error::ValidationError;
use crate::expense::{Expense, ExpenseDraft, Ledger};
use crate::month::Month;
use crate::preferences::{Preferences, Theme};
use crate::store::{
    Store, StoreError, DATA_KEYS, KEY_BUDGETS, KEY_CATEGORY_COLORS, KEY_EXPENSES,
    KEY_PRIMARY_CURRENCY, KEY_THEME,
};

/// Result of a mutation plus any writes that failed along the way
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub failures: Vec<StoreError>,
}

impl<T> Persisted<T> {
    fn new(value: T) -> Self {
        Persisted {
            value,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, result: Result<(), StoreError>) {
        if let Err(e) = result {
            error!("Failed to persist state: {}", e);
            self.failures.push(e);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub ledger: Ledger,
    pub budgets: BudgetTable,
    pub colors: CategoryColorRegistry,
    pub preferences: Preferences,
}

impl AppState {
    /// Read everything from the store. Missing keys give defaults; broken
    /// entries fall back to defaults too and are described in the warnings.
    pub fn load(store: &dyn Store) -> (AppState, Vec<String>) {
        let mut warnings = Vec::new();
        let mut state = AppState::default();

        if let Some(value) = load_key(store, KEY_EXPENSES, &mut warnings) {
            let (ledger, skipped) = Ledger::from_value(value);
            note_skipped(KEY_EXPENSES, skipped, &mut warnings);
            state.ledger = ledger;
        }

        if let Some(value) = load_key(store, KEY_BUDGETS, &mut warnings) {
            let (budgets, skipped) = BudgetTable::from_value(value);
            note_skipped(KEY_BUDGETS, skipped, &mut warnings);
            state.budgets = budgets;
        }

        if let Some(value) = load_key(store, KEY_CATEGORY_COLORS, &mut warnings) {
            let (colors, skipped) = CategoryColorRegistry::from_value(value);
            note_skipped(KEY_CATEGORY_COLORS, skipped, &mut warnings);
            state.colors = colors;
        }

        if let Some(text) = load_preference(store, KEY_PRIMARY_CURRENCY, &mut warnings) {
            match text.parse::<CurrencyCode>() {
                Ok(code) => state.preferences.primary_currency = code,
                Err(_) => note_skipped(KEY_PRIMARY_CURRENCY, 1, &mut warnings),
            }
        }

        if let Some(text) = load_preference(store, KEY_THEME, &mut warnings) {
            match text.parse::<Theme>() {
                Ok(theme) => state.preferences.theme = theme,
                Err(_) => note_skipped(KEY_THEME, 1, &mut warnings),
            }
        }

        debug!(
            "Loaded {} expenses, {} budgets, {} category colors",
            state.ledger.len(),
            state.budgets.len(),
            state.colors.len()
        );

        (state, warnings)
    }

    // ========================================================================
    // MUTATIONS (write-through)
    // ========================================================================

    /// Validate and record an expense, making sure its category has a color
    pub fn add_expense(
        &mut self,
        store: &mut dyn Store,
        draft: &ExpenseDraft,
    ) -> Result<Persisted<Expense>, ValidationError> {
        let fields = draft.validate()?;

        let mut out = Persisted::new(());
        let lookup = self.colors.color_for(&fields.category);
        if lookup.assigned {
            out.record(store.save(KEY_CATEGORY_COLORS, &self.colors.to_value()));
        }

        let expense = self.ledger.insert(fields).clone();
        out.record(save_json(store, KEY_EXPENSES, self.ledger.to_value()));

        Ok(Persisted {
            value: expense,
            failures: out.failures,
        })
    }

    pub fn set_budget(
        &mut self,
        store: &mut dyn Store,
        month: Month,
        amount: f64,
    ) -> Result<Persisted<()>, ValidationError> {
        self.budgets.set(month, amount)?;
        let mut out = Persisted::new(());
        out.record(store.save(KEY_BUDGETS, &self.budgets.to_value()));
        Ok(out)
    }

    /// Color for a category, persisting the registry on first assignment
    pub fn color_for(&mut self, store: &mut dyn Store, category: &str) -> Persisted<String> {
        let lookup = self.colors.color_for(category);
        let mut out = Persisted::new(lookup.color);
        if lookup.assigned {
            out.record(store.save(KEY_CATEGORY_COLORS, &self.colors.to_value()));
        }
        out
    }

    pub fn set_primary_currency(
        &mut self,
        store: &mut dyn Store,
        code: CurrencyCode,
    ) -> Persisted<()> {
        self.preferences.primary_currency = code;
        let mut out = Persisted::new(());
        out.record(store.save(KEY_PRIMARY_CURRENCY, &Value::from(code.as_str())));
        out
    }

    pub fn set_theme(&mut self, store: &mut dyn Store, theme: Theme) -> Persisted<()> {
        self.preferences.theme = theme;
        let mut out = Persisted::new(());
        out.record(store.save(KEY_THEME, &Value::from(theme.as_str())));
        out
    }

    /// Wipe expenses, budgets, colors and the currency preference.
    /// The theme is left alone.
    pub fn reset(&mut self, store: &mut dyn Store) -> Persisted<()> {
        self.ledger.clear_all();
        self.budgets.clear_all();
        self.colors.clear_all();
        self.preferences.primary_currency = CurrencyCode::default();

        let mut out = Persisted::new(());
        for key in DATA_KEYS {
            out.record(store.remove(key));
        }
        out
    }
}

fn save_json(
    store: &mut dyn Store,
    key: &str,
    value: Result<Value, serde_json::Error>,
) -> Result<(), StoreError> {
    store.save(key, &value?)
}

fn load_key(store: &dyn Store, key: &str, warnings: &mut Vec<String>) -> Option<Value> {
    match store.load(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring stored '{}': {}", key, e);
            warnings.push(format!("Saved data for '{}' was unreadable and has been reset.", key));
            None
        }
    }
}

/// Preference keys hold either a JSON string (`"EUR"`) or the bare text
/// written by older clients (`EUR`)
fn load_preference(store: &dyn Store, key: &str, warnings: &mut Vec<String>) -> Option<String> {
    let text = match store.load_text(key) {
        Ok(text) => text?,
        Err(e) => {
            warn!("Ignoring stored '{}': {}", key, e);
            warnings.push(format!("Saved data for '{}' was unreadable and has been reset.", key));
            return None;
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(s)) => Some(s),
        Ok(_) => Some(String::new()),
        Err(_) => Some(text.trim().to_string()),
    }
}

fn note_skipped(key: &str, skipped: usize, warnings: &mut Vec<String>) {
    if skipped > 0 {
        warn!("Dropped {} malformed entries from '{}'", skipped, key);
        warnings.push(format!(
            "{} saved entr{} in '{}' could not be read and were ignored.",
            skipped,
            if skipped == 1 { "y" } else { "ies" },
            key
        ));
    }
}

// 🎛️ View Controller - synchronous command interface over the app state
//
// Every user action goes through `handle`, runs to completion, and
// returns the notifications it produced. Rendering layers (terminal UI,
// HTTP server, CLI) only read the derived views exposed here.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregation::{compute_month_view, convert, MonthView, OverspendTracker};
use crate::currency::CurrencyCode;
use crate::error::ValidationError;
use crate::expense::{ExpenseDraft, ExpenseId};
use crate::format::{category_icon, format_money, format_signed_money};
use crate::month::Month;
use crate::preferences::{Preferences, Theme};
use crate::state::{AppState, Persisted};
use crate::store::Store;

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    ValidationFailed,
    ExpenseAdded,
    BudgetSet,
    OverBudget,
    CurrencyChanged,
    DataReset,
    EditUnavailable,
    PersistenceFailed,
    StorageRecovered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub severity: Severity,
}

pub const OVER_BUDGET_MESSAGE: &str = "🚨 You are going out of budget! 🚨";
pub const EDIT_DISABLED_MESSAGE: &str =
    "Edit functionality is currently disabled. Use the Reset button to start over.";
pub const NOT_SAVED_MESSAGE: &str =
    "Your change could not be saved and may not survive a restart.";

impl Notification {
    fn new(kind: NotificationKind, severity: Severity, message: impl Into<String>) -> Self {
        Notification {
            kind,
            message: message.into(),
            severity,
        }
    }

    /// Notification for input rejected before it reached the controller
    /// (e.g. an unparseable month or currency code at the transport layer)
    pub fn rejected(err: &ValidationError) -> Self {
        Self::new(NotificationKind::ValidationFailed, Severity::Warning, err.to_string())
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddExpense(ExpenseDraft),
    /// Budget for the selected month; `None` means the input was not a number
    SetBudget { amount: Option<f64> },
    ChangeMonth(Month),
    ChangePrimaryCurrency(CurrencyCode),
    SetTheme(Theme),
    ToggleTheme,
    ResetAll,
    /// Advertised by the interface but not implemented
    EditExpense(ExpenseId),
}

// ============================================================================
// DISPLAY ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRow {
    pub id: ExpenseId,
    pub icon: &'static str,
    pub category: String,
    pub color: String,
    pub note: String,
    pub currency_code: CurrencyCode,
    pub original_amount: f64,
    pub converted_amount: f64,
    pub amount_display: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub category: String,
    pub total: f64,
    pub color: String,
}

/// Everything a front end needs to draw the selected month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: Month,
    pub month_label: String,
    pub currency: CurrencyCode,
    pub currency_symbol: &'static str,
    pub theme: Theme,
    pub view: MonthView,
    pub is_over_budget: bool,
    pub budget_display: String,
    pub spent_display: String,
    pub remaining_display: String,
    pub expenses: Vec<ExpenseRow>,
    pub categories: Vec<CategorySlice>,
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct Controller<S: Store> {
    store: S,
    state: AppState,
    selected_month: Month,
    overspend: OverspendTracker,
    /// Produced outside `handle` (startup, color writes); drained by the next `handle`
    pending: Vec<Notification>,
}

impl<S: Store> Controller<S> {
    /// Load state from the store and select the current month
    pub fn new(store: S) -> Self {
        Self::with_month(store, Month::current())
    }

    pub fn with_month(store: S, month: Month) -> Self {
        let (state, warnings) = AppState::load(&store);

        let mut controller = Controller {
            store,
            state,
            selected_month: month,
            overspend: OverspendTracker::new(),
            pending: warnings
                .into_iter()
                .map(|w| Notification::new(NotificationKind::StorageRecovered, Severity::Warning, w))
                .collect(),
        };

        let mut startup = Vec::new();
        controller.refresh(&mut startup);
        controller.pending.extend(startup);
        controller
    }

    /// Apply one user action and return the notifications it produced
    pub fn handle(&mut self, action: Action) -> Vec<Notification> {
        let mut events = std::mem::take(&mut self.pending);

        match action {
            Action::AddExpense(draft) => self.add_expense(&draft, &mut events),
            Action::SetBudget { amount } => self.set_budget(amount, &mut events),
            Action::ChangeMonth(month) => {
                info!("Selected month {}", month);
                self.selected_month = month;
                self.overspend.reset();
                self.refresh(&mut events);
            }
            Action::ChangePrimaryCurrency(code) => {
                info!("Primary currency -> {}", code);
                let out = self.state.set_primary_currency(&mut self.store, code);
                report_failures(&out, &mut events);
                self.refresh(&mut events);
                events.push(Notification::new(
                    NotificationKind::CurrencyChanged,
                    Severity::Info,
                    format!("Primary currency set to {}", code),
                ));
            }
            Action::SetTheme(theme) => self.set_theme(theme, &mut events),
            Action::ToggleTheme => {
                let theme = self.state.preferences.theme.toggled();
                self.set_theme(theme, &mut events);
            }
            Action::ResetAll => {
                warn!("Resetting all data");
                let out = self.state.reset(&mut self.store);
                report_failures(&out, &mut events);
                self.selected_month = Month::current();
                self.overspend.reset();
                self.refresh(&mut events);
                events.push(Notification::new(
                    NotificationKind::DataReset,
                    Severity::Success,
                    "All data has been cleared and reset to default.",
                ));
            }
            Action::EditExpense(id) => {
                info!("Edit requested for expense {} (not available)", id);
                events.push(Notification::new(
                    NotificationKind::EditUnavailable,
                    Severity::Warning,
                    EDIT_DISABLED_MESSAGE,
                ));
            }
        }

        events
    }

    fn add_expense(&mut self, draft: &ExpenseDraft, events: &mut Vec<Notification>) {
        match self.state.add_expense(&mut self.store, draft) {
            Ok(out) => {
                let expense = &out.value;
                info!(
                    "Added expense {} ({} {} in {})",
                    expense.id, expense.amount, expense.currency_code, expense.category
                );
                let message = format!(
                    "Expense of {} added.",
                    format_money(expense.amount, expense.currency_code)
                );
                report_failures(&out, events);
                self.refresh(events);
                events.push(Notification::new(NotificationKind::ExpenseAdded, Severity::Info, message));
            }
            Err(e) => {
                warn!("Rejected expense: {}", e);
                events.push(Notification::rejected(&e));
            }
        }
    }

    fn set_budget(&mut self, amount: Option<f64>, events: &mut Vec<Notification>) {
        let result = amount
            .ok_or(ValidationError::InvalidBudget)
            .and_then(|amount| self.state.set_budget(&mut self.store, self.selected_month, amount));

        match result {
            Ok(out) => {
                info!("Budget for {} set to {:?}", self.selected_month, amount);
                report_failures(&out, events);
                self.refresh(events);
                events.push(Notification::new(
                    NotificationKind::BudgetSet,
                    Severity::Success,
                    "Budget set successfully!",
                ));
            }
            Err(e) => {
                warn!("Rejected budget: {}", e);
                events.push(Notification::rejected(&e));
            }
        }
    }

    fn set_theme(&mut self, theme: Theme, events: &mut Vec<Notification>) {
        info!("Theme -> {}", theme);
        let out = self.state.set_theme(&mut self.store, theme);
        report_failures(&out, events);
        self.refresh(events);
    }

    /// Recompute the selected month and raise the overspend alert on a rising edge
    fn refresh(&mut self, events: &mut Vec<Notification>) {
        let view = self.month_view();
        if self.overspend.observe(&view) {
            warn!(
                "Over budget for {}: remaining {:.2} {}",
                view.month, view.remaining, view.currency
            );
            events.push(Notification::new(
                NotificationKind::OverBudget,
                Severity::Error,
                OVER_BUDGET_MESSAGE,
            ));
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn selected_month(&self) -> Month {
        self.selected_month
    }

    pub fn preferences(&self) -> Preferences {
        self.state.preferences
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Notifications raised outside `handle` that nobody has collected yet
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Month view of the selected month in the primary currency
    pub fn month_view(&self) -> MonthView {
        self.month_view_for(self.selected_month)
    }

    pub fn month_view_for(&self, month: Month) -> MonthView {
        compute_month_view(
            &self.state.ledger,
            &self.state.budgets,
            month,
            self.state.preferences.primary_currency,
        )
    }

    /// Display rows for the selected month, newest first.
    ///
    /// Looks colors up through the registry, so a category seen here for
    /// the first time gets (and persists) its color.
    pub fn expense_rows(&mut self) -> Vec<ExpenseRow> {
        let primary = self.state.preferences.primary_currency;
        let expenses: Vec<_> = self
            .state
            .ledger
            .for_month(self.selected_month)
            .into_iter()
            .cloned()
            .collect();

        expenses
            .into_iter()
            .map(|expense| {
                let color = self.color_for(&expense.category);
                let converted = convert(expense.amount, expense.currency_code, primary);
                ExpenseRow {
                    id: expense.id,
                    icon: category_icon(&expense.category),
                    color,
                    note: if expense.note.is_empty() {
                        "No notes".to_string()
                    } else {
                        expense.note
                    },
                    currency_code: expense.currency_code,
                    original_amount: expense.amount,
                    converted_amount: converted,
                    amount_display: format!("-{}", format_money(converted, primary)),
                    date: expense.date,
                    category: expense.category,
                }
            })
            .collect()
    }

    /// Per-category totals of the selected month joined with their colors
    pub fn category_breakdown(&mut self) -> Vec<CategorySlice> {
        self.month_view()
            .per_category_totals
            .into_iter()
            .map(|t| CategorySlice {
                color: self.color_for(&t.category),
                category: t.category,
                total: t.total,
            })
            .collect()
    }

    pub fn dashboard(&mut self) -> Dashboard {
        let view = self.month_view();
        let currency = view.currency;
        let expenses = self.expense_rows();
        let categories = self.category_breakdown();

        Dashboard {
            month: self.selected_month,
            month_label: self.selected_month.label(),
            currency,
            currency_symbol: currency.symbol(),
            theme: self.state.preferences.theme,
            is_over_budget: view.is_over_budget(),
            budget_display: format_money(view.budget, currency),
            spent_display: format_money(view.spent, currency),
            remaining_display: format_signed_money(view.remaining, currency),
            view,
            expenses,
            categories,
        }
    }

    fn color_for(&mut self, category: &str) -> String {
        let out = self.state.color_for(&mut self.store, category);
        report_failures(&out, &mut self.pending);
        out.value
    }
}

fn report_failures<T>(out: &Persisted<T>, events: &mut Vec<Notification>) {
    let already_reported = events
        .iter()
        .any(|n| n.kind == NotificationKind::PersistenceFailed);
    if !out.failures.is_empty() && !already_reported {
        events.push(Notification::new(
            NotificationKind::PersistenceFailed,
            Severity::Warning,
            NOT_SAVED_MESSAGE,
        ));
    }
}

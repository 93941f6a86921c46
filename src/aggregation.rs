// 📊 Aggregation Engine - currency conversion and month views
//
// Pure functions over the ledger and budget table. Every expense amount
// goes through `convert` before it is summed or displayed.

use serde::Serialize;

use crate::budget::BudgetTable;
use crate::currency::CurrencyCode;
use crate::expense::Ledger;
use crate::month::Month;

// ============================================================================
// CONVERSION
// ============================================================================

/// Convert via the reference currency. Same-currency conversion returns
/// the amount untouched so no rounding error creeps in.
pub fn convert(amount: f64, from: CurrencyCode, to: CurrencyCode) -> f64 {
    if from == to {
        return amount;
    }
    amount * from.rate_to_reference() / to.rate_to_reference()
}

// ============================================================================
// MONTH VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Budget, spending and category breakdown of one month, in one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub month: Month,
    pub currency: CurrencyCode,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    /// Ordered by first occurrence within the month's expenses (newest first)
    pub per_category_totals: Vec<CategoryTotal>,
}

impl MonthView {
    /// Over budget only counts when a budget was actually set
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0 && self.budget > 0.0
    }
}

/// Derive the month view. The budget is taken as already denominated in
/// `primary`, whatever currency was primary when it was entered.
pub fn compute_month_view(
    ledger: &Ledger,
    budgets: &BudgetTable,
    month: Month,
    primary: CurrencyCode,
) -> MonthView {
    let budget = budgets.get(month);

    let mut spent = 0.0;
    let mut per_category_totals: Vec<CategoryTotal> = Vec::new();

    for expense in ledger.for_month(month) {
        let amount = convert(expense.amount, expense.currency_code, primary);
        spent += amount;

        match per_category_totals
            .iter_mut()
            .find(|t| t.category == expense.category)
        {
            Some(total) => total.total += amount,
            None => per_category_totals.push(CategoryTotal {
                category: expense.category.clone(),
                total: amount,
            }),
        }
    }

    MonthView {
        month,
        currency: primary,
        budget,
        spent,
        remaining: budget - spent,
        per_category_totals,
    }
}

// ============================================================================
// OVERSPEND TRANSITIONS
// ============================================================================

/// Rising-edge detector for the over-budget flag of the selected month.
///
/// `observe` returns true exactly once per false -> true transition.
/// `reset` must be called whenever the selected month changes.
#[derive(Debug, Clone, Default)]
pub struct OverspendTracker {
    was_over_budget: bool,
}

impl OverspendTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, view: &MonthView) -> bool {
        let over = view.is_over_budget();
        let rising = over && !self.was_over_budget;
        self.was_over_budget = over;
        rising
    }

    pub fn reset(&mut self) {
        self.was_over_budget = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::ExpenseDraft;

    const EPS: f64 = 1e-9;

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn test_convert_identity() {
        for code in CurrencyCode::ALL {
            for x in [0.0, 0.1, 1.0, 123.456, 1e9] {
                assert_eq!(convert(x, code, code), x, "identity failed for {}", code);
            }
        }
    }

    #[test]
    fn test_convert_round_trip() {
        for a in CurrencyCode::ALL {
            for b in CurrencyCode::ALL {
                for x in [0.01, 1.0, 99.99, 25_000.0] {
                    let back = convert(convert(x, a, b), b, a);
                    assert!(
                        (back - x).abs() <= x * 1e-12,
                        "{} -> {} -> {} drifted: {} vs {}",
                        a, b, a, back, x
                    );
                }
            }
        }
    }

    #[test]
    fn test_convert_via_reference() {
        assert!((convert(50.0, CurrencyCode::Eur, CurrencyCode::Usd) - 54.0).abs() < EPS);
        // 1.08 / 1.25
        assert!((convert(100.0, CurrencyCode::Eur, CurrencyCode::Gbp) - 86.4).abs() < EPS);
        // 1000 JPY -> USD -> INR: 6.6 / 0.012
        assert!((convert(1000.0, CurrencyCode::Jpy, CurrencyCode::Inr) - 550.0).abs() < 1e-6);
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add(&ExpenseDraft::new(50.0, "EUR", "Food", "2024-03-05")).unwrap();
        ledger.add(&ExpenseDraft::new(20.0, "USD", "Travel", "2024-03-10")).unwrap();
        ledger.add(&ExpenseDraft::new(10.0, "USD", "Food", "2024-03-01")).unwrap();
        ledger.add(&ExpenseDraft::new(999.0, "USD", "Food", "2024-04-01")).unwrap();
        ledger
    }

    #[test]
    fn test_month_view_totals() {
        let ledger = sample_ledger();
        let mut budgets = BudgetTable::new();
        budgets.set(month("2024-03"), 100.0).unwrap();

        let view = compute_month_view(&ledger, &budgets, month("2024-03"), CurrencyCode::Usd);
        assert_eq!(view.budget, 100.0);
        assert!((view.spent - 84.0).abs() < EPS);
        assert!((view.remaining - 16.0).abs() < EPS);
        assert!(!view.is_over_budget());

        // Newest first: Travel (03-10) then Food (03-05)
        let names: Vec<&str> = view
            .per_category_totals
            .iter()
            .map(|t| t.category.as_str())
            .collect();
        assert_eq!(names, vec!["Travel", "Food"]);
        assert!((view.per_category_totals[1].total - 64.0).abs() < EPS);
    }

    #[test]
    fn test_budget_is_read_in_current_primary_currency() {
        let ledger = Ledger::new();
        let mut budgets = BudgetTable::new();
        budgets.set(month("2024-03"), 100.0).unwrap();

        let view = compute_month_view(&ledger, &budgets, month("2024-03"), CurrencyCode::Jpy);
        assert_eq!(view.budget, 100.0, "budgets are never re-converted");
        assert_eq!(view.currency, CurrencyCode::Jpy);
    }

    #[test]
    fn test_empty_month_is_all_zero() {
        let view = compute_month_view(
            &sample_ledger(),
            &BudgetTable::new(),
            month("2030-01"),
            CurrencyCode::Eur,
        );
        assert_eq!(view.budget, 0.0);
        assert_eq!(view.spent, 0.0);
        assert_eq!(view.remaining, 0.0);
        assert!(view.per_category_totals.is_empty());
    }

    #[test]
    fn test_month_view_is_pure() {
        let ledger = sample_ledger();
        let mut budgets = BudgetTable::new();
        budgets.set(month("2024-03"), 70.0).unwrap();

        let first = compute_month_view(&ledger, &budgets, month("2024-03"), CurrencyCode::Gbp);
        let second = compute_month_view(&ledger, &budgets, month("2024-03"), CurrencyCode::Gbp);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_budget_never_counts_as_over() {
        let view = compute_month_view(
            &sample_ledger(),
            &BudgetTable::new(),
            month("2024-03"),
            CurrencyCode::Usd,
        );
        assert!(view.remaining < 0.0);
        assert!(!view.is_over_budget());
    }

    #[test]
    fn test_tracker_fires_once_per_rising_edge() {
        let mut ledger = Ledger::new();
        let mut budgets = BudgetTable::new();
        let m = month("2024-03");
        budgets.set(m, 100.0).unwrap();
        let mut tracker = OverspendTracker::new();

        let view = |l: &Ledger, b: &BudgetTable| compute_month_view(l, b, m, CurrencyCode::Usd);

        assert!(!tracker.observe(&view(&ledger, &budgets)));

        ledger.add(&ExpenseDraft::new(150.0, "USD", "Rent", "2024-03-01")).unwrap();
        assert!(tracker.observe(&view(&ledger, &budgets)), "false -> true fires");
        assert!(!tracker.observe(&view(&ledger, &budgets)), "still over, no refire");

        ledger.add(&ExpenseDraft::new(5.0, "USD", "Rent", "2024-03-02")).unwrap();
        assert!(!tracker.observe(&view(&ledger, &budgets)));

        // Back under budget, then over again: fires again
        budgets.set(m, 500.0).unwrap();
        assert!(!tracker.observe(&view(&ledger, &budgets)));
        budgets.set(m, 100.0).unwrap();
        assert!(tracker.observe(&view(&ledger, &budgets)));
    }

    #[test]
    fn test_tracker_reset_rearms() {
        let mut ledger = Ledger::new();
        ledger.add(&ExpenseDraft::new(150.0, "USD", "Rent", "2024-03-01")).unwrap();
        let mut budgets = BudgetTable::new();
        budgets.set(month("2024-03"), 100.0).unwrap();

        let view = compute_month_view(&ledger, &budgets, month("2024-03"), CurrencyCode::Usd);
        let mut tracker = OverspendTracker::new();
        assert!(tracker.observe(&view));
        tracker.reset();
        assert!(tracker.observe(&view), "after reset the baseline is 'not alerted'");
    }
}

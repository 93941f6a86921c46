// 🎯 Budget Table - one budget amount per month
//
// Budgets are bare numbers. They carry no currency and are always read
// back in whatever the primary currency is at read time.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::month::Month;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetTable {
    budgets: BTreeMap<Month, f64>,
}

impl BudgetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the budget for a month. Negative or non-finite amounts are rejected.
    pub fn set(&mut self, month: Month, amount: f64) -> Result<(), ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidBudget);
        }
        self.budgets.insert(month, amount);
        Ok(())
    }

    /// Budget for a month, 0 when unset
    pub fn get(&self, month: Month) -> f64 {
        self.budgets.get(&month).copied().unwrap_or(0.0)
    }

    pub fn clear_all(&mut self) {
        self.budgets.clear();
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .budgets
            .iter()
            .map(|(month, amount)| (month.to_string(), Value::from(*amount)))
            .collect();
        Value::Object(map)
    }

    /// Rebuild from persisted JSON (`{"YYYY-MM": number}`), dropping
    /// entries with a bad month key or amount. Returns the number dropped.
    pub fn from_value(value: Value) -> (BudgetTable, usize) {
        let map = match value {
            Value::Object(map) => map,
            _ => return (BudgetTable::new(), 1),
        };

        let mut table = BudgetTable::new();
        let mut skipped = 0;
        for (key, amount) in map {
            let month = key.parse::<Month>();
            let amount = amount.as_f64();
            match (month, amount) {
                (Ok(month), Some(amount)) if table.set(month, amount).is_ok() => {}
                _ => skipped += 1,
            }
        }
        (table, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    #[test]
    fn test_unset_month_is_zero() {
        let table = BudgetTable::new();
        assert_eq!(table.get(month("2024-03")), 0.0);
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = BudgetTable::new();
        table.set(month("2024-03"), 100.0).unwrap();
        table.set(month("2024-03"), 80.0).unwrap();
        assert_eq!(table.get(month("2024-03")), 80.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_zero_budget_is_allowed() {
        let mut table = BudgetTable::new();
        assert!(table.set(month("2024-03"), 0.0).is_ok());
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let mut table = BudgetTable::new();
        for bad in [-0.01, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                table.set(month("2024-03"), bad),
                Err(ValidationError::InvalidBudget),
                "{} should be rejected",
                bad
            );
        }
        assert!(table.is_empty(), "rejected sets must not mutate");
    }

    #[test]
    fn test_clear_all() {
        let mut table = BudgetTable::new();
        table.set(month("2024-03"), 10.0).unwrap();
        table.clear_all();
        assert_eq!(table.get(month("2024-03")), 0.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut table = BudgetTable::new();
        table.set(month("2024-03"), 100.0).unwrap();
        table.set(month("2023-12"), 42.5).unwrap();

        let value = table.to_value();
        assert_eq!(value, json!({"2023-12": 42.5, "2024-03": 100.0}));

        let (back, skipped) = BudgetTable::from_value(value);
        assert_eq!(skipped, 0);
        assert_eq!(back, table);
    }

    #[test]
    fn test_from_value_drops_bad_entries() {
        let value = json!({"2024-03": 100, "March": 5, "2024-04": "lots", "2024-05": -1});
        let (table, skipped) = BudgetTable::from_value(value);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(month("2024-03")), 100.0);
        assert_eq!(skipped, 3);
    }
}

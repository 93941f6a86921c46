// 🎨 Category Color Registry - stable display color per category
//
// A category keeps the color it was first given for the lifetime of the
// data. New categories take the next palette slot by insertion count,
// wrapping around once the palette is exhausted.

use serde_json::{Map, Value};

/// Ordered palette, indexed by the number of categories already mapped
pub const PALETTE: [&str; 20] = [
    "#0f76e6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6",
    "#06b6d4", "#f97316", "#34d399", "#6366f1", "#fb7185",
    "#3b82f6", "#4ade80", "#fb923c", "#be123c", "#a855f7",
    "#0891b2", "#ea580c", "#059669", "#3730a3", "#e11d48",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryColor {
    pub category: String,
    pub color: String,
}

/// Outcome of a color lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLookup {
    pub color: String,
    /// True when this call created the mapping (and it needs persisting)
    pub assigned: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryColorRegistry {
    /// Insertion order is first-encounter order
    entries: Vec<CategoryColor>,
}

impl CategoryColorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing color for a category, without assigning one
    pub fn get(&self, category: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.color.as_str())
    }

    /// Color for a category, assigning the next palette slot on first sight.
    ///
    /// Idempotent after the first call for a given category.
    pub fn color_for(&mut self, category: &str) -> ColorLookup {
        if let Some(color) = self.get(category) {
            return ColorLookup {
                color: color.to_string(),
                assigned: false,
            };
        }

        let color = PALETTE[self.entries.len() % PALETTE.len()].to_string();
        self.entries.push(CategoryColor {
            category: category.to_string(),
            color: color.clone(),
        });

        ColorLookup {
            color,
            assigned: true,
        }
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.category.clone(), Value::String(e.color.clone())))
            .collect();
        Value::Object(map)
    }

    /// Rebuild from persisted JSON (`{category: color}`), keeping stored
    /// order. Non-string colors are dropped; the drop count is returned.
    pub fn from_value(value: Value) -> (CategoryColorRegistry, usize) {
        let map = match value {
            Value::Object(map) => map,
            _ => return (CategoryColorRegistry::new(), 1),
        };

        let mut registry = CategoryColorRegistry::new();
        let mut skipped = 0;
        for (category, color) in map {
            match color {
                Value::String(color) => registry.entries.push(CategoryColor { category, color }),
                _ => skipped += 1,
            }
        }
        (registry, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_category_gets_first_slot() {
        let mut registry = CategoryColorRegistry::new();
        let lookup = registry.color_for("Food");
        assert_eq!(lookup.color, PALETTE[0]);
        assert!(lookup.assigned);
    }

    #[test]
    fn test_color_is_stable() {
        let mut registry = CategoryColorRegistry::new();
        let first = registry.color_for("Food").color;
        registry.color_for("Travel");

        for _ in 0..10 {
            let again = registry.color_for("Food");
            assert_eq!(again.color, first);
            assert!(!again.assigned, "repeat lookups must not assign");
        }
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_assignment_follows_call_order_not_alphabet() {
        let mut registry = CategoryColorRegistry::new();
        registry.color_for("Zoo");
        registry.color_for("Apples");
        assert_eq!(registry.get("Zoo"), Some(PALETTE[0]));
        assert_eq!(registry.get("Apples"), Some(PALETTE[1]));
    }

    #[test]
    fn test_categories_are_case_sensitive() {
        let mut registry = CategoryColorRegistry::new();
        registry.color_for("food");
        let upper = registry.color_for("Food");
        assert!(upper.assigned);
        assert_eq!(upper.color, PALETTE[1]);
    }

    #[test]
    fn test_palette_wraps_around() {
        let mut registry = CategoryColorRegistry::new();
        for i in 0..PALETTE.len() {
            registry.color_for(&format!("cat-{}", i));
        }
        let wrapped = registry.color_for("one-more");
        assert_eq!(wrapped.color, PALETTE[0]);
        assert_eq!(registry.len(), PALETTE.len() + 1);
    }

    #[test]
    fn test_clear_all_restarts_palette() {
        let mut registry = CategoryColorRegistry::new();
        registry.color_for("Food");
        registry.color_for("Travel");
        registry.clear_all();
        assert_eq!(registry.color_for("Travel").color, PALETTE[0]);
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let mut registry = CategoryColorRegistry::new();
        registry.color_for("Zoo");
        registry.color_for("Apples");

        let value = registry.to_value();
        let (back, skipped) = CategoryColorRegistry::from_value(value);
        assert_eq!(skipped, 0);
        assert_eq!(back, registry);

        // Next slot continues from the stored count
        let mut back = back;
        assert_eq!(back.color_for("Books").color, PALETTE[2]);
    }

    #[test]
    fn test_from_value_drops_non_string_colors() {
        let (registry, skipped) =
            CategoryColorRegistry::from_value(json!({"Food": "#000000", "Bad": 42}));
        assert_eq!(registry.len(), 1);
        assert_eq!(skipped, 1);
    }
}

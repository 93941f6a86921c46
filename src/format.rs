// Display helpers: money strings and category icons

use crate::currency::CurrencyCode;

/// Absolute amount with the currency symbol, thousands separators and
/// two decimals, e.g. `€1,234.50`. Callers add any sign themselves.
pub fn format_money(amount: f64, currency: CurrencyCode) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", currency.symbol(), grouped, frac)
}

/// Signed variant used for the "money left" figure
pub fn format_signed_money(amount: f64, currency: CurrencyCode) -> String {
    if amount < 0.0 {
        format!("-{}", format_money(amount, currency))
    } else {
        format_money(amount, currency)
    }
}

/// Icon for a category; matching ignores case
pub fn category_icon(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "food" => "🍔",
        "travel" => "✈️",
        "shopping" => "🛍️",
        "utilities" => "💡",
        "health" => "💊",
        "entertainment" => "🎬",
        _ => "💰",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0, CurrencyCode::Usd), "$0.00");
        assert_eq!(format_money(54.0, CurrencyCode::Usd), "$54.00");
        assert_eq!(format_money(1234.5, CurrencyCode::Eur), "€1,234.50");
        assert_eq!(format_money(1_000_000.0, CurrencyCode::Jpy), "¥1,000,000.00");
        assert_eq!(format_money(-18.8, CurrencyCode::Usd), "$18.80", "sign is dropped");
        assert_eq!(format_money(999.999, CurrencyCode::Npr), "रु1,000.00");
    }

    #[test]
    fn test_format_signed_money() {
        assert_eq!(format_signed_money(-18.8, CurrencyCode::Usd), "-$18.80");
        assert_eq!(format_signed_money(46.0, CurrencyCode::Gbp), "£46.00");
    }

    #[test]
    fn test_category_icon_ignores_case() {
        assert_eq!(category_icon("Food"), "🍔");
        assert_eq!(category_icon("FOOD"), "🍔");
        assert_eq!(category_icon("travel"), "✈️");
        assert_eq!(category_icon("Groceries"), "💰");
    }
}

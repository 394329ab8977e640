//! Number and cell formatting helpers

use serde_json::Value;

/// Placeholder written for missing cells
pub const MISSING: &str = "-";

/// Format digits with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;
    for c in s.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Currency amount, e.g. `Rs. 12,345.50` or `-Rs. 80.00`
pub fn format_currency(amount: f64, symbol: &str, decimal_places: u32) -> String {
    let fixed = format!("{:.*}", decimal_places as usize, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };

    let mut out = String::new();
    if amount < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    if !symbol.is_empty() {
        out.push_str(symbol);
        out.push(' ');
    }
    out.push_str(&format_number(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(&fraction);
    }
    out
}

/// Numeric value of a cell; numeric strings count (Postgres NUMERIC arrives as text in some drivers)
pub fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Display text of a cell
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Cut `text` to at most `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}~", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(12345.5, "Rs.", 2), "Rs. 12,345.50");
        assert_eq!(format_currency(-80.0, "Rs.", 2), "-Rs. 80.00");
        assert_eq!(format_currency(1000.0, "", 0), "1,000");
        assert_eq!(format_currency(-0.001, "$", 2), "$ 0.00");
    }

    #[test]
    fn test_cell_helpers() {
        assert_eq!(cell_number(&json!(12.5)), Some(12.5));
        assert_eq!(cell_number(&json!("300.10")), Some(300.10));
        assert_eq!(cell_number(&json!(null)), None);
        assert_eq!(cell_text(None), "-");
        assert_eq!(cell_text(Some(&json!(""))), "-");
        assert_eq!(cell_text(Some(&json!(7))), "7");
        assert_eq!(cell_text(Some(&json!("Cash"))), "Cash");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Cash", 10), "Cash");
        assert_eq!(truncate("A very long party name", 8), "A very ~");
    }
}

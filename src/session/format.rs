pub const CURRENCY_SYMBOL: &str = "J$";

/// Printed in place of an infinite or NaN amount.
pub const NOT_A_NUMBER: &str = "n/a";

/// Two-decimal amount with thousands separators, e.g. `1,234.57`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    let scaled = (value.abs() * 100.0).round();
    let (whole, cents) = if scaled < u64::MAX as f64 {
        let total_cents = scaled as u64;
        ((total_cents / 100).to_string(), total_cents % 100)
    } else {
        // beyond u64 cents the value has no fractional part left to show
        (format!("{:.0}", value.abs()), 0)
    };
    let sign = if value < 0.0 && scaled > 0.0 { "-" } else { "" };
    format!("{sign}{}.{cents:02}", group_thousands(&whole))
}

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_A_NUMBER.to_string();
    }
    let amount = format_amount(value);
    match amount.strip_prefix('-') {
        Some(unsigned) => format!("-{CURRENCY_SYMBOL}{unsigned}"),
        None => format!("{CURRENCY_SYMBOL}{amount}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

//! Presentation formatting shared by the CLI and the web pages

use crate::models::{BreakdownSlice, CategoryMetric};

/// Format an amount with two decimals and thousands separators
///
/// `1234567.891` becomes `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0.00 and should not print a sign
    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Delta column text: the previous value, or a dash when there is none
pub fn format_delta(metric: &CategoryMetric) -> String {
    if metric.delta == 0.0 {
        "—".to_string()
    } else {
        format_amount(metric.delta)
    }
}

/// Percentage share of each slice in the breakdown total
///
/// All shares are zero when the total is zero.
pub fn breakdown_shares(slices: &[BreakdownSlice]) -> Vec<f64> {
    let total: f64 = slices.iter().map(|s| s.amount).sum();
    slices
        .iter()
        .map(|s| {
            if total == 0.0 {
                0.0
            } else {
                s.amount / total * 100.0
            }
        })
        .collect()
}

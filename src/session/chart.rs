use std::fmt::Write;

use super::format::format_amount;

pub const BAR_WIDTH: usize = 50;
pub const ACCUMULATION_BAR: char = '█';
pub const DEPLETION_BAR: char = '▓';

/// Renders both phases as one year-numbered bar chart scaled to the largest
/// balance.
pub fn render_balance_chart(accumulation: &[f64], depletion: &[f64]) -> String {
    let mut out = String::new();
    out.push_str("\nBALANCE OVER TIME\n\n");
    let _ = writeln!(
        out,
        "Accumulation = '{ACCUMULATION_BAR}' | Depletion = '{DEPLETION_BAR}'\n"
    );

    let max_balance = accumulation
        .iter()
        .chain(depletion)
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    for (i, &balance) in accumulation.iter().chain(depletion).enumerate() {
        let year = i + 1;
        let bar_char = if i < accumulation.len() {
            ACCUMULATION_BAR
        } else {
            DEPLETION_BAR
        };
        let bar: String = std::iter::repeat_n(bar_char, bar_length(balance, max_balance)).collect();
        let _ = writeln!(out, "Year {year:2} | {bar} {} JMD", format_amount(balance));
    }
    out
}

fn bar_length(balance: f64, max_balance: f64) -> usize {
    if max_balance <= 0.0 || balance <= 0.0 {
        return 0;
    }
    ((balance / max_balance) * BAR_WIDTH as f64) as usize
}

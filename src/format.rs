//! Display formatting for KPI cards and report cells.

/// Insert `,` every three digits of an unsigned integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fixed-point number with thousands separators, e.g. `1,234.50`.
pub fn number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Dollar amount with cents: `$1,234.50`.
pub fn currency(value: f64) -> String {
    format!("${}", number(value, 2))
}

/// Whole count with separators: `1,235`.
pub fn units(value: f64) -> String {
    number(value, 0)
}

/// Percentage with one decimal; `value` is already scaled to 0–100.
pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

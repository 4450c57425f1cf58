/// Whole-dollar amount with thousands separators, e.g. `150000.0` -> `150,000`.
pub fn usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }

    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

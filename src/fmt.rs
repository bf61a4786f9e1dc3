pub const CURRENCY: char = '\u{20A6}';

/// Format a float as a naira amount with thousands separators: ₦1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{CURRENCY}{with_commas}.{dec_part}")
    } else {
        format!("{CURRENCY}{with_commas}.{dec_part}")
    }
}

/// Numeric value of a formatted amount. Every character that is not a digit
/// or a decimal point is dropped first, so the sign is lost too.
pub fn parse_amount(raw: &str) -> f64 {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

//! Display formatting. Rounding happens here and nowhere else.

use crate::calc::table::StatKind;

/// Two decimals, with a `%` suffix for percentage stats.
pub fn format_power(value: f64, stat: StatKind) -> String {
    match stat {
        StatKind::Power => format!("{value:.2}"),
        StatKind::Percent => format!("{value:.2}%"),
    }
}

/// `1234567` -> `1,234,567`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed variant of [`format_amount`] for surplus columns.
pub fn format_signed(amount: i64) -> String {
    let magnitude = format_amount(amount.unsigned_abs());
    if amount < 0 {
        format!("-{magnitude}")
    } else {
        format!("+{magnitude}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_rounds_to_two_decimals() {
        assert_eq!(format_power(12.346, StatKind::Power), "12.35");
        assert_eq!(format_power(9.0, StatKind::Percent), "9.00%");
    }

    #[test]
    fn amounts_get_thousands_separators() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(1234567), "1,234,567");
        assert_eq!(format_signed(-2500), "-2,500");
        assert_eq!(format_signed(13), "+13");
    }
}

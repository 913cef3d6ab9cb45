//! Human-readable renderings used inside highlight and insight strings.

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let abs = (value.abs() * 100.0).round() / 100.0;
    let sign = if value < 0.0 && abs > 0.0 { "-" } else { "" };

    // Each threshold sits where the smaller band would round up into this one.
    if abs >= 999_995_000.0 {
        format!("{sign}${:.2}B", abs / 1_000_000_000.0)
    } else if abs >= 999_950.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.1}K", abs / 1_000.0)
    } else {
        format!("{sign}${abs:.2}")
    }
}

/// Rounds to a whole number and groups thousands with commas.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// `part` as a percentage of `total`; `0` when the ratio is undefined.
pub fn calculate_share(part: f64, total: f64) -> f64 {
    if !part.is_finite() || !total.is_finite() || total == 0.0 {
        return 0.0;
    }
    part / total * 100.0
}

#[cfg(test)]
mod tests {
    use super::{calculate_share, format_currency, format_number};

    #[test]
    fn currency_uses_magnitude_suffixes() {
        assert_eq!(format_currency(2_340_000_000.0), "$2.34B");
        assert_eq!(format_currency(1_250_000.0), "$1.25M");
        assert_eq!(format_currency(48_230.0), "$48.2K");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(-12_400.0), "-$12.4K");
    }

    #[test]
    fn currency_band_follows_the_rounded_value() {
        assert_eq!(format_currency(999.994), "$999.99");
        assert_eq!(format_currency(999.996), "$1.0K");
        assert_eq!(format_currency(-999.999), "-$1.0K");
        assert_eq!(format_currency(999_949.0), "$999.9K");
        assert_eq!(format_currency(999_960.0), "$1.00M");
        assert_eq!(format_currency(999_999.996), "$1.00M");
        assert_eq!(format_currency(999_996_000.0), "$1.00B");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn currency_tolerates_non_finite_values() {
        assert_eq!(format_currency(f64::NAN), "$0.00");
        assert_eq!(format_currency(f64::INFINITY), "$0.00");
    }

    #[test]
    fn numbers_are_rounded_and_grouped() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.4), "999");
        assert_eq!(format_number(1234.6), "1,235");
        assert_eq!(format_number(1_234_567.0), "1,234,567");
        assert_eq!(format_number(-45_000.0), "-45,000");
        assert_eq!(format_number(f64::NAN), "—");
    }

    #[test]
    fn share_is_zero_for_empty_totals() {
        assert_eq!(calculate_share(5.0, 0.0), 0.0);
        assert_eq!(calculate_share(f64::NAN, 10.0), 0.0);
        assert!((calculate_share(25.0, 200.0) - 12.5).abs() < 1e-12);
    }
}

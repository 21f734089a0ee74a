//! Human-readable scale-bar labels.

/// Lengths at or above this many nanometers are shown in micrometers.
pub const MICRON_THRESHOLD_NM: f64 = 1000.0;

/// Significant digits kept by [`format_general`].
const SIGNIFICANT_DIGITS: i32 = 6;

/// Formats a physical length as `"<value> <unit>"`.
///
/// Lengths below 1000 nm stay in nanometers; longer ones are divided by
/// 1000 and shown in micrometers.
///
/// ```
/// use olympus_scalebar::layout::format_label;
///
/// assert_eq!(format_label(999.0), "999 nm");
/// assert_eq!(format_label(1000.0), "1 µm");
/// assert_eq!(format_label(2500.0), "2.5 µm");
/// ```
pub fn format_label(length_nm: f64) -> String {
    if length_nm >= MICRON_THRESHOLD_NM {
        format!("{} µm", format_general(length_nm / 1000.0))
    } else {
        format!("{} nm", format_general(length_nm))
    }
}

/// General number formatting: six significant digits, trailing zeros and a
/// trailing decimal point removed, scientific notation for very large or
/// very small magnitudes.
pub fn format_general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }

    let exponent = value.abs().log10().floor() as i32;
    if !(-4..SIGNIFICANT_DIGITS).contains(&exponent) {
        let formatted = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs());
    }

    let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_switches_at_one_micron() {
        assert_eq!(format_label(999.0), "999 nm");
        assert_eq!(format_label(1000.0), "1 µm");
        assert_eq!(format_label(2500.0), "2.5 µm");
    }

    #[test]
    fn sub_nanometer_lengths_keep_decimals() {
        assert_eq!(format_label(0.1), "0.1 nm");
        assert_eq!(format_label(0.5), "0.5 nm");
    }

    #[test]
    fn catalog_extremes() {
        assert_eq!(format_label(50000.0), "50 µm");
        assert_eq!(format_label(500.0), "500 nm");
        assert_eq!(format_label(10.0), "10 nm");
    }

    #[test]
    fn general_format_drops_trailing_zeros() {
        assert_eq!(format_general(2.0), "2");
        assert_eq!(format_general(0.25), "0.25");
        assert_eq!(format_general(123.456), "123.456");
    }

    #[test]
    fn general_format_limits_significant_digits() {
        assert_eq!(format_general(1.0 / 3.0), "0.333333");
        assert_eq!(format_general(123456.7), "123457");
    }

    #[test]
    fn general_format_uses_exponent_for_extremes() {
        assert_eq!(format_general(1_000_000.0), "1e+06");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(2.5e7), "2.5e+07");
    }

    #[test]
    fn general_format_zero() {
        assert_eq!(format_general(0.0), "0");
    }
}

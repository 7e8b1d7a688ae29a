use crate::error::{AppError, Result};

/// Parses a user-supplied decimal amount ("12.34") into whole cents.
/// At most two fraction digits; negative amounts are rejected here so
/// callers only ever see non-negative cents.
pub fn parse_amount(s: &str) -> Result<i64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AppError::InvalidInput("Amount is required".to_string()));
    }
    if s.starts_with('-') || s.starts_with('+') {
        return Err(AppError::InvalidInput(format!("Invalid amount: {}", s)));
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((_, "")) => {
            return Err(AppError::InvalidInput(format!("Invalid amount: {}", s)));
        }
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if frac_part.len() > 2 {
        return Err(AppError::InvalidInput(format!(
            "Invalid amount: {} (at most 2 decimal places)",
            s
        )));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AppError::InvalidInput(format!("Invalid amount: {}", s)));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid amount: {}", s)))?
    };

    // "5" -> 500, "5.1" -> 510, "5.10" -> 510
    let mut cents: i64 = 0;
    for c in frac_part.chars() {
        cents = cents * 10 + (c as u8 - b'0') as i64;
    }
    if frac_part.len() == 1 {
        cents *= 10;
    }

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| AppError::InvalidInput(format!("Amount too large: {}", s)))
}

/// Renders cents as a decimal string, always with two fraction digits.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_amounts() {
        assert_eq!(parse_amount("100").unwrap(), 10000);
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount(" 7 ").unwrap(), 700);
    }

    #[test]
    fn test_parse_fractional_amounts() {
        assert_eq!(parse_amount("12.34").unwrap(), 1234);
        assert_eq!(parse_amount("12.3").unwrap(), 1230);
        assert_eq!(parse_amount("0.05").unwrap(), 5);
        assert_eq!(parse_amount(".50").unwrap(), 50);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount(".").is_err());
        assert!(parse_amount("12.").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("+5").is_err());
        assert!(parse_amount("1.234").is_err());
        assert!(parse_amount("12,34").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1e3").is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_amount("92233720368547758.08").is_err());
        assert!(parse_amount("999999999999999999999").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(10000), "100.00");
        assert_eq!(format_cents(-1234), "-12.34");
    }

    #[test]
    fn test_round_trip() {
        for s in ["0.01", "1.00", "99.99", "12345.67"] {
            assert_eq!(format_cents(parse_amount(s).unwrap()), s);
        }
    }
}

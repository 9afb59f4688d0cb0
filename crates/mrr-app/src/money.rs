// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    Empty,
    Malformed,
    TooPrecise,
    Overflow,
}

impl std::fmt::Display for MoneyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("enter a number like 49.99"),
            Self::Malformed => f.write_str("expected a number like 49.99"),
            Self::TooPrecise => f.write_str("use at most two decimal places"),
            Self::Overflow => f.write_str("amount is too large"),
        }
    }
}

impl std::error::Error for MoneyError {}

/// Parses a decimal dollar amount into cents.
///
/// Accepts an optional leading `$`, an optional sign, and up to two
/// fractional digits: `"49.99"`, `"$19.5"`, `"-5"`, `".75"`.
pub fn parse_amount(input: &str) -> Result<i64, MoneyError> {
    let trimmed = input.trim();
    let unprefixed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let (negative, digits) = match unprefixed.as_bytes().first() {
        Some(b'-') => (true, &unprefixed[1..]),
        Some(b'+') => (false, &unprefixed[1..]),
        Some(_) => (false, unprefixed),
        None => return Err(MoneyError::Empty),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(MoneyError::Malformed);
    }
    if !whole.bytes().all(|byte| byte.is_ascii_digit())
        || !frac.bytes().all(|byte| byte.is_ascii_digit())
    {
        return Err(MoneyError::Malformed);
    }
    if frac.len() > 2 {
        return Err(MoneyError::TooPrecise);
    }

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().map_err(|_| MoneyError::Overflow)?
    };
    let frac_value = match frac.len() {
        0 => 0,
        1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
        _ => frac.parse::<i64>().map_err(|_| MoneyError::Malformed)?,
    };

    let cents = whole_value
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac_value))
        .ok_or(MoneyError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Adds amounts, clamping at the `i64` bounds instead of wrapping.
pub fn sum_cents(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts
        .into_iter()
        .fold(0_i64, |total, amount| total.saturating_add(amount))
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = absolute / 100;
    let remainder = absolute % 100;
    format!("{sign}${}.{remainder:02}", group_thousands(dollars))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{MoneyError, format_cents, parse_amount, sum_cents};
    use std::collections::BTreeMap;

    #[test]
    fn parse_amount_accepts_plain_and_prefixed_values() {
        let cases = BTreeMap::from([
            ("49.99", 4_999),
            ("$19.5", 1_950),
            ("100", 10_000),
            (" 7 ", 700),
            (".75", 75),
            ("5.", 500),
            ("-5", -500),
            ("$-12.30", -1_230),
            ("0", 0),
        ]);
        for (input, expected) in cases {
            assert_eq!(parse_amount(input), Ok(expected), "input {input:?}");
        }
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), Err(MoneyError::Empty));
        assert_eq!(parse_amount("$"), Err(MoneyError::Empty));
        for input in ["abc", "1.2.3", ".", "-", "1e3", "12a", "$$5"] {
            assert!(parse_amount(input).is_err(), "input {input:?}");
        }
        assert_eq!(parse_amount("1.234"), Err(MoneyError::TooPrecise));
        assert_eq!(
            parse_amount("999999999999999999999"),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn format_cents_groups_thousands_and_keeps_sign() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(4_999), "$49.99");
        assert_eq!(format_cents(123_456), "$1,234.56");
        assert_eq!(format_cents(100_000_000), "$1,000,000.00");
        assert_eq!(format_cents(-500), "-$5.00");
        assert_eq!(format_cents(i64::MIN), "-$92,233,720,368,547,758.08");
    }

    #[test]
    fn sum_cents_clamps_instead_of_wrapping() {
        assert_eq!(sum_cents(Vec::new()), 0);
        assert_eq!(sum_cents([4_999, 1, -1_000]), 4_000);
        assert_eq!(sum_cents([i64::MAX, i64::MAX]), i64::MAX);
        assert_eq!(sum_cents([i64::MIN, -1]), i64::MIN);
        assert_eq!(sum_cents([i64::MAX, 1, -10]), i64::MAX - 10);
    }
}

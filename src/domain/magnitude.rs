//! Magnitude-suffixed number parsing and formatting.
//!
//! Turns strings such as `"12.3B"`, `"450M"` or `" 1.5k "` into plain `f64`
//! values through a closed suffix table, and formats numbers back into the
//! same notation for display.

use crate::domain::error::ParseError;
use std::fmt;

/// Scale abbreviation appended to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suffix {
    Thousand,
    Million,
    Billion,
    Trillion,
}

impl Suffix {
    /// Largest multiplier first.
    pub const DESCENDING: [Suffix; 4] = [
        Suffix::Trillion,
        Suffix::Billion,
        Suffix::Million,
        Suffix::Thousand,
    ];

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'K' => Some(Suffix::Thousand),
            'M' => Some(Suffix::Million),
            'B' => Some(Suffix::Billion),
            'T' => Some(Suffix::Trillion),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Suffix::Thousand => 'K',
            Suffix::Million => 'M',
            Suffix::Billion => 'B',
            Suffix::Trillion => 'T',
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Suffix::Thousand => 1e3,
            Suffix::Million => 1e6,
            Suffix::Billion => 1e9,
            Suffix::Trillion => 1e12,
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A mantissa with an optional scale suffix, before reduction to a plain number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeValue {
    pub mantissa: f64,
    pub suffix: Option<Suffix>,
}

impl MagnitudeValue {
    pub fn multiplier(&self) -> f64 {
        self.suffix.map(Suffix::multiplier).unwrap_or(1.0)
    }

    pub fn value(&self) -> f64 {
        self.mantissa * self.multiplier()
    }
}

impl fmt::Display for MagnitudeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix {
            Some(s) => write!(f, "{}{}", self.mantissa, s),
            None => write!(f, "{}", self.mantissa),
        }
    }
}

/// Parse a magnitude string into its plain numeric value.
pub fn parse(raw: &str) -> Result<f64, ParseError> {
    decompose(raw).map(|mv| mv.value())
}

/// Split a magnitude string into mantissa and suffix without applying the multiplier.
///
/// Surrounding whitespace is ignored, as is whitespace between the mantissa
/// and the suffix. A trailing letter outside `K`/`M`/`B`/`T` is an error
/// rather than an unscaled value.
pub fn decompose(raw: &str) -> Result<MagnitudeValue, ParseError> {
    let start = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(raw, "empty input", start));
    }

    let (last_idx, last) = match trimmed.char_indices().next_back() {
        Some(pair) => pair,
        None => return Err(ParseError::new(raw, "empty input", start)),
    };

    let (body, suffix) = if last.is_alphabetic() {
        match Suffix::from_char(last) {
            Some(s) => (trimmed[..last_idx].trim_end(), Some(s)),
            None => {
                return Err(ParseError::new(
                    raw,
                    format!("unknown suffix '{}' (expected K, M, B or T)", last),
                    start + last_idx,
                ));
            }
        }
    } else {
        (trimmed, None)
    };

    let mantissa = Mantissa::new(raw, body, start).parse()?;
    let mv = MagnitudeValue { mantissa, suffix };
    if !mv.value().is_finite() {
        return Err(ParseError::new(raw, "value out of range", start));
    }
    Ok(mv)
}

struct Mantissa<'a> {
    raw: &'a str,
    body: &'a str,
    offset: usize,
    pos: usize,
}

impl<'a> Mantissa<'a> {
    fn new(raw: &'a str, body: &'a str, offset: usize) -> Self {
        Self {
            raw,
            body,
            offset,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.body[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.raw, message, self.offset + self.pos)
    }

    fn parse(mut self) -> Result<f64, ParseError> {
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        let mut digits = 0;
        let mut has_dot = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
            } else if ch == '.' && !has_dot {
                has_dot = true;
            } else if ch == '.' {
                return Err(self.error("multiple decimal points"));
            } else {
                return Err(self.error(format!("unexpected character '{}'", ch)));
            }
            self.advance();
        }

        if digits == 0 {
            return Err(self.error("expected number"));
        }

        let value = self.body.parse::<f64>().map_err(|_| {
            ParseError::new(self.raw, format!("invalid number: {}", self.body), self.offset)
        })?;
        if !value.is_finite() {
            return Err(ParseError::new(self.raw, "value out of range", self.offset));
        }
        Ok(value)
    }
}

/// Format `value` with the largest suffix that keeps the mantissa at or above 1.
///
/// Values below 1000 in magnitude get no suffix. Non-finite values are
/// rendered as-is. Near `f64::MAX` the rounded mantissa can scale back past
/// the `f64` range, in which case [`parse`] reports it as out of range.
pub fn format(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let abs = value.abs();
    let mut tier = Suffix::DESCENDING
        .iter()
        .position(|s| abs >= s.multiplier());

    // 999_999 rounds to "1000.00K"; promote it to "1.00M".
    if let Some(idx) = tier {
        if idx > 0 && rounded_abs(abs / Suffix::DESCENDING[idx].multiplier(), precision) >= 1000.0 {
            tier = Some(idx - 1);
        }
    } else if rounded_abs(abs, precision) >= 1000.0 {
        tier = Some(Suffix::DESCENDING.len() - 1);
    }

    match tier {
        Some(idx) => {
            let suffix = Suffix::DESCENDING[idx];
            format!("{:.*}{}", precision, value / suffix.multiplier(), suffix)
        }
        None => format!("{:.*}", precision, value),
    }
}

/// [`format`] with two decimal places.
pub fn format_default(value: f64) -> String {
    format(value, DEFAULT_PRECISION)
}

pub const DEFAULT_PRECISION: usize = 2;

fn rounded_abs(mantissa: f64, precision: usize) -> f64 {
    format!("{:.*}", precision, mantissa)
        .parse::<f64>()
        .map(f64::abs)
        .unwrap_or(mantissa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_parses(input: &str, expected: f64) {
        let v = parse(input).unwrap_or_else(|e| panic!("'{}' failed: {}", input, e));
        assert_relative_eq!(v, expected, max_relative = 1e-12);
    }

    fn assert_rejects(input: &str) -> ParseError {
        match parse(input) {
            Ok(v) => panic!("'{}' should fail, got {}", input, v),
            Err(e) => e,
        }
    }

    // --- parse ---

    #[test]
    fn plain_numbers() {
        assert_parses("7", 7.0);
        assert_parses("0.25", 0.25);
        assert_parses("-42.5", -42.5);
        assert_parses("+3", 3.0);
    }

    #[test]
    fn suffixed_values() {
        assert_eq!(parse("12.3B").unwrap(), 12_300_000_000.0);
        assert_eq!(parse("450M").unwrap(), 450_000_000.0);
        assert_eq!(parse("1.5K").unwrap(), 1_500.0);
        assert_eq!(parse("2T").unwrap(), 2_000_000_000_000.0);
    }

    #[test]
    fn suffix_case_insensitive() {
        assert_eq!(parse("1b").unwrap(), parse("1B").unwrap());
        assert_eq!(parse("3m").unwrap(), 3_000_000.0);
        assert_eq!(parse("4k").unwrap(), 4_000.0);
        assert_eq!(parse("5t").unwrap(), 5e12);
    }

    #[test]
    fn negative_keeps_sign() {
        assert_eq!(parse("-3.5M").unwrap(), -3_500_000.0);
    }

    #[test]
    fn zero_with_and_without_suffix() {
        assert_eq!(parse("0").unwrap(), 0.0);
        assert_eq!(parse("0B").unwrap(), 0.0);
        assert_eq!(parse("0.0K").unwrap(), 0.0);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(parse(" 1.5K ").unwrap(), 1_500.0);
        assert_eq!(parse("\t450 M\n").unwrap(), 450_000_000.0);
        assert_eq!(parse("  7  ").unwrap(), 7.0);
    }

    #[test]
    fn leading_or_trailing_dot() {
        assert_parses(".5K", 500.0);
        assert_parses("5.M", 5_000_000.0);
    }

    #[test]
    fn empty_input_rejected() {
        let err = assert_rejects("");
        assert_eq!(err.message, "empty input");
        assert_rejects("   ");
    }

    #[test]
    fn non_numeric_rejected() {
        let err = assert_rejects("abc");
        assert_eq!(err.raw, "abc");
    }

    #[test]
    fn multiple_dots_rejected() {
        let err = assert_rejects("1.2.3B");
        assert_eq!(err.message, "multiple decimal points");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn unknown_suffix_rejected() {
        let err = assert_rejects("5Z");
        assert!(err.message.contains("unknown suffix 'Z'"));
        assert_eq!(err.position, 1);
    }

    #[test]
    fn leading_suffix_rejected() {
        let err = assert_rejects("K5");
        assert!(err.message.contains("'K'"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn suffix_alone_rejected() {
        assert_eq!(assert_rejects("B").message, "expected number");
        assert_eq!(assert_rejects("-M").message, "expected number");
    }

    #[test]
    fn double_suffix_rejected() {
        assert_rejects("1MB");
        assert_rejects("2KK");
    }

    #[test]
    fn exponent_and_specials_rejected() {
        assert_rejects("1e9");
        assert_rejects("inf");
        assert_rejects("NaN");
        assert_rejects("1,000");
    }

    #[test]
    fn inner_whitespace_in_mantissa_rejected() {
        assert_rejects("1 000");
        assert_rejects("- 5");
    }

    #[test]
    fn error_position_accounts_for_leading_whitespace() {
        let err = assert_rejects("  9Q");
        assert_eq!(err.position, 3);
        assert_eq!(err.display_with_context().lines().nth(1), Some("   ^"));
    }

    #[test]
    fn decompose_keeps_parts() {
        let mv = decompose("12.3B").unwrap();
        assert_eq!(mv.mantissa, 12.3);
        assert_eq!(mv.suffix, Some(Suffix::Billion));
        assert_eq!(mv.to_string(), "12.3B");

        let plain = decompose("7").unwrap();
        assert_eq!(plain.suffix, None);
        assert_eq!(plain.multiplier(), 1.0);
    }

    #[test]
    fn overflowing_mantissa_rejected() {
        let err = assert_rejects(&"9".repeat(400));
        assert_eq!(err.message, "value out of range");
        assert_eq!(err.position, 0);
    }

    #[test]
    fn overflowing_scaled_value_rejected() {
        let err = assert_rejects(&format!("{}T", "9".repeat(300)));
        assert_eq!(err.message, "value out of range");
        let err = assert_rejects(&format!(" -{}T", "9".repeat(300)));
        assert_eq!(err.position, 1);
    }

    #[test]
    fn largest_finite_value_does_not_parse_to_infinity() {
        for v in [f64::MAX, f64::MIN] {
            let err = assert_rejects(&format(v, 2));
            assert_eq!(err.message, "value out of range");
        }
    }

    #[test]
    fn large_values_within_range_still_parse() {
        assert_parses(&format!("1{}T", "0".repeat(290)), 1e302);
    }

    // --- format ---

    #[test]
    fn format_below_thousand_has_no_suffix() {
        assert_eq!(format(500.0, 2), "500.00");
        assert_eq!(format(7.0, 0), "7");
        assert_eq!(format(-12.345, 1), "-12.3");
    }

    #[test]
    fn format_each_tier() {
        assert_eq!(format(45_000.0, 2), "45.00K");
        assert_eq!(format(2_300_000_000.0, 2), "2.30B");
        assert_eq!(format(450_000_000.0, 1), "450.0M");
        assert_eq!(format(1.25e12, 2), "1.25T");
        assert_eq!(format(-3_500_000.0, 2), "-3.50M");
    }

    #[test]
    fn format_past_largest_suffix_keeps_trillions() {
        assert_eq!(format(5e15, 0), "5000T");
    }

    #[test]
    fn format_promotes_rounding_overflow() {
        assert_eq!(format(999_999.0, 2), "1.00M");
        assert_eq!(format(999.999, 2), "1.00K");
        assert_eq!(format(999.4, 0), "999");
    }

    #[test]
    fn format_non_finite() {
        assert_eq!(format(f64::NAN, 2), "NaN");
        assert_eq!(format(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn format_default_uses_two_decimals() {
        assert_eq!(format_default(12_300_000_000.0), "12.30B");
    }

    #[test]
    fn round_trip_across_tiers() {
        for v in [500.0, 45_000.0, 2_300_000_000.0, -7_100_000.0, 3.3e12] {
            let back = parse(&format_default(v)).unwrap();
            assert!((back - v).abs() / v.abs().max(1.0) < 1e-2, "{} -> {}", v, back);
        }
    }
}

//! Amount matching, parsing and formatting in Italian locale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::patterns::{AMOUNT_PATTERN, NUMERIC_PREFIX, TRAILING_DECIMALS};
use super::{ExtractionMatch, FieldExtractor};

/// How the separators of a matched numeral are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Every `.` is a thousands separator and `,` is the decimal point.
    /// `"12.50"` reads as 1250.
    #[default]
    Italian,
    /// A final separator followed by exactly two digits is the decimal
    /// point, every other separator groups thousands.
    Positional,
}

impl Normalization {
    /// Parse a matched numeral with this rule.
    pub fn parse(self, numeral: &str) -> Option<Decimal> {
        match self {
            Normalization::Italian => parse_italian_amount(numeral),
            Normalization::Positional => parse_positional_amount(numeral),
        }
    }
}

/// Finds the first amount-shaped numeral in a cell.
///
/// The match is unanchored: `"Importo € 1.500,00 concesso"` yields
/// `"1.500,00"`.
pub struct AmountMatcher;

impl AmountMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountMatcher {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = AMOUNT_PATTERN.captures(text)?;
        let numeral = caps.get(1)?;
        Some(
            ExtractionMatch::new(numeral.as_str().to_string(), &caps[0])
                .with_position(numeral.start(), numeral.end()),
        )
    }
}

/// Parse an Italian-formatted numeral (e.g. "1.234,56").
///
/// All dots are dropped, then the first comma becomes the decimal point.
/// Only the longest leading decimal of what remains is read, so a second
/// comma ends the number: "12,345,678" reads as 12.345. `None` when there is
/// no leading digit or the value does not fit a `Decimal`.
pub fn parse_italian_amount(s: &str) -> Option<Decimal> {
    let normalized = s.replace('.', "").replacen(',', ".", 1);
    let prefix = NUMERIC_PREFIX.find(&normalized)?;
    Decimal::from_str(prefix.as_str()).ok()
}

/// Parse a numeral reading a trailing two-digit group as decimals, whatever
/// the separator ("12.50" and "12,50" are both 12.50).
pub fn parse_positional_amount(s: &str) -> Option<Decimal> {
    let (integer_part, decimal_part) = match TRAILING_DECIMALS.captures(s) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).to_string(),
            Some(caps[2].to_string()),
        ),
        None => (s.to_string(), None),
    };

    let integer_part: String = integer_part.chars().filter(|c| *c != '.' && *c != ',').collect();
    if integer_part.is_empty() {
        return None;
    }

    let normalized = match decimal_part {
        Some(decimals) => format!("{}.{}", integer_part, decimals),
        None => integer_part,
    };

    Decimal::from_str(&normalized).ok()
}

/// Format amount in Italian style (1.234,56).
pub fn format_italian_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let s = format!("{:.2}", rounded.abs());
    let Some((integer_part, decimal_part)) = s.split_once('.') else {
        return s;
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    if rounded.is_sign_negative() && !rounded.is_zero() {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_italian_amount() {
        assert_eq!(parse_italian_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_italian_amount("45,00"), Some(dec("45.00")));
        assert_eq!(parse_italian_amount("12.345.678,90"), Some(dec("12345678.90")));
        assert_eq!(parse_italian_amount("1.500"), Some(dec("1500")));
    }

    #[test]
    fn test_parse_italian_amount_dot_decimal_is_thousands() {
        // Dots are always grouping in Italian notation
        assert_eq!(parse_italian_amount("12.50"), Some(dec("1250")));
    }

    #[test]
    fn test_parse_italian_amount_stops_at_second_comma() {
        assert_eq!(parse_italian_amount("12,345,678"), Some(dec("12.345")));
        assert_eq!(parse_italian_amount("1,234,567"), Some(dec("1.234")));
    }

    #[test]
    fn test_parse_italian_amount_needs_leading_digit() {
        assert_eq!(parse_italian_amount(",50"), None);
        assert_eq!(parse_italian_amount(""), None);
    }

    #[test]
    fn test_parse_italian_amount_too_large() {
        assert_eq!(parse_italian_amount("100.000.000.000.000.000.000.000.000.000.000"), None);
    }

    #[test]
    fn test_parse_positional_amount() {
        assert_eq!(parse_positional_amount("12.50"), Some(dec("12.50")));
        assert_eq!(parse_positional_amount("12,50"), Some(dec("12.50")));
        assert_eq!(parse_positional_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_positional_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_positional_amount("1.234"), Some(dec("1234")));
        assert_eq!(parse_positional_amount("150"), Some(dec("150")));
    }

    #[test]
    fn test_normalization_dispatch() {
        assert_eq!(Normalization::Italian.parse("12.50"), Some(dec("1250")));
        assert_eq!(Normalization::Positional.parse("12.50"), Some(dec("12.50")));
    }

    #[test]
    fn test_format_italian_amount() {
        assert_eq!(format_italian_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_italian_amount(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_italian_amount(dec("9505.95")), "9.505,95");
        assert_eq!(format_italian_amount(dec("45")), "45,00");
        assert_eq!(format_italian_amount(Decimal::ZERO), "0,00");
        assert_eq!(format_italian_amount(dec("-1500.5")), "-1.500,50");
    }

    #[test]
    fn test_matcher_takes_first_numeral() {
        let matcher = AmountMatcher::new();

        let m = matcher.extract("€1.234,56").unwrap();
        assert_eq!(m.value, "1.234,56");

        let m = matcher.extract("Importo 2.000,00 € e 3.000,00 €").unwrap();
        assert_eq!(m.value, "2.000,00");
        assert_eq!(m.position, Some((8, 16)));

        assert!(matcher.extract("Regime de minimis").is_none());
    }
}

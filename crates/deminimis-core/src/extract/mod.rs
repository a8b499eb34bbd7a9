//! Amount extraction over a sequence of scraped table cells.

mod rows;

pub use rows::{
    AmountColumn, ColumnLayout, RowExtractor, RowScan, WindowPolicy, DEFAULT_MIN_ROW_CELLS,
    DEFAULT_STOP_AFTER_OLD_ROWS, DEFAULT_WINDOW_YEARS,
};

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::models::amounts::{ExtractionResult, MatchedAmount};
use crate::models::config::ExtractionConfig;
use crate::rules::amounts::{AmountMatcher, Normalization};
use crate::rules::labels::ExclusionFilter;
use crate::rules::FieldExtractor;

/// Amounts not greater than this are treated as quantities or ordinals.
pub const DEFAULT_MIN_THRESHOLD: Decimal = Decimal::TEN;

/// Why a fragment did not become a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection<'a> {
    /// Contains a disqualifying label.
    Label(&'a str),
    /// No amount-shaped numeral.
    NoAmount,
    /// The numeral did not parse as a decimal.
    Unparsable,
    /// Parsed value not above the threshold.
    BelowThreshold(Decimal),
    /// Adding the value would overflow the running total.
    Overflow,
}

/// Sums Italian-formatted amounts found in table cells.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    min_threshold: Decimal,
    exclusions: ExclusionFilter,
    normalization: Normalization,
}

impl AmountExtractor {
    /// Create an extractor with the default threshold and labels.
    pub fn new() -> Self {
        Self {
            min_threshold: DEFAULT_MIN_THRESHOLD,
            exclusions: ExclusionFilter::default(),
            normalization: Normalization::default(),
        }
    }

    /// Build an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_threshold: config.min_threshold,
            exclusions: ExclusionFilter::new(&config.exclusion_labels),
            normalization: config.normalization,
        }
    }

    /// Set the minimum threshold (exclusive).
    pub fn with_min_threshold(mut self, min_threshold: Decimal) -> Self {
        self.min_threshold = min_threshold;
        self
    }

    /// Replace the exclusion labels.
    pub fn with_exclusions(mut self, exclusions: ExclusionFilter) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Set the numeral normalization rule.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn min_threshold(&self) -> Decimal {
        self.min_threshold
    }

    /// Decide on a single fragment.
    ///
    /// The label check runs before the amount pattern, so a labelled cell
    /// is rejected even when it also holds a well-formed amount.
    pub fn evaluate<'a>(&'a self, fragment: &str) -> Result<MatchedAmount, Rejection<'a>> {
        let text = fragment.trim();

        if let Some(label) = self.exclusions.matching_label(text) {
            return Err(Rejection::Label(label));
        }

        let numeral = AmountMatcher::new()
            .extract(text)
            .ok_or(Rejection::NoAmount)?;

        let value = self
            .normalization
            .parse(&numeral.value)
            .ok_or(Rejection::Unparsable)?;

        if value <= self.min_threshold {
            return Err(Rejection::BelowThreshold(value));
        }

        Ok(MatchedAmount::new(text, value))
    }

    /// Run one pass over `fragments`.
    pub fn extract<S: AsRef<str>>(&self, fragments: &[S]) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        for fragment in fragments {
            match self.evaluate(fragment.as_ref()) {
                Ok(matched) => accept(&mut result, matched),
                Err(reason) => {
                    trace!("Skipped {:?}: {:?}", fragment.as_ref().trim(), reason);
                }
            }
        }

        debug!(
            "Accepted {} of {} fragments, total {}",
            result.count(),
            fragments.len(),
            result.total()
        );

        result
    }
}

/// Add `matched` to `result`, skipping it when the total would overflow.
pub(crate) fn accept(result: &mut ExtractionResult, matched: MatchedAmount) {
    trace!("Accepted {:?} as {}", matched.original_text, matched.value);
    if let Err(rejected) = result.push(matched) {
        warn!("Skipped {:?}: {:?}", rejected.original_text, Rejection::Overflow);
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract amounts above `min_threshold` with the default labels and
/// Italian normalization.
pub fn extract<S: AsRef<str>>(fragments: &[S], min_threshold: Decimal) -> ExtractionResult {
    AmountExtractor::new()
        .with_min_threshold(min_threshold)
        .extract(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_italian_values() {
        let result = extract(&["1.234,56", "€45,00"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(
            result.matches(),
            &[
                MatchedAmount::new("1.234,56", dec("1234.56")),
                MatchedAmount::new("€45,00", dec("45.00")),
            ]
        );
        assert_eq!(result.total(), dec("1279.56"));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let result = extract(&["€9,50", "10,00", "10,01"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(result.count(), 1);
        assert_eq!(result.matches()[0].value, dec("10.01"));
    }

    #[test]
    fn test_labelled_cells_excluded() {
        let cells = [
            "Partita IVA 03254550738",
            "Codice CAR 1.234,56",
            "Data concessione 12.03.2023",
            "DATA 15.000,00",
        ];
        let result = extract(&cells, DEFAULT_MIN_THRESHOLD);
        assert!(result.is_empty());
        assert_eq!(result.total(), Decimal::ZERO);
    }

    #[test]
    fn test_fragments_are_trimmed() {
        let result = extract(&["   € 2.500,00 \n"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(result.matches()[0].original_text, "€ 2.500,00");
        assert_eq!(result.total(), dec("2500"));
    }

    #[test]
    fn test_first_match_only() {
        let result = extract(&["1.000,00 € + 2.000,00 €"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(result.total(), dec("1000"));
    }

    #[test]
    fn test_order_preserved_and_total_consistent() {
        let cells = ["300,00", "Regime", "€ 100,00", "5", "200,00 €"];
        let result = extract(&cells, DEFAULT_MIN_THRESHOLD);
        let texts: Vec<&str> = result.matches().iter().map(|m| m.original_text.as_str()).collect();
        assert_eq!(texts, vec!["300,00", "€ 100,00", "200,00 €"]);

        let sum: Decimal = result.matches().iter().map(|m| m.value).sum();
        assert_eq!(result.total(), sum);
    }

    #[test]
    fn test_idempotent() {
        let cells = ["€ 4.752,97", "€ 4.752,98", "Codice 99", "abc"];
        assert_eq!(
            extract(&cells, DEFAULT_MIN_THRESHOLD),
            extract(&cells, DEFAULT_MIN_THRESHOLD)
        );
    }

    #[test]
    fn test_dot_decimal_reads_as_thousands() {
        let result = extract(&["12.50"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(result.total(), dec("1250"));

        let positional = AmountExtractor::new()
            .with_normalization(Normalization::Positional)
            .extract(&["12.50"]);
        assert_eq!(positional.total(), dec("12.50"));
    }

    #[test]
    fn test_evaluate_reports_reason() {
        let extractor = AmountExtractor::new();
        assert_eq!(extractor.evaluate("codice 1.000,00"), Err(Rejection::Label("codice")));
        assert_eq!(extractor.evaluate("n/a"), Err(Rejection::NoAmount));
        assert_eq!(
            extractor.evaluate("1,234,567"),
            Err(Rejection::BelowThreshold(dec("1.234")))
        );
        assert_eq!(
            extractor.evaluate("€9,50"),
            Err(Rejection::BelowThreshold(dec("9.50")))
        );
    }

    #[test]
    fn test_from_config() {
        let config = ExtractionConfig {
            min_threshold: dec("1000"),
            exclusion_labels: vec!["cup".to_string()],
            normalization: Normalization::Italian,
        };
        let result = AmountExtractor::from_config(&config)
            .extract(&["CUP 5.000,00", "Data 2.000,00", "999,00"]);
        assert_eq!(result.count(), 1);
        assert_eq!(result.total(), dec("2000"));
    }

    #[test]
    fn test_second_comma_keeps_leading_number() {
        let result = extract(&["12,345,678"], DEFAULT_MIN_THRESHOLD);
        assert_eq!(result.matches(), &[MatchedAmount::new("12,345,678", dec("12.345"))]);
    }

    #[test]
    fn test_overflowing_total_skips_fragment() {
        let cell = "€ 50.000.000.000.000.000.000.000.000.000,00";
        let result = extract(&[cell, cell, "€ 100"], DEFAULT_MIN_THRESHOLD);

        assert_eq!(result.count(), 2);
        assert_eq!(result.total(), dec("50000000000000000000000000100"));
        let sum: Decimal = result.matches().iter().map(|m| m.value).sum();
        assert_eq!(result.total(), sum);
    }
}

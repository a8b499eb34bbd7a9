//! Amount models produced by a single extraction pass.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A table cell accepted as a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedAmount {
    /// Trimmed text of the cell as it was scraped.
    pub original_text: String,

    /// Parsed amount in euro.
    pub value: Decimal,

    /// Concession date of the row the amount came from (row scans only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concession_date: Option<NaiveDate>,
}

impl MatchedAmount {
    pub fn new(original_text: impl Into<String>, value: Decimal) -> Self {
        Self {
            original_text: original_text.into(),
            value,
            concession_date: None,
        }
    }

    pub fn with_concession_date(mut self, date: NaiveDate) -> Self {
        self.concession_date = Some(date);
        self
    }
}

/// Outcome of one extraction pass over a fragment sequence.
///
/// `total` is always the sum of every match value. Both fields are private;
/// the result only grows through [`ExtractionResult::push`], and a
/// deserialized result is rebuilt from its matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExtractionResult")]
pub struct ExtractionResult {
    total: Decimal,
    matches: Vec<MatchedAmount>,
}

#[derive(Deserialize)]
struct RawExtractionResult {
    total: Decimal,
    matches: Vec<MatchedAmount>,
}

impl TryFrom<RawExtractionResult> for ExtractionResult {
    type Error = String;

    fn try_from(raw: RawExtractionResult) -> Result<Self, Self::Error> {
        let mut result = ExtractionResult::new();
        for matched in raw.matches {
            result
                .push(matched)
                .map_err(|m| format!("total overflows at {:?}", m.original_text))?;
        }
        if result.total != raw.total {
            return Err(format!(
                "total {} does not match the sum of matches {}",
                raw.total, result.total
            ));
        }
        Ok(result)
    }
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted amount.
    ///
    /// If adding the value would overflow the total, the result is left
    /// untouched and the amount is handed back.
    pub fn push(&mut self, matched: MatchedAmount) -> Result<(), MatchedAmount> {
        match self.total.checked_add(matched.value) {
            Some(total) => {
                self.total = total;
                self.matches.push(matched);
                Ok(())
            }
            None => Err(matched),
        }
    }

    /// Sum of all accepted amounts.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Accepted amounts in encounter order.
    pub fn matches(&self) -> &[MatchedAmount] {
        &self.matches
    }

    /// Number of accepted amounts.
    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
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
    fn test_push_keeps_total_in_sync() {
        let mut result = ExtractionResult::new();
        result.push(MatchedAmount::new("€ 1.234,56", dec("1234.56"))).unwrap();
        result.push(MatchedAmount::new("45,00 €", dec("45.00"))).unwrap();

        let sum: Decimal = result.matches().iter().map(|m| m.value).sum();
        assert_eq!(result.total(), sum);
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn test_push_overflow_leaves_result_unchanged() {
        let huge = dec("50000000000000000000000000000");
        let mut result = ExtractionResult::new();
        result.push(MatchedAmount::new("first", huge)).unwrap();

        let rejected = result.push(MatchedAmount::new("second", huge)).unwrap_err();
        assert_eq!(rejected.original_text, "second");
        assert_eq!(result.count(), 1);
        assert_eq!(result.total(), huge);
    }

    #[test]
    fn test_empty_result() {
        let result = ExtractionResult::new();
        assert!(result.is_empty());
        assert_eq!(result.total(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_rebuilds_total() {
        let json = r#"{"total": "150.00", "matches": [
            {"original_text": "€ 100,00", "value": "100.00"},
            {"original_text": "€ 50,00", "value": "50.00"}
        ]}"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.total(), dec("150.00"));
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_total() {
        let json = r#"{"total": "999", "matches": [
            {"original_text": "€ 100,00", "value": "100.00"}
        ]}"#;
        assert!(serde_json::from_str::<ExtractionResult>(json).is_err());
    }

    #[test]
    fn test_concession_date_serialized_only_when_present() {
        let plain = serde_json::to_value(MatchedAmount::new("€ 20,00", dec("20"))).unwrap();
        assert!(plain.get("concession_date").is_none());

        let dated = MatchedAmount::new("€ 20,00", dec("20"))
            .with_concession_date(NaiveDate::from_ymd_opt(2023, 5, 2).unwrap());
        let json = serde_json::to_value(dated).unwrap();
        assert_eq!(json["concession_date"], "2023-05-02");
    }
}

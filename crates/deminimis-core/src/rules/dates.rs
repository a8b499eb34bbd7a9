//! Concession date parsing for RNA result rows.

use chrono::NaiveDate;

use super::patterns::CONCESSION_DATE;
use super::{ExtractionMatch, FieldExtractor};

/// Reads a cell holding exactly one `DD/MM/YYYY` date.
pub struct ConcessionDateMatcher;

impl ConcessionDateMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConcessionDateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ConcessionDateMatcher {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let text = text.trim();
        let caps = CONCESSION_DATE.captures(text)?;

        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(|date| ExtractionMatch::new(date, text).with_position(0, text.len()))
    }
}

/// Parse a concession date cell.
pub fn parse_concession_date(text: &str) -> Option<NaiveDate> {
    ConcessionDateMatcher::new().extract(text).map(|m| m.value)
}

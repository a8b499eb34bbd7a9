//! Report models: ceiling assessment and the full scan report.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amounts::ExtractionResult;

/// Position of a total relative to the De Minimis ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeilingStatus {
    /// No aid found.
    NoAid,
    /// Comfortably under the ceiling.
    Ok,
    /// Above the warning percentage but not over the ceiling.
    Warning,
    /// Ceiling exceeded.
    Exceeded,
}

impl CeilingStatus {
    /// Short machine-friendly name, as used in CSV summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            CeilingStatus::NoAid => "no_aid",
            CeilingStatus::Ok => "ok",
            CeilingStatus::Warning => "warning",
            CeilingStatus::Exceeded => "exceeded",
        }
    }
}

impl std::fmt::Display for CeilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A total measured against the ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeilingAssessment {
    pub total: Decimal,
    pub limit: Decimal,
    /// Share of the ceiling used, in percent, one decimal place.
    pub percent_used: Decimal,
    /// What is left before the ceiling, never negative.
    pub remaining: Decimal,
    pub status: CeilingStatus,
}

impl CeilingAssessment {
    /// Amount over the ceiling, if any.
    pub fn excess(&self) -> Option<Decimal> {
        (self.total > self.limit).then(|| self.total.saturating_sub(self.limit))
    }
}

/// How a row scan applied the concession date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowReport {
    /// Oldest concession date still counted.
    pub from: NaiveDate,

    /// Date the window was measured back from.
    pub as_of: NaiveDate,

    /// Data rows examined, header excluded.
    pub rows_read: usize,

    /// Dated rows dropped for being older than `from`.
    pub rows_outside: usize,

    /// Reading stopped on a run of old rows before the table ended.
    pub stopped_early: bool,
}

impl WindowReport {
    pub fn new(from: NaiveDate, as_of: NaiveDate) -> Self {
        Self {
            from,
            as_of,
            rows_read: 0,
            rows_outside: 0,
            stopped_early: false,
        }
    }

    /// Whether aid granted on `date` counts toward the total.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from
    }
}

/// Everything one scan produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Identifier the total refers to, when one was supplied or detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Extracted amounts and their total.
    pub result: ExtractionResult,

    /// Summary line copied to the clipboard.
    pub summary: String,

    /// Ceiling assessment of the total.
    pub ceiling: CeilingAssessment,

    /// Date window, for row scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowReport>,
}

impl ScanReport {
    /// The numeric total returned to the caller.
    pub fn total(&self) -> Decimal {
        self.result.total()
    }
}

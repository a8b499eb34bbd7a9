//! Configuration structures for the scanner.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::amounts::Normalization;
use crate::rules::labels::DEFAULT_EXCLUSION_LABELS;

/// Main configuration for a De Minimis scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeminimisConfig {
    /// Amount extraction configuration.
    pub extraction: ExtractionConfig,

    /// Summary/report configuration.
    pub report: ReportConfig,

    /// De Minimis ceiling configuration.
    pub ceiling: CeilingConfig,

    /// Concession date window for row scans.
    pub window: WindowConfig,
}

/// Amount extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Amounts not greater than this are discarded.
    pub min_threshold: Decimal,

    /// Case-insensitive labels that disqualify a cell.
    pub exclusion_labels: Vec<String>,

    /// How separators in a matched numeral are interpreted.
    pub normalization: Normalization,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_threshold: Decimal::TEN,
            exclusion_labels: DEFAULT_EXCLUSION_LABELS
                .iter()
                .map(|l| (*l).to_string())
                .collect(),
            normalization: Normalization::default(),
        }
    }
}

/// Summary line configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Label printed before the identifier (e.g. "P.IVA").
    pub id_label: String,

    /// Fixed identifier; when absent it is detected from the fragments.
    pub identifier: Option<String>,

    /// Reject identifiers with a bad P.IVA check digit.
    pub validate_identifier: bool,

    /// Look for a P.IVA among the fragments when none is configured.
    pub detect_identifier: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            id_label: "P.IVA".to_string(),
            identifier: None,
            validate_identifier: true,
            detect_identifier: true,
        }
    }
}

/// De Minimis ceiling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CeilingConfig {
    /// Maximum aid over the rolling three-year window, in euro.
    pub limit: Decimal,

    /// Usage percentage above which the status becomes a warning.
    pub warning_percent: Decimal,
}

impl Default for CeilingConfig {
    fn default() -> Self {
        Self {
            limit: Decimal::from(300_000),
            warning_percent: Decimal::from(80),
        }
    }
}

/// Concession date window for row scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Scan rows and keep only aid granted inside the window.
    pub enabled: bool,

    /// Window length in years, counted back from the scan date.
    pub years: u32,

    /// Stop reading after this many consecutive rows older than the window
    /// (0 reads every row).
    pub stop_after_old_rows: usize,

    /// Rows with fewer cells are not aid rows.
    pub min_row_cells: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            years: 3,
            stop_after_old_rows: 3,
            min_row_cells: 7,
        }
    }
}

impl DeminimisConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DeminimisConfig::default();
        assert_eq!(config.extraction.min_threshold, Decimal::TEN);
        assert_eq!(config.extraction.exclusion_labels, vec!["partita", "codice", "data"]);
        assert_eq!(config.report.id_label, "P.IVA");
        assert_eq!(config.ceiling.limit, Decimal::from(300_000));
        assert!(!config.window.enabled);
        assert_eq!(config.window.years, 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DeminimisConfig =
            serde_json::from_str(r#"{"ceiling": {"limit": 200000}}"#).unwrap();
        assert_eq!(config.ceiling.limit, Decimal::from(200_000));
        assert_eq!(config.ceiling.warning_percent, Decimal::from(80));
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_normalization_is_lowercase_in_json() {
        let json = serde_json::to_value(DeminimisConfig::default()).unwrap();
        assert_eq!(json["extraction"]["normalization"], "italian");
    }
}

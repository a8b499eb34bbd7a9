//! Row-aware pass over an RNA results table.
//!
//! The first row is the header. It locates the "Data Concessione" and
//! "Elemento Aiuto" columns. Each data row contributes its aid amount only
//! when its concession date falls inside the window, and reading stops after
//! a run of consecutive rows older than the window, since RNA lists the most
//! recent concessions first.

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, trace};

use super::{accept, AmountExtractor};
use crate::models::amounts::ExtractionResult;
use crate::models::config::WindowConfig;
use crate::models::report::WindowReport;
use crate::rules::dates::parse_concession_date;

pub const DEFAULT_WINDOW_YEARS: u32 = 3;
pub const DEFAULT_STOP_AFTER_OLD_ROWS: usize = 3;
pub const DEFAULT_MIN_ROW_CELLS: usize = 7;

/// Date column when the header does not name one (seventh column on RNA).
const FALLBACK_DATE_COLUMN: usize = 6;

/// Where the aid amount sits in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumn {
    Index(usize),
    Last,
}

/// Column positions of the fields a row scan reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub amount: AmountColumn,
}

impl ColumnLayout {
    /// Locate the columns from header cell texts, falling back to the RNA
    /// layout (date in the seventh column, amount in the last).
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let mut layout = Self::default();
        let mut date_found = false;
        let mut amount_found = false;

        for (i, cell) in header.iter().enumerate() {
            let text = cell.as_ref().trim().to_lowercase();
            if !date_found && text.contains("data") && text.contains("concessione") {
                layout.date = i;
                date_found = true;
            } else if !amount_found && text.contains("elemento") && text.contains("aiuto") {
                layout.amount = AmountColumn::Index(i);
                amount_found = true;
            }
        }

        layout
    }

    fn date_cell<'r>(&self, row: &'r [String]) -> Option<&'r str> {
        row.get(self.date).map(String::as_str)
    }

    fn amount_cell<'r>(&self, row: &'r [String]) -> Option<&'r str> {
        match self.amount {
            AmountColumn::Index(i) => row.get(i),
            AmountColumn::Last => row.last(),
        }
        .map(String::as_str)
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: FALLBACK_DATE_COLUMN,
            amount: AmountColumn::Last,
        }
    }
}

/// Length of the concession window and when to stop reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub years: u32,
    /// Fixed scan date; today when absent.
    pub as_of: Option<NaiveDate>,
    pub stop_after_old_rows: usize,
    pub min_row_cells: usize,
}

impl WindowPolicy {
    pub fn new(years: u32) -> Self {
        Self {
            years,
            ..Self::default()
        }
    }

    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_stop_after_old_rows(mut self, rows: usize) -> Self {
        self.stop_after_old_rows = rows;
        self
    }

    pub fn with_min_row_cells(mut self, cells: usize) -> Self {
        self.min_row_cells = cells;
        self
    }

    /// Scan date: the fixed one, else today's local date.
    pub fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Oldest concession date counted when scanning on `as_of`.
    ///
    /// A year is 365 days; the window saturates at the earliest
    /// representable date.
    pub fn window_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of
            .checked_sub_days(Days::new(365 * u64::from(self.years)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            years: DEFAULT_WINDOW_YEARS,
            as_of: None,
            stop_after_old_rows: DEFAULT_STOP_AFTER_OLD_ROWS,
            min_row_cells: DEFAULT_MIN_ROW_CELLS,
        }
    }
}

impl From<&WindowConfig> for WindowPolicy {
    fn from(config: &WindowConfig) -> Self {
        Self {
            years: config.years,
            as_of: None,
            stop_after_old_rows: config.stop_after_old_rows,
            min_row_cells: config.min_row_cells,
        }
    }
}

/// Amounts found by a row scan and how the window was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowScan {
    pub result: ExtractionResult,
    pub window: WindowReport,
}

/// Sums the aid column of rows granted inside a date window.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    amounts: AmountExtractor,
    policy: WindowPolicy,
}

impl RowExtractor {
    /// Amount cells are judged by `amounts` (labels, pattern, threshold).
    pub fn new(amounts: AmountExtractor, policy: WindowPolicy) -> Self {
        Self { amounts, policy }
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Scan `rows` (header first) as of the policy's scan date.
    pub fn extract(&self, rows: &[Vec<String>]) -> RowScan {
        self.extract_as_of(rows, self.policy.as_of())
    }

    /// Scan `rows` (header first) as of `as_of`.
    pub fn extract_as_of(&self, rows: &[Vec<String>], as_of: NaiveDate) -> RowScan {
        let mut result = ExtractionResult::new();
        let mut window = WindowReport::new(self.policy.window_start(as_of), as_of);

        let Some((header, data)) = rows.split_first() else {
            return RowScan { result, window };
        };

        let layout = ColumnLayout::from_header(header);
        debug!("Row layout {:?}, counting aid from {}", layout, window.from);

        let mut consecutive_old = 0;

        for row in data {
            window.rows_read += 1;

            if row.len() < self.policy.min_row_cells {
                trace!("Skipped row with {} cells", row.len());
                continue;
            }

            let Some(date) = layout.date_cell(row).and_then(parse_concession_date) else {
                trace!("Skipped row without concession date");
                continue;
            };

            if !window.contains(date) {
                window.rows_outside += 1;
                consecutive_old += 1;
                trace!("Skipped aid granted {} before {}", date, window.from);

                if self.policy.stop_after_old_rows > 0
                    && consecutive_old >= self.policy.stop_after_old_rows
                {
                    debug!("{} consecutive rows before {}, stopping", consecutive_old, window.from);
                    window.stopped_early = true;
                    break;
                }
                continue;
            }
            consecutive_old = 0;

            let Some(cell) = layout.amount_cell(row) else {
                continue;
            };

            match self.amounts.evaluate(cell) {
                Ok(matched) => accept(&mut result, matched.with_concession_date(date)),
                Err(reason) => trace!("Skipped amount {:?}: {:?}", cell.trim(), reason),
            }
        }

        debug!(
            "Accepted {} of {} rows, total {}",
            result.count(),
            window.rows_read,
            result.total()
        );

        RowScan { result, window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const HEADER: [&str; 8] = [
        "Codice CAR",
        "Codice COR",
        "Titolo misura",
        "Tipo procedimento",
        "Autorità concedente",
        "Regolamento",
        "Data Concessione",
        "Elemento Aiuto",
    ];

    fn row(granted: &str, amount: &str) -> Vec<String> {
        let mut cells: Vec<String> = ["1234", "5678", "Misura", "Automatico", "Regione", "De Minimis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        cells.push(granted.to_string());
        cells.push(amount.to_string());
        cells
    }

    fn table(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
        let mut table = vec![HEADER.iter().map(|s| s.to_string()).collect()];
        table.extend(rows);
        table
    }

    fn extractor() -> RowExtractor {
        RowExtractor::new(AmountExtractor::new(), WindowPolicy::default())
    }

    #[test]
    fn test_layout_from_header() {
        let layout = ColumnLayout::from_header(&HEADER);
        assert_eq!(layout.date, 6);
        assert_eq!(layout.amount, AmountColumn::Index(7));

        let layout = ColumnLayout::from_header(&["A", "B"]);
        assert_eq!(layout, ColumnLayout::default());
    }

    #[test]
    fn test_window_start_counts_365_day_years() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.window_start(date(2025, 6, 30)), date(2022, 7, 1));
    }

    #[test]
    fn test_only_rows_inside_window_count() {
        let rows = table(vec![
            row("15/05/2025", "€ 10.000,00"),
            row("01/07/2022", "€ 5.000,00"),
            row("30/06/2022", "€ 7.000,00"),
            row("10/01/2024", "€ 2.500,50"),
        ]);

        let scan = extractor().extract_as_of(&rows, date(2025, 6, 30));

        assert_eq!(scan.result.total(), dec("17500.50"));
        assert_eq!(scan.result.count(), 3);
        assert_eq!(scan.result.matches()[0].concession_date, Some(date(2025, 5, 15)));
        assert_eq!(scan.window.from, date(2022, 7, 1));
        assert_eq!(scan.window.rows_read, 4);
        assert_eq!(scan.window.rows_outside, 1);
        assert!(!scan.window.stopped_early);
    }

    #[test]
    fn test_stops_after_consecutive_old_rows() {
        let rows = table(vec![
            row("15/05/2025", "€ 1.000,00"),
            row("01/01/2020", "€ 1.000,00"),
            row("01/01/2019", "€ 1.000,00"),
            row("01/01/2018", "€ 1.000,00"),
            row("01/01/2025", "€ 9.999,00"),
        ]);

        let scan = extractor().extract_as_of(&rows, date(2025, 6, 30));

        assert_eq!(scan.result.total(), dec("1000.00"));
        assert!(scan.window.stopped_early);
        assert_eq!(scan.window.rows_read, 4);
        assert_eq!(scan.window.rows_outside, 3);
    }

    #[test]
    fn test_recent_row_resets_old_run() {
        let rows = table(vec![
            row("01/01/2020", "€ 1.000,00"),
            row("01/01/2019", "€ 1.000,00"),
            row("01/01/2025", "€ 500,00"),
            row("01/01/2018", "€ 1.000,00"),
            row("01/02/2025", "€ 300,00"),
        ]);

        let scan = extractor().extract_as_of(&rows, date(2025, 6, 30));

        assert_eq!(scan.result.total(), dec("800.00"));
        assert!(!scan.window.stopped_early);
    }

    #[test]
    fn test_zero_stop_reads_every_row() {
        let policy = WindowPolicy::default().with_stop_after_old_rows(0);
        let rows = table(vec![
            row("01/01/2020", "€ 1.000,00"),
            row("01/01/2019", "€ 1.000,00"),
            row("01/01/2018", "€ 1.000,00"),
            row("01/01/2025", "€ 400,00"),
        ]);

        let scan = RowExtractor::new(AmountExtractor::new(), policy)
            .extract_as_of(&rows, date(2025, 6, 30));

        assert_eq!(scan.result.total(), dec("400.00"));
        assert_eq!(scan.window.rows_outside, 3);
    }

    #[test]
    fn test_short_and_undated_rows_skipped() {
        let rows = table(vec![
            vec!["Totale".to_string(), "€ 99.999,00".to_string()],
            row("", "€ 1.000,00"),
            row("non disponibile", "€ 1.000,00"),
            row("02/02/2025", "€ 250,00"),
        ]);

        let scan = extractor().extract_as_of(&rows, date(2025, 6, 30));

        assert_eq!(scan.result.total(), dec("250.00"));
        assert_eq!(scan.window.rows_read, 4);
        assert_eq!(scan.window.rows_outside, 0);
    }

    #[test]
    fn test_fallback_layout_uses_last_cell() {
        let mut rows = vec![vec!["col".to_string(); 8]];
        rows.push(row("02/02/2025", "€ 250,00"));

        let scan = extractor().extract_as_of(&rows, date(2025, 6, 30));
        assert_eq!(scan.result.total(), dec("250.00"));
    }

    #[test]
    fn test_empty_table() {
        let scan = extractor().extract_as_of(&[], date(2025, 6, 30));
        assert!(scan.result.is_empty());
        assert_eq!(scan.window.rows_read, 0);
    }
}

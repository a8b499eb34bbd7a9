//! WASM bindings for De Minimis totals.
//!
//! Load the module on an RNA results page and call `scan_document()`: every
//! `td`/`th` cell is scanned, matches are logged to the console, and the
//! summary line is copied to the clipboard. With a window length, the page
//! is read row by row and only aid granted inside the window is counted.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use deminimis_core::error::SinkError;
use deminimis_core::report::{assess_ceiling, CeilingPolicy};
use deminimis_core::rules::format_italian_amount;
use deminimis_core::sink::match_line;
use deminimis_core::{
    AmountExtractor, ExtractionResult, MatchedAmount, ReportSink, RowExtractor, ScanReport,
    Scanner, WindowPolicy,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchJs {
    original_text: String,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    concession_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultJs {
    total: f64,
    count: usize,
    matches: Vec<MatchJs>,
}

impl From<&ExtractionResult> for ResultJs {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            total: to_f64(result.total()),
            count: result.count(),
            matches: result
                .matches()
                .iter()
                .map(|m| MatchJs {
                    original_text: m.original_text.clone(),
                    value: to_f64(m.value),
                    concession_date: m.concession_date.map(|d| d.to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RowResultJs {
    total: f64,
    count: usize,
    matches: Vec<MatchJs>,
    window_from: String,
    rows_read: usize,
    rows_outside: usize,
    stopped_early: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CeilingJs {
    total: f64,
    limit: f64,
    percent_used: f64,
    remaining: f64,
    status: String,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn to_decimal(value: f64, what: &str) -> Result<Decimal, JsValue> {
    Decimal::from_f64(value).ok_or_else(|| JsValue::from_str(&format!("invalid {}: {}", what, value)))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn cells_from_js(cells: JsValue) -> Result<Vec<String>, JsValue> {
    serde_wasm_bindgen::from_value(cells).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn extractor(threshold: Option<f64>) -> Result<AmountExtractor, JsValue> {
    let extractor = AmountExtractor::new();
    match threshold {
        Some(t) => Ok(extractor.with_min_threshold(to_decimal(t, "threshold")?)),
        None => Ok(extractor),
    }
}

/// Extract amounts from an array of cell texts.
///
/// Returns `{ total, count, matches: [{ originalText, value }] }`.
#[wasm_bindgen]
pub fn extract_amounts(cells: JsValue, threshold: Option<f64>) -> Result<JsValue, JsValue> {
    let cells = cells_from_js(cells)?;
    let result = extractor(threshold)?.extract(&cells);
    to_js(&ResultJs::from(&result))
}

/// Extract aid amounts from table rows (header first), keeping rows whose
/// concession date falls in the last `window_years` years before `as_of`
/// (`YYYY-MM-DD`, default today).
#[wasm_bindgen]
pub fn extract_rows(
    rows: JsValue,
    window_years: Option<u32>,
    as_of: Option<String>,
) -> Result<JsValue, JsValue> {
    let rows: Vec<Vec<String>> =
        serde_wasm_bindgen::from_value(rows).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let as_of = as_of
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| JsValue::from_str(&format!("invalid date: {}", e)))?;

    let policy = WindowPolicy::new(window_years.unwrap_or(deminimis_core::extract::DEFAULT_WINDOW_YEARS))
        .with_as_of(as_of);
    let scan = RowExtractor::new(AmountExtractor::new(), policy).extract(&rows);

    let ResultJs { total, count, matches } = ResultJs::from(&scan.result);
    to_js(&RowResultJs {
        total,
        count,
        matches,
        window_from: scan.window.from.to_string(),
        rows_read: scan.window.rows_read,
        rows_outside: scan.window.rows_outside,
        stopped_early: scan.window.stopped_early,
    })
}

/// Build the summary line for an array of cell texts.
#[wasm_bindgen]
pub fn summary_line(cells: JsValue, piva: Option<String>) -> Result<String, JsValue> {
    let cells = cells_from_js(cells)?;
    let report = Scanner::new()
        .with_identifier(piva)
        .scan(&cells)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(report.summary)
}

/// Validate a P.IVA (Italian VAT number).
#[wasm_bindgen]
pub fn validate_partita_iva(piva: &str) -> bool {
    deminimis_core::validate_partita_iva(piva)
}

/// Format amount in Italian style (1.234,56).
#[wasm_bindgen]
pub fn format_amount(amount: f64) -> Result<String, JsValue> {
    Ok(format_italian_amount(to_decimal(amount, "amount")?))
}

/// Measure a total against the De Minimis ceiling (default €300.000).
#[wasm_bindgen]
pub fn assess(total: f64, limit: Option<f64>) -> Result<JsValue, JsValue> {
    let policy = match limit {
        Some(limit) => CeilingPolicy::new(to_decimal(limit, "limit")?),
        None => CeilingPolicy::default(),
    };
    let assessment = assess_ceiling(to_decimal(total, "total")?, &policy);

    to_js(&CeilingJs {
        total: to_f64(assessment.total),
        limit: to_f64(assessment.limit),
        percent_used: to_f64(assessment.percent_used),
        remaining: to_f64(assessment.remaining),
        status: assessment.status.to_string(),
    })
}

/// Logs to the browser console and holds the summary line until the
/// clipboard promise can be awaited.
#[derive(Default)]
struct ConsoleSink {
    pending_copy: Option<String>,
}

impl ReportSink for ConsoleSink {
    fn record_match(&mut self, matched: &MatchedAmount) {
        web_sys::console::log_1(&JsValue::from_str(&match_line(matched)));
    }

    fn record_summary(&mut self, lines: &[String]) {
        for line in lines {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
    }

    fn copy_summary(&mut self, line: &str) -> Result<(), SinkError> {
        self.pending_copy = Some(line.to_string());
        Ok(())
    }
}

fn node_texts(nodes: &web_sys::NodeList) -> Vec<String> {
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .map(|node| node.text_content().unwrap_or_default())
        .collect()
}

/// Text of every `td`/`th` cell in document order.
fn document_cells(document: &web_sys::Document) -> Result<Vec<String>, JsValue> {
    Ok(node_texts(&document.query_selector_all("td, th")?))
}

/// Cell texts grouped by `tr`, in document order.
fn document_rows(document: &web_sys::Document) -> Result<Vec<Vec<String>>, JsValue> {
    let rows = document.query_selector_all("tr")?;
    let mut table = Vec::with_capacity(rows.length() as usize);
    for i in 0..rows.length() {
        let Some(node) = rows.item(i) else {
            continue;
        };
        let row: web_sys::Element = node.dyn_into()?;
        table.push(node_texts(&row.query_selector_all("td, th")?));
    }
    Ok(table)
}

async fn write_clipboard(window: &web_sys::Window, text: &str) -> Result<(), JsValue> {
    let promise = window.navigator().clipboard().write_text(text);
    JsFuture::from(promise).await?;
    Ok(())
}

/// Scan the current page and copy the summary to the clipboard.
///
/// With `window_years`, only rows granted in that many years are counted.
/// Resolves to the total; rejects when the clipboard write is refused.
#[wasm_bindgen]
pub async fn scan_document(piva: Option<String>, window_years: Option<u32>) -> Result<f64, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let scanner = Scanner::new()
        .with_identifier(piva)
        .with_window(window_years.map(WindowPolicy::new));

    let mut sink = ConsoleSink::default();
    let scanned = if window_years.is_some() {
        let rows = document_rows(&document)?;
        web_sys::console::log_1(&JsValue::from_str(&format!(
            "Scanning {} rows for De Minimis amounts",
            rows.len()
        )));
        scanner.run(&rows, &mut sink)
    } else {
        let cells = document_cells(&document)?;
        web_sys::console::log_1(&JsValue::from_str(&format!(
            "Scanning {} cells for De Minimis amounts",
            cells.len()
        )));
        scanner.run(&cells, &mut sink)
    };
    let report: ScanReport = scanned.map_err(|e| JsValue::from_str(&e.to_string()))?;

    if let Some(line) = sink.pending_copy.take() {
        write_clipboard(&window, &line).await?;
        web_sys::console::log_1(&JsValue::from_str("Risultato copiato negli appunti"));
    }

    Ok(to_f64(report.total()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_validate_partita_iva() {
        assert!(validate_partita_iva("03254550738"));
        assert!(!validate_partita_iva("03254550739"));
    }

    #[wasm_bindgen_test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.56).unwrap(), "1.234,56");
    }

    #[wasm_bindgen_test]
    fn test_summary_line() {
        let cells = to_js(&vec!["Partita IVA 03254550738", "€ 4.752,97", "€ 4.752,98"]).unwrap();
        assert_eq!(
            summary_line(cells, None).unwrap(),
            "P.IVA 03254550738 - Totale De Minimis: €9.505,95 (2 aiuti)"
        );
    }

    #[wasm_bindgen_test]
    fn test_extract_amounts_threshold() {
        let cells = to_js(&vec!["€ 50,00", "€ 500,00"]).unwrap();
        let result = extract_amounts(cells, Some(100.0)).unwrap();
        let count = js_sys::Reflect::get(&result, &JsValue::from_str("count")).unwrap();
        assert_eq!(count.as_f64(), Some(1.0));
    }

    #[wasm_bindgen_test]
    fn test_extract_rows_window() {
        let rows = to_js(&vec![
            vec!["A", "B", "C", "D", "E", "F", "Data Concessione", "Elemento Aiuto"],
            vec!["1", "x", "x", "x", "x", "x", "10/03/2025", "€ 4.752,97"],
            vec!["2", "x", "x", "x", "x", "x", "01/09/2020", "€ 80.000,00"],
        ])
        .unwrap();
        let result = extract_rows(rows, Some(3), Some("2025-06-30".to_string())).unwrap();

        let total = js_sys::Reflect::get(&result, &JsValue::from_str("total")).unwrap();
        assert_eq!(total.as_f64(), Some(4752.97));
        let outside = js_sys::Reflect::get(&result, &JsValue::from_str("rowsOutside")).unwrap();
        assert_eq!(outside.as_f64(), Some(1.0));
    }

    #[wasm_bindgen_test]
    fn test_navigator_exposes_clipboard() {
        let window = web_sys::window().unwrap();
        let clipboard: JsValue = window.navigator().clipboard().into();
        assert!(clipboard.is_object());
    }
}

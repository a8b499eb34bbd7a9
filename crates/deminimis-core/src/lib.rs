//! Core library for De Minimis aid totals.
//!
//! This crate provides:
//! - Italian-locale amount extraction from scraped table cells
//! - Row scans limited to a concession date window
//! - P.IVA (Italian VAT number) validation and detection
//! - Summary formatting and De Minimis ceiling assessment
//! - Fragment source / report sink seams and a single-pass scanner

pub mod error;
pub mod models;
pub mod rules;
pub mod extract;
pub mod report;
pub mod source;
pub mod sink;
pub mod scanner;

pub use error::{DeminimisError, Result};
pub use models::amounts::{ExtractionResult, MatchedAmount};
pub use models::config::DeminimisConfig;
pub use models::report::{CeilingAssessment, CeilingStatus, ScanReport, WindowReport};
pub use extract::{extract, AmountExtractor, RowExtractor, WindowPolicy, DEFAULT_MIN_THRESHOLD};
pub use rules::partita_iva::{parse_partita_iva, validate_partita_iva, PartitaIva};
pub use source::{FragmentSource, JsonSource, LineSource};
pub use sink::{MemorySink, ReportSink, TracingSink};
pub use scanner::Scanner;

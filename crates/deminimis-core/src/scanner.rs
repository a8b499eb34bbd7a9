//! One complete scan: fragments in, report out, sink fed along the way.

use tracing::{debug, info};

use crate::extract::{AmountExtractor, RowExtractor, WindowPolicy};
use crate::models::config::DeminimisConfig;
use crate::models::amounts::ExtractionResult;
use crate::models::report::{ScanReport, WindowReport};
use crate::report::{assess_ceiling, summary_block, summary_line, CeilingPolicy, SummaryLabel};
use crate::rules::partita_iva::{parse_partita_iva, PartitaIvaExtractor};
use crate::sink::ReportSink;
use crate::source::FragmentSource;
use crate::Result;

/// Runs an [`AmountExtractor`] pass and produces the De Minimis report.
#[derive(Debug, Clone)]
pub struct Scanner {
    extractor: AmountExtractor,
    id_label: String,
    identifier: Option<String>,
    validate_identifier: bool,
    detect_identifier: bool,
    ceiling: CeilingPolicy,
    window: Option<WindowPolicy>,
}

impl Scanner {
    /// Create a scanner with default settings.
    pub fn new() -> Self {
        Self::from_config(&DeminimisConfig::default())
    }

    /// Build a scanner from configuration.
    pub fn from_config(config: &DeminimisConfig) -> Self {
        Self {
            extractor: AmountExtractor::from_config(&config.extraction),
            id_label: config.report.id_label.clone(),
            identifier: config.report.identifier.clone(),
            validate_identifier: config.report.validate_identifier,
            detect_identifier: config.report.detect_identifier,
            ceiling: CeilingPolicy::from(&config.ceiling),
            window: config
                .window
                .enabled
                .then(|| WindowPolicy::from(&config.window)),
        }
    }

    /// Replace the amount extractor.
    pub fn with_extractor(mut self, extractor: AmountExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Report against a fixed identifier.
    pub fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }

    /// Set whether identifiers must carry a valid P.IVA check digit.
    pub fn with_identifier_validation(mut self, validate: bool) -> Self {
        self.validate_identifier = validate;
        self
    }

    /// Set the ceiling policy.
    pub fn with_ceiling(mut self, ceiling: CeilingPolicy) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Scan table rows and count only aid granted inside the window.
    pub fn with_window(mut self, window: Option<WindowPolicy>) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Option<&WindowPolicy> {
        self.window.as_ref()
    }

    pub fn extractor(&self) -> &AmountExtractor {
        &self.extractor
    }

    /// Configured identifier first, then one found among the fragments.
    fn resolve_identifier(&self, fragments: &[String]) -> Result<Option<String>> {
        if let Some(identifier) = &self.identifier {
            if self.validate_identifier {
                return Ok(Some(parse_partita_iva(identifier)?.to_string()));
            }
            return Ok(Some(identifier.trim().to_string()));
        }

        if !self.detect_identifier {
            return Ok(None);
        }

        let detected = PartitaIvaExtractor::new()
            .with_validation(self.validate_identifier)
            .detect(fragments);

        if let Some(piva) = &detected {
            debug!("Detected P.IVA {} among fragments", piva);
        }

        Ok(detected)
    }

    /// Build the report for already-loaded fragments, without side effects.
    pub fn scan(&self, fragments: &[String]) -> Result<ScanReport> {
        let result = self.extractor.extract(fragments);
        self.report(fragments, result, None)
    }

    /// Build the report for table rows (header first).
    ///
    /// Without a window the rows are read as flat cells, like [`Scanner::scan`].
    pub fn scan_rows(&self, rows: &[Vec<String>]) -> Result<ScanReport> {
        let cells: Vec<String> = rows.iter().flatten().cloned().collect();

        match &self.window {
            Some(policy) => {
                let scan = RowExtractor::new(self.extractor.clone(), *policy).extract(rows);
                self.report(&cells, scan.result, Some(scan.window))
            }
            None => self.scan(&cells),
        }
    }

    fn report(
        &self,
        fragments: &[String],
        result: ExtractionResult,
        window: Option<WindowReport>,
    ) -> Result<ScanReport> {
        let identifier = self.resolve_identifier(fragments)?;
        let label = SummaryLabel::new(self.id_label.clone(), identifier.clone());

        Ok(ScanReport {
            summary: summary_line(&label, &result),
            ceiling: assess_ceiling(result.total(), &self.ceiling),
            identifier,
            result,
            window,
        })
    }

    /// Pull fragments from `source`, log every match and the summary block
    /// to `sink`, then copy the summary line.
    ///
    /// With a window set, the source is read as rows.
    /// A failing clipboard write is returned as an error.
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<ScanReport>
    where
        S: FragmentSource + ?Sized,
        K: ReportSink + ?Sized,
    {
        let report = if self.window.is_some() {
            let rows = source.rows()?;
            info!("Scanning {} rows", rows.len());
            self.scan_rows(&rows)?
        } else {
            let fragments = source.fragments()?;
            info!("Scanning {} fragments", fragments.len());
            self.scan(&fragments)?
        };

        for matched in report.result.matches() {
            sink.record_match(matched);
        }

        let label = SummaryLabel::new(self.id_label.clone(), report.identifier.clone());
        sink.record_summary(&summary_block(&label, &report.result));
        sink.copy_summary(&report.summary)?;

        Ok(report)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

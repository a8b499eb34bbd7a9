//! Report sinks: the log and clipboard side of a scan.

use std::io::Write;

use tracing::info;

use crate::error::SinkError;
use crate::models::amounts::MatchedAmount;

/// Receives the human-readable output of a scan.
pub trait ReportSink {
    /// One accepted amount.
    fn record_match(&mut self, matched: &MatchedAmount);

    /// The closing summary block, one entry per line.
    fn record_summary(&mut self, lines: &[String]);

    /// Copy the summary line to the clipboard target.
    fn copy_summary(&mut self, line: &str) -> Result<(), SinkError>;
}

/// Format the per-match log line.
pub fn match_line(matched: &MatchedAmount) -> String {
    format!("Trovato: {} → €{:.2}", matched.original_text, matched.value)
}

/// Logs through `tracing` and writes the clipboard line to any writer
/// (a file, stdout, a pipe to a clipboard tool).
pub struct TracingSink<W: Write> {
    clipboard: W,
}

impl<W: Write> TracingSink<W> {
    pub fn new(clipboard: W) -> Self {
        Self { clipboard }
    }

    pub fn into_inner(self) -> W {
        self.clipboard
    }
}

impl<W: Write> ReportSink for TracingSink<W> {
    fn record_match(&mut self, matched: &MatchedAmount) {
        info!("{}", match_line(matched));
    }

    fn record_summary(&mut self, lines: &[String]) {
        for line in lines {
            info!("{}", line);
        }
    }

    fn copy_summary(&mut self, line: &str) -> Result<(), SinkError> {
        writeln!(self.clipboard, "{}", line)?;
        self.clipboard.flush()?;
        Ok(())
    }
}

/// Collects everything in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    /// Log lines in emission order.
    pub lines: Vec<String>,
    /// Last copied summary line.
    pub clipboard: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for MemorySink {
    fn record_match(&mut self, matched: &MatchedAmount) {
        self.lines.push(match_line(matched));
    }

    fn record_summary(&mut self, lines: &[String]) {
        self.lines.extend(lines.iter().cloned());
    }

    fn copy_summary(&mut self, line: &str) -> Result<(), SinkError> {
        self.clipboard = Some(line.to_string());
        Ok(())
    }
}

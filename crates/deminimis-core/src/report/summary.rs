use crate::models::amounts::ExtractionResult;
use crate::rules::amounts::format_italian_amount;

/// Placeholder printed when no identifier is known.
pub const UNKNOWN_IDENTIFIER: &str = "N/D";

const RULE_WIDTH: usize = 50;

/// Label and identifier a total is reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLabel {
    pub id_label: String,
    pub identifier: Option<String>,
}

impl SummaryLabel {
    pub fn new(id_label: impl Into<String>, identifier: Option<String>) -> Self {
        Self {
            id_label: id_label.into(),
            identifier,
        }
    }

    pub fn identifier_or_unknown(&self) -> &str {
        self.identifier.as_deref().unwrap_or(UNKNOWN_IDENTIFIER)
    }
}

/// The clipboard line, e.g.
/// `P.IVA 03254550738 - Totale De Minimis: €9.505,95 (2 aiuti)`.
pub fn summary_line(label: &SummaryLabel, result: &ExtractionResult) -> String {
    format!(
        "{} {} - Totale De Minimis: €{} ({} aiuti)",
        label.id_label,
        label.identifier_or_unknown(),
        format_italian_amount(result.total()),
        result.count()
    )
}

/// The closing log block, one entry per line.
pub fn summary_block(label: &SummaryLabel, result: &ExtractionResult) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    vec![
        rule.clone(),
        format!("TOTALE DE MINIMIS: €{}", format_italian_amount(result.total())),
        format!("Numero aiuti trovati: {}", result.count()),
        format!("{}: {}", label.id_label, label.identifier_or_unknown()),
        rule,
    ]
}

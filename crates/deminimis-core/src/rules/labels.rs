//! Label-based exclusion of cells that carry numbers but no amounts.

/// Default labels: tax identifiers ("Partita IVA"), codes ("Codice CAR",
/// "Codice fiscale") and dates ("Data concessione").
pub const DEFAULT_EXCLUSION_LABELS: &[&str] = &["partita", "codice", "data"];

/// Case-insensitive substring filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionFilter {
    labels: Vec<String>,
}

impl ExclusionFilter {
    /// Build a filter from labels; matching ignores case.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }

    /// The first label found in `text`, if any.
    pub fn matching_label(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.labels
            .iter()
            .find(|label| lowered.contains(label.as_str()))
            .map(String::as_str)
    }

    /// Whether `text` must be skipped.
    pub fn excludes(&self, text: &str) -> bool {
        self.matching_label(text).is_some()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_LABELS)
    }
}

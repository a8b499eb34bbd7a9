//! Rule-based matchers for scraped RNA table cells.

pub mod amounts;
pub mod dates;
pub mod labels;
pub mod partita_iva;
pub mod patterns;

pub use amounts::{
    format_italian_amount, parse_italian_amount, parse_positional_amount, AmountMatcher,
    Normalization,
};
pub use dates::{parse_concession_date, ConcessionDateMatcher};
pub use labels::{ExclusionFilter, DEFAULT_EXCLUSION_LABELS};
pub use partita_iva::{
    format_partita_iva, parse_partita_iva, validate_partita_iva, PartitaIva, PartitaIvaExtractor,
};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// A matched field with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

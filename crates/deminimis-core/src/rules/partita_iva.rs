//! P.IVA (Italian VAT number) validation and detection.

use serde::{Deserialize, Serialize};

use super::patterns::{PARTITA_IVA_LABELED, PARTITA_IVA_STANDALONE};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ValidationError;

/// A validated 11-digit P.IVA.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitaIva(String);

impl PartitaIva {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartitaIva {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PartitaIva {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_partita_iva(s)
    }
}

impl TryFrom<String> for PartitaIva {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_partita_iva(&value)
    }
}

impl From<PartitaIva> for String {
    fn from(value: PartitaIva) -> Self {
        value.0
    }
}

/// Parse a P.IVA, accepting an optional `IT` prefix and spaces.
pub fn parse_partita_iva(s: &str) -> Result<PartitaIva, ValidationError> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("IT")
        .or_else(|| compact.strip_prefix("it"))
        .unwrap_or(&compact);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Format {
            value: s.to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if digits.len() != 11 {
        return Err(ValidationError::Format {
            value: s.to_string(),
            reason: format!("expected 11 digits, got {}", digits.len()),
        });
    }

    if !validate_partita_iva(digits) {
        return Err(ValidationError::Checksum(digits.to_string()));
    }

    Ok(PartitaIva(digits.to_string()))
}

/// Validate a P.IVA using the check digit algorithm.
///
/// Format: 11 digits, the last one a Luhn-style check digit. Digits at odd
/// (0-based) positions are doubled, with 9 subtracted when the result
/// exceeds 9.
pub fn validate_partita_iva(piva: &str) -> bool {
    let digits: Vec<u32> = piva.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 || piva.chars().filter(|c| !c.is_whitespace()).count() != 11 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .take(10)
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    (10 - sum % 10) % 10 == digits[10]
}

/// Format a P.IVA in the EU VIES form (IT + 11 digits).
pub fn format_partita_iva(piva: &PartitaIva) -> String {
    format!("IT{}", piva.as_str())
}

/// P.IVA field extractor.
pub struct PartitaIvaExtractor {
    validate: bool,
}

impl PartitaIvaExtractor {
    /// Create a new P.IVA extractor.
    pub fn new() -> Self {
        Self { validate: true }
    }

    /// Set whether to validate check digits.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn accept(&self, digits: &str) -> bool {
        !self.validate || validate_partita_iva(digits)
    }

    /// Find the P.IVA a set of table cells refers to.
    ///
    /// A labelled occurrence in any cell wins over a bare 11-digit number.
    pub fn detect<S: AsRef<str>>(&self, fragments: &[S]) -> Option<String> {
        let labeled = fragments.iter().find_map(|f| {
            PARTITA_IVA_LABELED
                .captures_iter(f.as_ref())
                .map(|caps| caps[1].to_string())
                .find(|digits| self.accept(digits))
        });

        labeled.or_else(|| fragments.iter().find_map(|f| self.extract(f.as_ref()).map(|m| m.value)))
    }
}

impl Default for PartitaIvaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PartitaIvaExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        // Labelled pattern first, bare numbers second
        for pattern in [&*PARTITA_IVA_LABELED, &*PARTITA_IVA_STANDALONE] {
            for caps in pattern.captures_iter(text) {
                let digits = &caps[1];
                if self.accept(digits) {
                    let full_match = caps.get(0)?;
                    return Some(
                        ExtractionMatch::new(digits.to_string(), full_match.as_str())
                            .with_position(full_match.start(), full_match.end()),
                    );
                }
            }
        }
        None
    }
}

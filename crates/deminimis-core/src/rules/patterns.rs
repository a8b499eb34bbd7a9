//! Common regex patterns for RNA table cells.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Italian amount: optional euro sign, 1-3 digits, `.`/`,` thousands
    // groups, optional 2-digit decimal group, optional trailing euro sign.
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"€?\s*([0-9]{1,3}(?:[.,][0-9]{3})*(?:[.,][0-9]{2})?)\s*€?"
    ).unwrap();

    // Positional reading: last separator with exactly two digits is decimal
    pub static ref TRAILING_DECIMALS: Regex = Regex::new(
        r"^(.*?)[.,]([0-9]{2})$"
    ).unwrap();

    // Longest leading decimal of a normalized numeral ("12.345.678" -> "12.345")
    pub static ref NUMERIC_PREFIX: Regex = Regex::new(
        r"^[0-9]+(?:\.[0-9]+)?"
    ).unwrap();

    // Concession date as printed by RNA: DD/MM/YYYY, whole cell
    pub static ref CONCESSION_DATE: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})/(\d{4})$"
    ).unwrap();

    // P.IVA patterns (Italian VAT number)
    pub static ref PARTITA_IVA_LABELED: Regex = Regex::new(
        r"(?i)(?:partita\s+iva|p\.\s*iva|piva|codice\s+fiscale|c\.\s*f\.)[\s:.°n]*(?:IT\s*)?(\d{11})\b"
    ).unwrap();

    pub static ref PARTITA_IVA_STANDALONE: Regex = Regex::new(
        r"(?i)\b(?:IT)?(\d{11})\b"
    ).unwrap();
}

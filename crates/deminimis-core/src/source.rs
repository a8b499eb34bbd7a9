//! Fragment sources: where the scraped cell texts come from.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DeminimisError, SourceError};
use crate::Result;

/// Provider of the ordered cell texts for one pass.
pub trait FragmentSource {
    /// All fragments, in document order.
    fn fragments(&self) -> Result<Vec<String>>;

    /// The same cells grouped into table rows, header first.
    ///
    /// Sources without row structure yield one cell per row.
    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.fragments()?.into_iter().map(|cell| vec![cell]).collect())
    }
}

impl FragmentSource for Vec<String> {
    fn fragments(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

impl FragmentSource for Vec<Vec<String>> {
    fn fragments(&self) -> Result<Vec<String>> {
        Ok(self.iter().flatten().cloned().collect())
    }

    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.clone())
    }
}

impl FragmentSource for [&str] {
    fn fragments(&self) -> Result<Vec<String>> {
        Ok(self.iter().map(|s| (*s).to_string()).collect())
    }
}

/// One fragment per line, as produced by copying a table column.
#[derive(Debug, Clone)]
pub struct LineSource {
    text: String,
}

impl LineSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(SourceError::Read)?;
        Ok(Self::new(text))
    }
}

impl FragmentSource for LineSource {
    fn fragments(&self) -> Result<Vec<String>> {
        Ok(self
            .text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Tab-separated cells, as a browser copies a table row.
    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self
            .text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.split('\t').map(|c| c.trim().to_string()).collect())
            .collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFragments {
    Cells(Vec<String>),
    Rows(Vec<Vec<String>>),
}

/// A JSON array of cell strings, or of rows of cell strings.
///
/// Rows are flattened in row-major order, matching document order of a
/// `td, th` query.
#[derive(Debug, Clone)]
pub struct JsonSource {
    text: String,
}

impl JsonSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl JsonSource {
    fn parse(&self) -> Result<JsonFragments> {
        Ok(serde_json::from_str(&self.text).map_err(SourceError::Json)?)
    }
}

impl FragmentSource for JsonSource {
    fn fragments(&self) -> Result<Vec<String>> {
        Ok(match self.parse()? {
            JsonFragments::Cells(cells) => cells,
            JsonFragments::Rows(rows) => rows.into_iter().flatten().collect(),
        })
    }

    fn rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(match self.parse()? {
            JsonFragments::Cells(cells) => cells.into_iter().map(|cell| vec![cell]).collect(),
            JsonFragments::Rows(rows) => rows,
        })
    }
}

/// Pick the source for a file: `.json` files as [`JsonSource`], everything
/// else as [`LineSource`].
pub fn source_from_path(path: &Path) -> Result<Box<dyn FragmentSource>> {
    let text = std::fs::read_to_string(path).map_err(|e| DeminimisError::Source(SourceError::Read(e)))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(Box::new(JsonSource::new(text)))
    } else {
        Ok(Box::new(LineSource::new(text)))
    }
}

/// Load fragments from a file, see [`source_from_path`].
pub fn fragments_from_path(path: &Path) -> Result<Vec<String>> {
    source_from_path(path)?.fragments()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_source_skips_blank_lines() {
        let source = LineSource::new("€ 1.000,00\n\n  \nCodice CAR 123\n");
        assert_eq!(
            source.fragments().unwrap(),
            vec!["€ 1.000,00".to_string(), "Codice CAR 123".to_string()]
        );
    }

    #[test]
    fn test_line_source_from_reader() {
        let source = LineSource::from_reader("a\nb".as_bytes()).unwrap();
        assert_eq!(source.fragments().unwrap().len(), 2);
    }

    #[test]
    fn test_json_cells() {
        let source = JsonSource::new(r#"["€ 1.000,00", "Data"]"#);
        assert_eq!(source.fragments().unwrap(), vec!["€ 1.000,00", "Data"]);
    }

    #[test]
    fn test_json_rows_flatten_row_major() {
        let source = JsonSource::new(r#"[["a", "b"], ["c"]]"#);
        assert_eq!(source.fragments().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_json_malformed() {
        let err = JsonSource::new(r#"{"cells": 1}"#).fragments().unwrap_err();
        assert!(matches!(err, DeminimisError::Source(SourceError::Json(_))));
    }

    #[test]
    fn test_slice_source() {
        let cells: &[&str] = &["x", "y"];
        assert_eq!(cells.fragments().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_json_rows_kept_as_rows() {
        let source = JsonSource::new(r#"[["Data Concessione", "Elemento Aiuto"], ["01/02/2024", "€ 5,00"]]"#);
        let rows = source.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["01/02/2024", "€ 5,00"]);

        let cells = JsonSource::new(r#"["a", "b"]"#).rows().unwrap();
        assert_eq!(cells, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn test_line_rows_split_on_tabs() {
        let source = LineSource::new("Data Concessione\tElemento Aiuto\n\n01/02/2024\t € 5,00 \n");
        assert_eq!(
            source.rows().unwrap(),
            vec![
                vec!["Data Concessione".to_string(), "Elemento Aiuto".to_string()],
                vec!["01/02/2024".to_string(), "€ 5,00".to_string()],
            ]
        );
    }

    #[test]
    fn test_row_vectors() {
        let rows = vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]];
        assert_eq!(rows.fragments().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(rows.rows().unwrap(), rows);
    }
}

//! Metadata source reader: CSV dataset to an ordered list of
//! [`DocumentRecord`]s.
//!
//! The header must name an `Identifier` column; `PrimaryUrl` and
//! `FallbackUrl` columns are optional and matched case-insensitively
//! (underscores ignored). Rows lacking an identifier or lacking both URLs
//! are silently omitted.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::csv::{self, CsvError};
use crate::types::DocumentRecord;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to read metadata file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("metadata file has no header row")]
    MissingHeader,
    #[error("metadata header has no identifier column")]
    MissingIdentifierColumn,
    #[error("malformed metadata file: {0}")]
    Malformed(#[from] CsvError),
}

/// Reads a metadata CSV file into records, preserving row order.
pub fn read_records(path: &Path) -> Result<Vec<DocumentRecord>, ReaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&text)
}

/// Parses metadata CSV text into records. See module docs for the header
/// contract and row filtering rules.
pub fn parse_records(text: &str) -> Result<Vec<DocumentRecord>, ReaderError> {
    let rows = csv::parse(text)?;
    let mut iter = rows.into_iter();
    let header = iter.next().ok_or(ReaderError::MissingHeader)?;

    let id_col = find_column(&header, "identifier").ok_or(ReaderError::MissingIdentifierColumn)?;
    let primary_col = find_column(&header, "primaryurl");
    let fallback_col = find_column(&header, "fallbackurl");

    let mut records = Vec::new();
    for row in iter {
        let id = cell(&row, Some(id_col));
        let Some(id) = id else { continue };
        let primary_url = cell(&row, primary_col);
        let fallback_url = cell(&row, fallback_col);
        if primary_url.is_none() && fallback_url.is_none() {
            continue;
        }
        records.push(DocumentRecord {
            id,
            primary_url,
            fallback_url,
        });
    }
    Ok(records)
}

fn find_column(header: &[String], wanted: &str) -> Option<usize> {
    header.iter().position(|name| {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        normalized == wanted
    })
}

fn cell(row: &[String], column: Option<usize>) -> Option<String> {
    let value = row.get(column?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{parse_records, ReaderError};

    #[test]
    fn reads_rows_in_order() {
        let text = "Identifier,PrimaryUrl,FallbackUrl\n\
                    a,https://a.example/doc.pdf,\n\
                    b,https://b.example/doc.pdf,https://mirror.example/b.pdf\n";
        let records = parse_records(text).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].primary_url.as_deref(), Some("https://a.example/doc.pdf"));
        assert_eq!(records[0].fallback_url, None);
        assert_eq!(
            records[1].fallback_url.as_deref(),
            Some("https://mirror.example/b.pdf")
        );
    }

    #[test]
    fn header_match_is_case_insensitive_and_ignores_underscores() {
        let text = "identifier,primary_url,FALLBACK_URL\nx,https://a.example/x.pdf,\n";
        let records = parse_records(text).expect("parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn rows_without_identifier_or_without_any_url_are_omitted() {
        let text = "Identifier,PrimaryUrl,FallbackUrl\n\
                    ,https://a.example/doc.pdf,\n\
                    b,,\n\
                    c,https://c.example/doc.pdf,\n";
        let records = parse_records(text).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "c");
    }

    #[test]
    fn missing_identifier_column_is_an_error() {
        let text = "Name,PrimaryUrl\nx,https://a.example/x.pdf\n";
        assert!(matches!(
            parse_records(text),
            Err(ReaderError::MissingIdentifierColumn)
        ));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_records(""), Err(ReaderError::MissingHeader)));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let text = "Title,Identifier,Year,PrimaryUrl\nSome paper,p1,2021,https://a.example/p1.pdf\n";
        let records = parse_records(text).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "p1");
    }
}

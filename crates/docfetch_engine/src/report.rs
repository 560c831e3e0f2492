use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::csv;
use crate::types::OutcomeRow;

/// Column order of the run report.
pub const REPORT_HEADER: [&str; 4] = ["Identifier", "AttemptedUrl", "Status", "Error"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("report write cancelled")]
    Cancelled,
}

/// Capability port: persist the complete outcome list of one run.
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(
        &self,
        destination: &str,
        rows: &[OutcomeRow],
        cancel: &CancellationToken,
    ) -> Result<(), ReportError>;
}

/// Renders the report: header line plus one quoted line per row, each
/// newline-terminated.
pub fn render_report(rows: &[OutcomeRow]) -> String {
    let mut out = String::new();
    out.push_str(&csv::write_record(&REPORT_HEADER));
    out.push('\n');
    for row in rows {
        let status = row.disposition.to_string();
        out.push_str(&csv::write_record(&[
            row.id.as_str(),
            row.attempted_url.as_str(),
            status.as_str(),
            row.error.as_str(),
        ]));
        out.push('\n');
    }
    out
}

/// File-backed report writer. The destination identifier is a filesystem
/// path; the file is written atomically via a temp file and rename.
#[derive(Debug, Clone, Default)]
pub struct CsvReportSink;

#[async_trait::async_trait]
impl ReportSink for CsvReportSink {
    async fn write(
        &self,
        destination: &str,
        rows: &[OutcomeRow],
        cancel: &CancellationToken,
    ) -> Result<(), ReportError> {
        if cancel.is_cancelled() {
            return Err(ReportError::Cancelled);
        }
        // Keep the blocking file write off the runtime thread.
        let path = PathBuf::from(destination);
        let join_path = path.clone();
        let rendered = render_report(rows);
        let write = tokio::task::spawn_blocking(move || {
            write_atomic(&path, rendered.as_bytes())
                .map_err(|source| ReportError::Io { path, source })
        });
        tokio::select! {
            _ = cancel.cancelled() => Err(ReportError::Cancelled),
            result = write => result.map_err(|err| ReportError::Io {
                path: join_path,
                source: io::Error::other(err),
            })?,
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

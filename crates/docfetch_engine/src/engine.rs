//! Orchestration engine: sequential fetch-validate-save over a batch of
//! metadata records.
//!
//! Per-item problems never escape [`Engine::run`]; each becomes a `Failed`
//! outcome row. Only caller cancellation and a failed final report write
//! abort the run.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::fetch::Transport;
use crate::naming::artifact_filename;
use crate::report::{ReportError, ReportSink};
use crate::retry::{backoff_delay, MAX_ATTEMPTS_PER_URL};
use crate::signature::{leading_bytes_preview, matches_pdf_signature};
use crate::store::ArtifactStore;
use crate::types::{
    Disposition, DocumentRecord, FailureKind, FetchError, OutcomeRow, ProgressSink,
    ProgressUpdate, Stage,
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("run cancelled")]
    Cancelled,
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result of the full pipeline against a single URL.
enum UrlAttempt {
    Saved,
    Failed(String),
}

/// Drives the per-item state machine over its three ports.
///
/// The engine itself is stateless; all mutable run state (success counter,
/// outcome list) is local to one [`Engine::run`] call.
pub struct Engine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn ArtifactStore>,
    report: Arc<dyn ReportSink>,
}

impl Engine {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn ArtifactStore>,
        report: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            transport,
            store,
            report,
        }
    }

    /// Processes records in order until input is exhausted, the success cap
    /// is reached, or cancellation is observed. Returns one outcome row per
    /// processed record, in input order, after writing the report exactly
    /// once. On cancellation no report is written.
    pub async fn run(
        &self,
        records: &[DocumentRecord],
        config: &RunConfig,
        cancel: &CancellationToken,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<OutcomeRow>, RunError> {
        let mut rows: Vec<OutcomeRow> = Vec::new();
        let mut successes = 0usize;

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            if successes >= config.success_cap() {
                info!(
                    "success cap of {} reached, leaving {} records unprocessed",
                    config.success_cap(),
                    records.len() - index
                );
                break;
            }

            let mut item = ItemContext {
                index,
                total: records.len(),
                successes,
                success_cap: config.success_cap(),
                id: record.id.trim().to_string(),
                sink: progress,
            };
            let row = self.process_record(record, config, cancel, &item).await?;
            if row.disposition == Disposition::Saved {
                successes += 1;
                item.successes = successes;
            }

            match row.disposition {
                Disposition::Saved => info!("{}: saved from {}", row.id, row.attempted_url),
                Disposition::SkippedAlreadyPresent => {
                    info!("{}: artifact already exists, skipped", row.id)
                }
                Disposition::Failed => warn!("{}: failed: {}", row.id, row.error),
            }
            item.emit_terminal(&row);
            rows.push(row);
        }

        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        match self
            .report
            .write(config.report_destination(), &rows, cancel)
            .await
        {
            Ok(()) => Ok(rows),
            Err(_) if cancel.is_cancelled() => Err(RunError::Cancelled),
            Err(err) => Err(err.into()),
        }
    }

    async fn process_record(
        &self,
        record: &DocumentRecord,
        config: &RunConfig,
        cancel: &CancellationToken,
        item: &ItemContext<'_>,
    ) -> Result<OutcomeRow, RunError> {
        item.emit(
            Stage::ProcessingRecord,
            format!("record {} of {}", item.index + 1, item.total),
            None,
        );

        let id = record.id.trim();
        if id.is_empty() {
            return Ok(OutcomeRow::failed(
                id,
                "",
                "record has a blank identifier",
            ));
        }

        let name = artifact_filename(id);
        if !config.overwrite() {
            match self.store.exists(&name).await {
                Ok(true) => return Ok(OutcomeRow::skipped(id)),
                Ok(false) => {}
                Err(err) => {
                    return Ok(OutcomeRow::failed(
                        id,
                        "",
                        format!("could not check for existing artifact: {err}"),
                    ));
                }
            }
        }

        let primary = trimmed_url(record.primary_url.as_deref());
        let fallback = trimmed_url(record.fallback_url.as_deref());
        if primary.is_none() && fallback.is_none() {
            return Ok(OutcomeRow::failed(id, "", "no URL available"));
        }

        let mut last_url = String::new();
        let mut last_error = String::new();
        let candidates = [
            (primary, Stage::TryingPrimary, "primary"),
            (fallback, Stage::TryingFallback, "fallback"),
        ];
        for (url, stage, label) in candidates {
            let Some(url) = url else { continue };
            item.emit(stage, format!("{label} source"), Some(url));
            match self.attempt_url(url, &name, config, cancel, item).await? {
                UrlAttempt::Saved => return Ok(OutcomeRow::saved(id, url)),
                UrlAttempt::Failed(error) => {
                    warn!("{id}: {label} url {url} failed: {error}");
                    last_url = url.to_string();
                    last_error = error;
                }
            }
        }
        Ok(OutcomeRow::failed(id, last_url, last_error))
    }

    /// Fetch-validate-save pipeline for one URL, with bounded retries for
    /// transient fetch failures.
    async fn attempt_url(
        &self,
        url: &str,
        name: &str,
        config: &RunConfig,
        cancel: &CancellationToken,
        item: &ItemContext<'_>,
    ) -> Result<UrlAttempt, RunError> {
        if let Err(error) = check_scheme(url) {
            return Ok(UrlAttempt::Failed(error));
        }

        let mut attempt = 1usize;
        let bytes = loop {
            item.emit(
                Stage::Downloading,
                format!("attempt {attempt} of {MAX_ATTEMPTS_PER_URL}"),
                Some(url),
            );
            match self
                .fetch_once(url, config.attempt_timeout(), cancel)
                .await?
            {
                Ok(bytes) => break bytes,
                Err(err) => {
                    if err.is_transient() && attempt < MAX_ATTEMPTS_PER_URL {
                        let delay = backoff_delay(attempt);
                        debug!("{url}: attempt {attempt} failed ({err}), retrying in {delay:?}");
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(RunError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        attempt += 1;
                    } else {
                        return Ok(UrlAttempt::Failed(err.to_string()));
                    }
                }
            }
        };

        item.emit(
            Stage::ValidatingFormat,
            format!("received {} bytes", bytes.len()),
            Some(url),
        );
        if !matches_pdf_signature(&bytes) {
            let preview = leading_bytes_preview(&bytes);
            return Ok(UrlAttempt::Failed(format!(
                "content is not a PDF (signature mismatch, content starts with \"{preview}\")"
            )));
        }

        item.emit(Stage::SavingFile, format!("writing {name}"), Some(url));
        match self.store.save(name, &bytes, cancel).await {
            Ok(()) => Ok(UrlAttempt::Saved),
            Err(_) if cancel.is_cancelled() => Err(RunError::Cancelled),
            Err(err) => Ok(UrlAttempt::Failed(format!(
                "failed to save artifact: {err}"
            ))),
        }
    }

    /// One fetch bounded by the per-attempt timeout. The timeout cancels a
    /// child token so the transport can abandon the request; the caller's
    /// own token aborts the run instead.
    async fn fetch_once(
        &self,
        url: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Result<Vec<u8>, FetchError>, RunError> {
        let attempt_token = cancel.child_token();
        tokio::select! {
            _ = cancel.cancelled() => Err(RunError::Cancelled),
            _ = tokio::time::sleep(timeout) => {
                attempt_token.cancel();
                Ok(Err(FetchError::new(
                    FailureKind::Timeout,
                    format!("no response within {:.1}s", timeout.as_secs_f32()),
                )))
            }
            result = self.transport.fetch(url, &attempt_token) => {
                match result {
                    Err(err) if err.kind == FailureKind::Cancelled => Err(RunError::Cancelled),
                    other => Ok(other),
                }
            }
        }
    }
}

/// Per-item progress emission context; a copy of the run counters at the
/// time the item started, so every snapshot is self-contained.
struct ItemContext<'a> {
    index: usize,
    total: usize,
    successes: usize,
    success_cap: usize,
    id: String,
    sink: Option<&'a dyn ProgressSink>,
}

impl ItemContext<'_> {
    fn emit(&self, stage: Stage, message: impl Into<String>, url: Option<&str>) {
        self.emit_full(stage, message.into(), url, None);
    }

    fn emit_terminal(&self, row: &OutcomeRow) {
        let (stage, message) = match row.disposition {
            Disposition::Saved => (Stage::Saved, "saved".to_string()),
            Disposition::SkippedAlreadyPresent => {
                (Stage::SkippedAlreadyPresent, "already exists".to_string())
            }
            Disposition::Failed => (Stage::Failed, row.error.clone()),
        };
        let url = if row.attempted_url.is_empty() {
            None
        } else {
            Some(row.attempted_url.as_str())
        };
        self.emit_full(stage, message, url, Some(row.clone()));
    }

    fn emit_full(
        &self,
        stage: Stage,
        message: String,
        url: Option<&str>,
        outcome: Option<OutcomeRow>,
    ) {
        if let Some(sink) = self.sink {
            sink.emit(ProgressUpdate {
                index: self.index,
                total: self.total,
                successes: self.successes,
                success_cap: self.success_cap,
                id: self.id.clone(),
                stage,
                message,
                url: url.map(str::to_string),
                outcome,
            });
        }
    }
}

fn trimmed_url(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| !u.is_empty())
}

/// Only the two web-transfer schemes are fetchable; anything else fails
/// deterministically before any network call.
fn check_scheme(url: &str) -> Result<(), String> {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(format!("unsupported scheme \"{other}\"")),
        },
        Err(err) => Err(format!("invalid url: {err}")),
    }
}

//! docfetch engine: batch document retrieval pipeline and its ports.
mod config;
mod csv;
mod engine;
mod fetch;
mod naming;
mod reader;
mod report;
mod retry;
mod signature;
mod store;
mod types;

pub use config::{ConfigError, RunConfig, DEFAULT_ATTEMPT_TIMEOUT};
pub use csv::CsvError;
pub use engine::{Engine, RunError};
pub use fetch::{ReqwestTransport, Transport, TransportSettings};
pub use naming::artifact_filename;
pub use reader::{parse_records, read_records, ReaderError};
pub use report::{render_report, CsvReportSink, ReportError, ReportSink, REPORT_HEADER};
pub use retry::{backoff_delay, MAX_ATTEMPTS_PER_URL, RETRY_BASE_DELAY};
pub use signature::{leading_bytes_preview, matches_pdf_signature, PDF_MAGIC};
pub use store::{ArtifactStore, FsArtifactStore, StoreError};
pub use types::{
    Disposition, DocumentRecord, FailureKind, FetchError, OutcomeRow, ProgressSink,
    ProgressUpdate, Stage,
};

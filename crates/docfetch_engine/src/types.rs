use std::fmt;

/// One metadata row: an identifier plus up to two source URLs.
///
/// A record with neither URL is still processable; it always terminates
/// with a `Failed` disposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub primary_url: Option<String>,
    pub fallback_url: Option<String>,
}

/// Processing stage of the current item, reported through [`ProgressUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ProcessingRecord,
    TryingPrimary,
    TryingFallback,
    Downloading,
    ValidatingFormat,
    SavingFile,
    Saved,
    SkippedAlreadyPresent,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ProcessingRecord => "processing record",
            Stage::TryingPrimary => "trying primary url",
            Stage::TryingFallback => "trying fallback url",
            Stage::Downloading => "downloading",
            Stage::ValidatingFormat => "validating format",
            Stage::SavingFile => "saving file",
            Stage::Saved => "saved",
            Stage::SkippedAlreadyPresent => "skipped (already present)",
            Stage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Terminal classification of one item's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Saved,
    SkippedAlreadyPresent,
    Failed,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Disposition::Saved => "Saved",
            Disposition::SkippedAlreadyPresent => "SkippedAlreadyPresent",
            Disposition::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

/// Final record of one item's processing, one per processed input record.
///
/// `attempted_url` is the URL responsible for the final disposition and is
/// empty when no URL was attempted. `error` is empty unless the disposition
/// is `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRow {
    pub id: String,
    pub attempted_url: String,
    pub disposition: Disposition,
    pub error: String,
}

impl OutcomeRow {
    pub(crate) fn saved(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attempted_url: url.into(),
            disposition: Disposition::Saved,
            error: String::new(),
        }
    }

    pub(crate) fn skipped(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attempted_url: String::new(),
            disposition: Disposition::SkippedAlreadyPresent,
            error: String::new(),
        }
    }

    pub(crate) fn failed(
        id: impl Into<String>,
        url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            attempted_url: url.into(),
            disposition: Disposition::Failed,
            error: error.into(),
        }
    }
}

/// Self-contained point-in-time view of the run, pushed to a
/// [`ProgressSink`] at every stage transition.
///
/// `outcome` is populated only on the snapshot that reports an item's
/// terminal stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub index: usize,
    pub total: usize,
    pub successes: usize,
    pub success_cap: usize,
    pub id: String,
    pub stage: Stage,
    pub message: String,
    pub url: Option<String>,
    pub outcome: Option<OutcomeRow>,
}

/// Push-style progress callback. Invoked synchronously at each transition;
/// implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: ProgressUpdate);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    UnsupportedScheme { scheme: String },
    HttpStatus(u16),
    Timeout,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::UnsupportedScheme { scheme } => {
                write!(f, "unsupported scheme \"{scheme}\"")
            }
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

//! Retry classification and backoff for single-URL fetch attempts.
//!
//! Transient failures (timeouts, rate limits, server errors, connection
//! problems without a status code) are retried; everything else is
//! deterministic and fails the attempt immediately.

use std::time::Duration;

use crate::types::{FailureKind, FetchError};

/// Bounded total attempts per URL: one initial try plus two retries.
pub const MAX_ATTEMPTS_PER_URL: usize = 3;

/// Base delay between retries; grows linearly with the attempt number.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Linearly increasing delay before the retry following `attempt`
/// (1-based). Keeps pressure off a host that just failed.
pub fn backoff_delay(attempt: usize) -> Duration {
    RETRY_BASE_DELAY * attempt as u32
}

impl FetchError {
    /// Returns true when the failure is likely to succeed on retry.
    ///
    /// 404/403 and other client statuses are deterministic and trigger the
    /// fallback URL (when present) without any retry; 408/429/5xx are
    /// retried before falling back.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => code == 408 || code == 429 || (500..=599).contains(&code),
            FailureKind::InvalidUrl
            | FailureKind::UnsupportedScheme { .. }
            | FailureKind::Cancelled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{backoff_delay, RETRY_BASE_DELAY};
    use crate::types::{FailureKind, FetchError};

    fn err(kind: FailureKind) -> FetchError {
        FetchError::new(kind, "")
    }

    #[test]
    fn timeouts_and_connection_errors_are_transient() {
        assert!(err(FailureKind::Timeout).is_transient());
        assert!(err(FailureKind::Network).is_transient());
    }

    #[test]
    fn rate_limit_and_server_statuses_are_transient() {
        for code in [408, 429, 500, 502, 503, 599] {
            assert!(err(FailureKind::HttpStatus(code)).is_transient(), "{code}");
        }
    }

    #[test]
    fn client_statuses_are_deterministic() {
        for code in [400, 403, 404, 410, 451] {
            assert!(!err(FailureKind::HttpStatus(code)).is_transient(), "{code}");
        }
    }

    #[test]
    fn scheme_and_cancellation_are_never_retried() {
        assert!(!err(FailureKind::UnsupportedScheme {
            scheme: "ftp".into()
        })
        .is_transient());
        assert!(!err(FailureKind::InvalidUrl).is_transient());
        assert!(!err(FailureKind::Cancelled).is_transient());
    }

    #[test]
    fn backoff_grows_linearly() {
        assert_eq!(backoff_delay(1), RETRY_BASE_DELAY);
        assert_eq!(backoff_delay(2), RETRY_BASE_DELAY * 2);
    }
}

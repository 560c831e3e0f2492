use std::time::Duration;

use thiserror::Error;

/// Per-attempt fetch timeout applied when the caller does not override it.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("success cap must be greater than zero")]
    ZeroSuccessCap,
    #[error("report destination must not be blank")]
    BlankReportDestination,
}

/// Immutable parameters governing one run. Validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    success_cap: usize,
    overwrite: bool,
    attempt_timeout: Duration,
    report_destination: String,
}

impl RunConfig {
    /// Builds a configuration, rejecting a zero success cap or a blank
    /// report destination.
    pub fn new(
        success_cap: usize,
        overwrite: bool,
        attempt_timeout: Duration,
        report_destination: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if success_cap == 0 {
            return Err(ConfigError::ZeroSuccessCap);
        }
        let report_destination = report_destination.into();
        if report_destination.trim().is_empty() {
            return Err(ConfigError::BlankReportDestination);
        }
        Ok(Self {
            success_cap,
            overwrite,
            attempt_timeout,
            report_destination,
        })
    }

    /// Run stops once this many items have been fetched and saved.
    pub fn success_cap(&self) -> usize {
        self.success_cap
    }

    /// When false, an existing artifact short-circuits the item as skipped.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn report_destination(&self) -> &str {
        &self.report_destination
    }
}

use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::types::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("docfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Capability port: fetch raw bytes for a URL, cancellable.
///
/// Implementations report failure through [`FetchError`]; a fired
/// cancellation token yields `FailureKind::Cancelled`. The overall attempt
/// deadline is the caller's concern.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: TransportSettings,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::new(FailureKind::Cancelled, "fetch cancelled"));
            }
            response = client.get(parsed).send() => response.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(FetchError::new(FailureKind::Cancelled, "fetch cancelled"));
                }
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(chunk)) => bytes.extend_from_slice(&chunk),
                Some(Err(err)) => return Err(map_reqwest_error(err)),
                None => break,
            }
        }

        Ok(bytes)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

// =============================================================================
// Bar Sources
// =============================================================================
//
// The boundary between the service and wherever raw bars live. A source
// answers two questions for a ticker: "what bars cover this span?" and "what
// are its fundamentals?". Both come back raw; nothing here normalizes.
//
// Failures are already typed: `NotFound` when the source has nothing for the
// ticker, `Upstream` for everything else. Timeouts are imposed by the caller
// through `with_timeout`, so each implementation stays a plain async fetch.
// =============================================================================

pub mod directory;
pub mod http;

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::error::PipelineError;
use crate::market_data::RawFrame;
use crate::service_config::ServiceConfig;
use crate::span::SpanConfig;
use crate::types::{Fundamentals, SourceKind};

pub use directory::DirectoryBarSource;
pub use http::HttpBarSource;

/// The configured bar source.
#[derive(Debug, Clone)]
pub enum BarSource {
    Http(HttpBarSource),
    Directory(DirectoryBarSource),
}

impl BarSource {
    /// Build the source selected by `config.source`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Ok(match config.source {
            SourceKind::Http => {
                Self::Http(HttpBarSource::new(&config.upstream_url, config.fetch_timeout())?)
            }
            SourceKind::Directory => Self::Directory(DirectoryBarSource::new(&config.data_dir)),
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Http(_) => SourceKind::Http,
            Self::Directory(_) => SourceKind::Directory,
        }
    }

    /// Raw bars for `ticker` covering `span`.
    pub async fn fetch_bars(
        &self,
        ticker: &str,
        span: &SpanConfig,
    ) -> Result<RawFrame, PipelineError> {
        match self {
            Self::Http(src) => src.fetch_bars(ticker, span).await,
            Self::Directory(src) => src.fetch_bars(ticker, span).await,
        }
    }

    /// Point-in-time fundamentals for `ticker`.
    pub async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, PipelineError> {
        match self {
            Self::Http(src) => src.fetch_fundamentals(ticker).await,
            Self::Directory(src) => src.fetch_fundamentals(ticker).await,
        }
    }
}

/// Await `fut` for at most `limit`. Expiry becomes an upstream error naming
/// `what`.
pub async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(what, timeout_ms = limit.as_millis() as u64, "source fetch timed out");
            Err(PipelineError::Upstream(format!(
                "{what} fetch timed out after {}s",
                limit.as_secs_f64()
            )))
        }
    }
}

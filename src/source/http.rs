// =============================================================================
// HTTP Bar Source
// =============================================================================
//
// Talks to a generic market-data upstream:
//
//   GET {base}/bars/{TICKER}?interval=1d&start=1672531200   -> split frame
//   GET {base}/fundamentals/{TICKER}                         -> Fundamentals
//
// `start` is epoch seconds and is omitted for unbounded spans. A 404 from the
// upstream means "no such ticker"; any other failure is reported with the
// upstream's own message.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::market_data::RawFrame;
use crate::span::SpanConfig;
use crate::types::Fundamentals;

#[derive(Debug, Clone)]
pub struct HttpBarSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBarSource {
    /// Create a source rooted at `base_url`. `timeout` bounds each request at
    /// the transport level.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "HttpBarSource initialised");

        Ok(Self { base_url, client })
    }

    /// GET /bars/{ticker}
    #[instrument(skip(self, span), fields(interval = %span.granularity), name = "http_source::fetch_bars")]
    pub async fn fetch_bars(
        &self,
        ticker: &str,
        span: &SpanConfig,
    ) -> Result<RawFrame, PipelineError> {
        let mut url = format!(
            "{}/bars/{}?interval={}",
            self.base_url, ticker, span.granularity
        );
        if let Some(start) = span.lookback.start(Utc::now()) {
            url.push_str(&format!("&start={}", start.timestamp()));
        }

        let frame: RawFrame = self.get_json(ticker, &url).await?;
        debug!(rows = frame.row_count(), "bars received");
        Ok(frame)
    }

    /// GET /fundamentals/{ticker}
    #[instrument(skip(self), name = "http_source::fetch_fundamentals")]
    pub async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, PipelineError> {
        let url = format!("{}/fundamentals/{}", self.base_url, ticker);
        self.get_json(ticker, &url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, ticker: &str, url: &str) -> Result<T, PipelineError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Upstream(format!("GET {url} request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::NotFound {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Upstream(format!(
                "GET {url} returned {status}: {body}"
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| PipelineError::Upstream(format!("failed to parse response from {url}: {e}")))
    }
}

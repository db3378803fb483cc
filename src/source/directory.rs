// =============================================================================
// Directory Bar Source
// =============================================================================
//
// Serves bars from local files, for offline use and fixtures:
//
//   {dir}/{TICKER}.json               split frame
//   {dir}/{TICKER}.fundamentals.json  Fundamentals object
//
// Files hold whatever history was saved, so the span's lookback is applied
// here, measured back from the frame's last row rather than from "now".
// =============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::market_data::RawFrame;
use crate::span::SpanConfig;
use crate::types::Fundamentals;

#[derive(Debug, Clone)]
pub struct DirectoryBarSource {
    dir: PathBuf,
}

impl DirectoryBarSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[instrument(skip(self, span), fields(lookback = ?span.lookback), name = "dir_source::fetch_bars")]
    pub async fn fetch_bars(
        &self,
        ticker: &str,
        span: &SpanConfig,
    ) -> Result<RawFrame, PipelineError> {
        let path = self.dir.join(format!("{ticker}.json"));
        let mut frame: RawFrame = read_json(ticker, &path).await?;

        let before = frame.row_count();
        if let Some(start) = frame
            .last_timestamp()
            .and_then(|last| span.lookback.start(last))
        {
            frame.retain_since(start);
        }
        debug!(rows = frame.row_count(), trimmed = before - frame.row_count(), "bars loaded");

        Ok(frame)
    }

    #[instrument(skip(self), name = "dir_source::fetch_fundamentals")]
    pub async fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, PipelineError> {
        let path = self.dir.join(format!("{ticker}.fundamentals.json"));
        read_json(ticker, &path).await
    }
}

async fn read_json<T: DeserializeOwned>(ticker: &str, path: &Path) -> Result<T, PipelineError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::NotFound {
                ticker: ticker.to_string(),
            })
        }
        Err(e) => {
            return Err(PipelineError::Upstream(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    serde_json::from_str(&content)
        .map_err(|e| PipelineError::Upstream(format!("failed to parse {}: {e}", path.display())))
}

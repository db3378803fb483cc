// =============================================================================
// Pipeline Errors
// =============================================================================
//
// Typed failures for the normalize -> compute -> assemble pipeline and for the
// bar source boundary. The REST layer translates each variant into a status
// code; nothing below the boundary ever builds an HTTP response.
// =============================================================================

use thiserror::Error;

/// Every failure a metrics request can end in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The raw frame contained zero rows.
    #[error("no data returned")]
    EmptyInput,

    /// Every row was dropped during column repair.
    #[error("no valid rows after normalization")]
    NoValidRows,

    /// Fewer than two normalized rows; OBV and ATR need a previous bar.
    #[error("insufficient data: {rows} row(s), at least 2 required")]
    InsufficientData { rows: usize },

    /// Assembly was handed an empty series.
    #[error("cannot assemble an empty bar series")]
    EmptySeries,

    /// The source has nothing for this ticker.
    #[error("no data found for ticker: {ticker}")]
    NotFound { ticker: String },

    /// The source failed (transport, upstream status, malformed payload,
    /// timeout). Carries the upstream message verbatim.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl PipelineError {
    /// `true` for "nothing to show" outcomes, `false` for faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::NoValidRows
                | Self::InsufficientData { .. }
                | Self::NotFound { .. }
        )
    }
}

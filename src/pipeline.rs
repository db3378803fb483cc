// =============================================================================
// Metrics Pipeline
// =============================================================================
//
//   RawFrame --normalize--> BarSeries --compute--> IndicatorSet
//                               \                      /
//                                `----- assemble -----'
//                                          |
//                                   (optional rounding)
//                                          v
//                                       Analysis
//
// Pure and synchronous: no I/O, no shared state. The same frame and options
// always serialize to the same bytes. Any stage failing fails the whole run.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::assembler::{assemble, ResultRecord};
use crate::error::PipelineError;
use crate::indicators::{compute, EngineParams};
use crate::market_data::{normalize, RawFrame};

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    /// Apply display rounding to every record.
    pub round_output: bool,
    pub params: EngineParams,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            round_output: true,
            params: EngineParams::default(),
        }
    }
}

/// Per-ticker analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub ticker: String,
    pub latest: ResultRecord,
    pub records: Vec<ResultRecord>,
}

/// Normalize, compute and assemble `frame` for `ticker`.
///
/// # Errors
/// Whatever the first failing stage reports: `EmptyInput` / `NoValidRows`
/// from normalization, `InsufficientData` from the engine.
pub fn run(
    ticker: &str,
    frame: &RawFrame,
    options: &PipelineOptions,
) -> Result<Analysis, PipelineError> {
    let series = normalize(ticker, frame)?;
    let indicators = compute(&series, &options.params)?;
    let assembled = assemble(&series, &indicators)?;

    let (records, latest) = if options.round_output {
        (
            assembled.records.iter().map(ResultRecord::rounded).collect(),
            assembled.latest.rounded(),
        )
    } else {
        (assembled.records, assembled.latest)
    };

    debug!(ticker, rows = records.len(), rounded = options.round_output, "pipeline complete");

    Ok(Analysis {
        ticker: ticker.to_string(),
        latest,
        records,
    })
}

// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator implementations. Every public series
// function returns an `IndicatorSeries` aligned 1:1 with its input: slot `i`
// depends only on inputs `0..=i`, and slots inside the warm-up window hold
// `None` rather than a placeholder number.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;

pub use engine::{compute, EngineParams, IndicatorSet};

/// One value per bar; `None` marks positions where the indicator is undefined.
pub type IndicatorSeries = Vec<Option<f64>>;

/// `Some(v)` for finite `v`, otherwise `None`.
pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Index of the first defined slot, if any.
#[cfg(test)]
pub(crate) fn first_defined(series: &[Option<f64>]) -> Option<usize> {
    series.iter().position(Option::is_some)
}

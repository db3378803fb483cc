// =============================================================================
// Indicator Engine
// =============================================================================
//
// Computes the fixed indicator set for one BarSeries. Each indicator reads
// only the bar columns it needs and none reads another's output, so the set
// can be produced in any order. Short series never fail here: an indicator
// whose warm-up exceeds the series length is simply all-undefined.
//
// Minimum samples with the default parameters:
//
//   sma50 50 | sma200 200 | bollinger 20 | macd line 26 | macd signal 34
//   rsi 15   | atr 15     | obv 2
// =============================================================================

use tracing::debug;

use super::atr::calculate_atr;
use super::bollinger::calculate_bollinger;
use super::macd::{calculate_macd, MacdConfig};
use super::obv::calculate_obv;
use super::rsi::calculate_rsi;
use super::sma::calculate_sma;
use super::IndicatorSeries;
use crate::error::PipelineError;
use crate::market_data::BarSeries;

/// Window parameters for the published indicator set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub macd: MacdConfig,
    pub rsi_period: usize,
    pub atr_period: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            sma_fast: 50,
            sma_slow: 200,
            bollinger_period: 20,
            bollinger_std: 2.0,
            macd: MacdConfig::default(),
            rsi_period: 14,
            atr_period: 14,
        }
    }
}

/// Every published indicator, each aligned 1:1 with the source bars.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub sma50: IndicatorSeries,
    pub sma200: IndicatorSeries,
    pub bb_high: IndicatorSeries,
    pub bb_mid: IndicatorSeries,
    pub bb_low: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub macd_signal: IndicatorSeries,
    pub macd_hist: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub atr: IndicatorSeries,
    pub obv: IndicatorSeries,
}

/// Compute the indicator set for `series`.
///
/// # Errors
/// [`PipelineError::InsufficientData`] when the series has fewer than two
/// bars; OBV and ATR both need a previous bar.
pub fn compute(series: &BarSeries, params: &EngineParams) -> Result<IndicatorSet, PipelineError> {
    let rows = series.len();
    if rows < 2 {
        return Err(PipelineError::InsufficientData { rows });
    }

    let closes = series.closes();
    let highs = series.highs();
    let lows = series.lows();
    let volumes = series.volumes();

    let bollinger = calculate_bollinger(&closes, params.bollinger_period, params.bollinger_std);
    let macd = calculate_macd(&closes, params.macd);

    let set = IndicatorSet {
        sma50: calculate_sma(&closes, params.sma_fast),
        sma200: calculate_sma(&closes, params.sma_slow),
        bb_high: bollinger.upper,
        bb_mid: bollinger.middle,
        bb_low: bollinger.lower,
        macd: macd.line,
        macd_signal: macd.signal,
        macd_hist: macd.histogram,
        rsi: calculate_rsi(&closes, params.rsi_period),
        atr: calculate_atr(&highs, &lows, &closes, params.atr_period),
        obv: calculate_obv(&closes, &volumes),
    };

    debug!(
        ticker = series.ticker(),
        rows,
        sma200_defined = set.sma200.iter().flatten().count(),
        macd_defined = set.macd.iter().flatten().count(),
        "indicators computed"
    );

    Ok(set)
}

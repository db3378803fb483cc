// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   line      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal) of the defined part of `line`
//   histogram = line - signal
//
// With the standard 12/26/9 configuration the line is first defined at index
// 25 (26 samples) and the signal/histogram at index 33 (26 + 9 - 1 samples).
// The EMAs are private to this module; nothing else reads them.

use super::ema::{calculate_ema, ema_series};
use super::IndicatorSeries;

/// MACD period configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// The three aligned MACD outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Compute MACD over `closes`.
///
/// Any zero period leaves every output undefined. Series too short for the
/// slow EMA produce an all-`None` line; too short for the signal EMA, an
/// all-`None` signal and histogram.
pub fn calculate_macd(closes: &[f64], config: MacdConfig) -> MacdSeries {
    let len = closes.len();
    let mut out = MacdSeries {
        line: vec![None; len],
        signal: vec![None; len],
        histogram: vec![None; len],
    };
    if config.fast == 0 || config.slow == 0 || config.signal == 0 {
        return out;
    }

    let fast = ema_series(closes, config.fast);
    let slow = ema_series(closes, config.slow);
    for i in 0..len {
        if let (Some(f), Some(s)) = (fast[i], slow[i]) {
            out.line[i] = Some(f - s);
        }
    }

    // The line is contiguous once defined, so its defined tail can be fed to
    // the signal EMA directly.
    let Some(start) = out.line.iter().position(Option::is_some) else {
        return out;
    };
    let defined: Vec<f64> = out.line[start..].iter().map_while(|v| *v).collect();

    for (j, sig) in calculate_ema(&defined, config.signal).into_iter().enumerate() {
        let i = start + config.signal - 1 + j;
        out.signal[i] = Some(sig);
        out.histogram[i] = out.line[i].map(|l| l - sig);
    }

    out
}

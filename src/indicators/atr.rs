// =============================================================================
// Average True Range (ATR), Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar after the first:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_period = mean of TR_1 ..= TR_period
//   ATR_t      = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// The first value lands at index `period` (period + 1 bars consumed).
// =============================================================================

use super::{finite, IndicatorSeries};

/// Compute the ATR series from aligned `high`, `low`, `close` slices.
///
/// All three slices must have the same length; the shortest one bounds the
/// output otherwise. Returns all `None` when `period` is zero or there are
/// fewer than `period + 1` bars. A non-finite intermediate ends the series.
pub fn calculate_atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> IndicatorSeries {
    let len = high.len().min(low.len()).min(close.len());
    let mut out = vec![None; len];
    if period == 0 || len < period + 1 {
        return out;
    }

    // --- Step 1: True Range for each consecutive pair ------------------------
    let tr: Vec<f64> = (1..len)
        .map(|i| true_range(high[i], low[i], close[i - 1]))
        .collect();

    // --- Step 2: Seed with the simple mean of the first `period` TRs --------
    let period_f = period as f64;
    let Some(seed) = finite(tr[..period].iter().sum::<f64>() / period_f) else {
        return out;
    };
    out[period] = Some(seed);

    // --- Step 3: Wilder's smoothing for the remaining TRs -------------------
    // tr[k] belongs to bar k + 1.
    let mut atr = seed;
    for (k, &range) in tr.iter().enumerate().skip(period) {
        atr = (atr * (period_f - 1.0) + range) / period_f;
        match finite(atr) {
            Some(v) => out[k + 1] = Some(v),
            None => break,
        }
    }

    out
}

fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running volume total seeded at 0 on the first bar:
//   close_t > close_{t-1}  =>  OBV_t = OBV_{t-1} + volume_t
//   close_t < close_{t-1}  =>  OBV_t = OBV_{t-1} - volume_t
//   otherwise              =>  OBV_t = OBV_{t-1}
//
// The first bar has no previous close, so slot 0 is undefined and the first
// published value is at index 1.

use std::cmp::Ordering;

use super::IndicatorSeries;

/// Compute OBV from aligned `close` and `volume` slices.
pub fn calculate_obv(close: &[f64], volume: &[f64]) -> IndicatorSeries {
    let len = close.len().min(volume.len());
    let mut out = vec![None; len];
    if len < 2 {
        return out;
    }

    let mut running = 0.0_f64;
    for i in 1..len {
        match close[i].partial_cmp(&close[i - 1]) {
            Some(Ordering::Greater) => running += volume[i],
            Some(Ordering::Less) => running -= volume[i],
            _ => {}
        }
        out[i] = Some(running);
    }
    out
}

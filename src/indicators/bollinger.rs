// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ). σ is the POPULATION standard deviation of the
// same trailing window (divide by n, not n - 1).

use super::{finite, IndicatorSeries};

/// Aligned Bollinger outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Calculate Bollinger Bands for `closes`.
///
/// Slots before `period - 1` are `None` in all three bands. For `num_std > 0`
/// every defined slot satisfies `upper >= middle >= lower`.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerSeries {
    let len = closes.len();
    let mut out = BollingerSeries {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if period == 0 || len < period {
        return out;
    }

    let n = period as f64;
    for (offset, window) in closes.windows(period).enumerate() {
        let i = offset + period - 1;
        let middle = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let (Some(m), Some(u), Some(l)) = (
            finite(middle),
            finite(middle + num_std * std_dev),
            finite(middle - num_std * std_dev),
        ) else {
            continue;
        };
        out.middle[i] = Some(m);
        out.upper[i] = Some(u);
        out.lower[i] = Some(l);
    }

    out
}

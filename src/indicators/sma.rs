// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_t = (close_{t-n+1} + ... + close_t) / n
//
// Each window is summed directly; there is no running sum to drift.

use super::{finite, IndicatorSeries};

/// Compute the SMA series for `closes` over `period`.
///
/// Slots `0..period-1` are `None`; every slot from `period - 1` on is the
/// mean of the trailing `period` closes. A zero period or a series shorter
/// than `period` yields all `None`.
pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    let divisor = period as f64;
    for (offset, window) in closes.windows(period).enumerate() {
        out[offset + period - 1] = finite(window.iter().sum::<f64>() / divisor);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::first_defined;

    #[test]
    fn sma_three_over_five_closes() {
        let sma = calculate_sma(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert_eq!(sma[2], Some(11.0));
        assert_eq!(sma[3], Some(12.0));
        assert_eq!(sma[4], Some(13.0));
    }

    #[test]
    fn sma_matches_hand_computed_window() {
        let closes = [44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10];
        let sma = calculate_sma(&closes, 4);
        let expected = (43.61 + 44.33 + 44.83 + 45.10) / 4.0;
        assert!((sma[6].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn sma_warm_up_boundary() {
        let closes: Vec<f64> = (1..=60).map(f64::from).collect();
        let sma = calculate_sma(&closes, 50);
        assert_eq!(sma.len(), 60);
        assert_eq!(first_defined(&sma), Some(49));
        assert!(sma[49..].iter().all(Option::is_some));
    }

    #[test]
    fn sma_short_input_all_undefined() {
        let sma = calculate_sma(&[1.0, 2.0], 3);
        assert_eq!(sma, vec![None, None]);
    }

    #[test]
    fn sma_period_zero_all_undefined() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let closes = [3.0, 1.5, 8.25];
        let sma = calculate_sma(&closes, 1);
        assert_eq!(sma, vec![Some(3.0), Some(1.5), Some(8.25)]);
    }
}

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One normalized OHLCV sample. Every numeric field is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Normalized bars for one ticker, strictly ascending by timestamp with no
/// duplicates. Only the normalizer builds one from raw input, so the ordering
/// invariant holds for every instance handed to the indicator engine.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub(crate) fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Daily bars starting 2024-01-02 with open = high = low = close.
    #[cfg(test)]
    pub fn from_closes(closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .map(|&c| (c, c, c, 1_000.0))
            .collect::<Vec<_>>();
        Self::from_hlcv(&bars)
    }

    /// Daily bars from `(high, low, close, volume)` tuples; open = close.
    #[cfg(test)]
    pub fn from_hlcv(rows: &[(f64, f64, f64, f64)]) -> Self {
        use chrono::TimeZone;

        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(high, low, close, volume))| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume,
            })
            .collect();
        Self::new("TEST", bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_accessors_follow_bar_order() {
        let series = BarSeries::from_hlcv(&[(11.0, 9.0, 10.0, 5.0), (12.0, 10.0, 11.0, 6.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 11.0]);
        assert_eq!(series.highs(), vec![11.0, 12.0]);
        assert_eq!(series.lows(), vec![9.0, 10.0]);
        assert_eq!(series.volumes(), vec![5.0, 6.0]);
        assert_eq!(series.ticker(), "TEST");
    }

    #[test]
    fn test_series_timestamps_ascend() {
        let series = BarSeries::from_closes(&[1.0, 2.0, 3.0]);
        assert!(series
            .bars()
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
    }
}

// =============================================================================
// Result Assembler
// =============================================================================
//
// Merges normalized bars with the indicator set into one record per bar plus a
// `latest` snapshot. Output is JSON-safe by construction: undefined indicator
// slots are `None` (serialized `null`), timestamps are RFC 3339 UTC strings.
//
// Two layouts are offered:
//   rows     : Vec<ResultRecord>, the canonical shape
//   columnar : ColumnarTimeseries, one array per field
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PipelineError;
use crate::indicators::{IndicatorSeries, IndicatorSet};
use crate::market_data::BarSeries;

/// One output row: bar fields plus every indicator value at that position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub bb_high: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_low: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub obv: Option<f64>,
}

/// Decimal places applied by [`ResultRecord::rounded`].
const PRICE_DECIMALS: i32 = 2;
const MACD_DECIMALS: i32 = 4;
const RSI_DECIMALS: i32 = 2;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Rounding must never turn a finite value into a non-finite one.
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

impl ResultRecord {
    /// Copy with display rounding: prices, SMAs, bands and ATR to 2 places,
    /// MACD fields to 4, RSI to 2. Volume and OBV are left untouched.
    pub fn rounded(&self) -> Self {
        let price = |v: f64| round_to(v, PRICE_DECIMALS);
        let opt = |v: Option<f64>, d: i32| v.map(|x| round_to(x, d));
        Self {
            timestamp: self.timestamp,
            open: price(self.open),
            high: price(self.high),
            low: price(self.low),
            close: price(self.close),
            volume: self.volume,
            sma50: opt(self.sma50, PRICE_DECIMALS),
            sma200: opt(self.sma200, PRICE_DECIMALS),
            bb_high: opt(self.bb_high, PRICE_DECIMALS),
            bb_mid: opt(self.bb_mid, PRICE_DECIMALS),
            bb_low: opt(self.bb_low, PRICE_DECIMALS),
            macd: opt(self.macd, MACD_DECIMALS),
            macd_signal: opt(self.macd_signal, MACD_DECIMALS),
            macd_hist: opt(self.macd_hist, MACD_DECIMALS),
            rsi: opt(self.rsi, RSI_DECIMALS),
            atr: opt(self.atr, PRICE_DECIMALS),
            obv: self.obv,
        }
    }
}

/// Assembled rows plus the final-row snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assembled {
    pub records: Vec<ResultRecord>,
    pub latest: ResultRecord,
}

fn at(series: &IndicatorSeries, i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

/// Merge `series` and `set` position by position.
///
/// # Errors
/// [`PipelineError::EmptySeries`] when `series` has no bars.
pub fn assemble(series: &BarSeries, set: &IndicatorSet) -> Result<Assembled, PipelineError> {
    let records: Vec<ResultRecord> = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| ResultRecord {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma50: at(&set.sma50, i),
            sma200: at(&set.sma200, i),
            bb_high: at(&set.bb_high, i),
            bb_mid: at(&set.bb_mid, i),
            bb_low: at(&set.bb_low, i),
            macd: at(&set.macd, i),
            macd_signal: at(&set.macd_signal, i),
            macd_hist: at(&set.macd_hist, i),
            rsi: at(&set.rsi, i),
            atr: at(&set.atr, i),
            obv: at(&set.obv, i),
        })
        .collect();

    let latest = records.last().cloned().ok_or(PipelineError::EmptySeries)?;
    Ok(Assembled { records, latest })
}

// ---------------------------------------------------------------------------
// Columnar layout
// ---------------------------------------------------------------------------

/// The same data as [`ResultRecord`]s, one array per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnarTimeseries {
    pub dates: Vec<DateTime<Utc>>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub sma50: Vec<Option<f64>>,
    pub sma200: Vec<Option<f64>>,
    pub bb_high: Vec<Option<f64>>,
    pub bb_mid: Vec<Option<f64>>,
    pub bb_low: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub obv: Vec<Option<f64>>,
}

impl ColumnarTimeseries {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut cols = Self::default();
        for r in records {
            cols.dates.push(r.timestamp);
            cols.open.push(r.open);
            cols.high.push(r.high);
            cols.low.push(r.low);
            cols.close.push(r.close);
            cols.volume.push(r.volume);
            cols.sma50.push(r.sma50);
            cols.sma200.push(r.sma200);
            cols.bb_high.push(r.bb_high);
            cols.bb_mid.push(r.bb_mid);
            cols.bb_low.push(r.bb_low);
            cols.macd.push(r.macd);
            cols.macd_signal.push(r.macd_signal);
            cols.macd_hist.push(r.macd_hist);
            cols.rsi.push(r.rsi);
            cols.atr.push(r.atr);
            cols.obv.push(r.obv);
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{compute, EngineParams};

    fn assembled(closes: &[f64]) -> Assembled {
        let series = BarSeries::from_closes(closes);
        let set = compute(&series, &EngineParams::default()).unwrap();
        assemble(&series, &set).unwrap()
    }

    #[test]
    fn one_record_per_bar_and_latest_is_last() {
        let closes: Vec<f64> = (0..40).map(|i| 20.0 + i as f64).collect();
        let out = assembled(&closes);
        assert_eq!(out.records.len(), 40);
        assert_eq!(out.latest, out.records[39]);
        assert_eq!(out.latest.close, 59.0);
    }

    #[test]
    fn empty_series_fails() {
        let series = BarSeries::new("EMPTY", Vec::new());
        let set = IndicatorSet {
            sma50: vec![],
            sma200: vec![],
            bb_high: vec![],
            bb_mid: vec![],
            bb_low: vec![],
            macd: vec![],
            macd_signal: vec![],
            macd_hist: vec![],
            rsi: vec![],
            atr: vec![],
            obv: vec![],
        };
        assert_eq!(assemble(&series, &set).unwrap_err(), PipelineError::EmptySeries);
    }

    #[test]
    fn undefined_values_serialize_as_null() {
        let out = assembled(&[10.0, 11.0, 12.0]);
        let v = serde_json::to_value(&out.records[0]).unwrap();
        assert!(v["sma50"].is_null());
        assert!(v["obv"].is_null());
        assert_eq!(v["close"], serde_json::json!(10.0));

        let second = serde_json::to_value(&out.records[1]).unwrap();
        assert_eq!(second["obv"], serde_json::json!(1000.0));
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let out = assembled(&[10.0, 11.0]);
        let v = serde_json::to_value(&out.records[0]).unwrap();
        assert_eq!(v["timestamp"], "2024-01-02T00:00:00Z");
    }

    #[test]
    fn rounding_applies_per_field_class() {
        let mut record = assembled(&[10.0, 11.0]).latest;
        record.close = 101.23456;
        record.volume = 1234.5678;
        record.macd = Some(0.123456);
        record.rsi = Some(55.5555);
        record.obv = Some(-98765.4321);
        record.sma50 = None;

        let r = record.rounded();
        assert_eq!(r.close, 101.23);
        assert_eq!(r.volume, 1234.5678);
        assert_eq!(r.macd, Some(0.1235));
        assert_eq!(r.rsi, Some(55.56));
        assert_eq!(r.obv, Some(-98765.4321));
        assert_eq!(r.sma50, None);
    }

    #[test]
    fn columnar_layout_mirrors_rows() {
        let closes: Vec<f64> = (0..30).map(|i| 5.0 + i as f64 * 0.25).collect();
        let out = assembled(&closes);
        let cols = ColumnarTimeseries::from_records(&out.records);
        assert_eq!(cols.dates.len(), 30);
        assert_eq!(cols.close[29], out.records[29].close);
        assert_eq!(cols.rsi[29], out.records[29].rsi);
        assert_eq!(cols.macd[10], None);
        assert_eq!(cols.obv[0], None);
    }
}

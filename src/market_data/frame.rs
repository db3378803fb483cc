// =============================================================================
// Raw Frames: upstream bar payloads before normalization
// =============================================================================
//
// Upstreams deliver bars as a "split" frame:
//
//   {
//     "columns": ["Open", ["Close", "AAPL"], "Volume", ...],
//     "index":   ["2024-01-02T00:00:00Z", 1704240000, ...],
//     "data":    [[185.1, 185.6, 82488700], ...]
//   }
//
// Column headers may be single names or multi-level tuples; cells may be
// numbers, numeric strings, or null. Nothing here decides which column is
// "close"; that is the normalizer's job.
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::types::value_as_f64;

/// Integer epochs at or above this magnitude are milliseconds, below it
/// seconds. 10^11 seconds is year 5138; 10^11 milliseconds is March 1973.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A column header: a plain name or a multi-level tuple whose first level is
/// the field name (e.g. `["Close", "AAPL"]`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnName {
    Single(String),
    Levels(Vec<String>),
}

impl ColumnName {
    /// The top-level name this header collapses to.
    pub fn first_level(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()),
            Self::Levels(levels) => levels.first().map(String::as_str),
        }
    }
}

/// A row timestamp as the upstream sent it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

impl RawTimestamp {
    /// Resolve to a UTC instant.
    ///
    /// Accepts RFC 3339, naive ISO date-times (taken as UTC), plain
    /// `YYYY-MM-DD` dates (midnight UTC), and integer epochs in seconds or
    /// milliseconds. Returns `None` for anything else.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(n) if n.abs() >= EPOCH_MILLIS_THRESHOLD => {
                Utc.timestamp_millis_opt(*n).single()
            }
            Self::Epoch(n) => Utc.timestamp_opt(*n, 0).single(),
            Self::Text(s) => parse_text_timestamp(s.trim()),
        }
    }
}

fn parse_text_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Raw bars in split layout. `index[i]` is the timestamp of `data[i]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFrame {
    #[serde(default)]
    pub columns: Vec<ColumnName>,
    #[serde(default)]
    pub index: Vec<RawTimestamp>,
    #[serde(default)]
    pub data: Vec<Vec<serde_json::Value>>,
}

impl RawFrame {
    /// Number of data rows as received.
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Timestamp of row `row`, if present and parseable.
    pub fn timestamp(&self, row: usize) -> Option<DateTime<Utc>> {
        self.index.get(row).and_then(RawTimestamp::resolve)
    }

    /// Cell `(row, col)` as a finite number.
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get(row)?.get(col).and_then(value_as_f64)
    }

    /// Latest parseable timestamp in the frame.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        (0..self.row_count()).filter_map(|i| self.timestamp(i)).max()
    }

    /// Drop rows whose timestamp is known to precede `start`. Rows with an
    /// unparseable timestamp are left for the normalizer to reject.
    pub fn retain_since(&mut self, start: DateTime<Utc>) {
        let keep: Vec<bool> = (0..self.row_count())
            .map(|i| self.timestamp(i).map_or(true, |ts| ts >= start))
            .collect();

        let mut rows = keep.iter();
        self.data.retain(|_| *rows.next().unwrap_or(&true));
        let mut stamps = keep.iter();
        self.index.retain(|_| *stamps.next().unwrap_or(&true));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn split_frame_deserializes_mixed_headers() {
        let frame: RawFrame = serde_json::from_value(json!({
            "columns": ["Open", ["Close", "AAPL"]],
            "index": ["2024-01-02", 1704240000],
            "data": [[1.0, 2.0], ["3.5", null]]
        }))
        .unwrap();

        assert_eq!(frame.columns[0].first_level(), Some("Open"));
        assert_eq!(frame.columns[1].first_level(), Some("Close"));
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.cell(1, 0), Some(3.5));
        assert_eq!(frame.cell(1, 1), None);
        assert_eq!(frame.cell(5, 0), None);
    }

    #[test]
    fn timestamp_formats_resolve_to_utc() {
        let want = ts(2024, 1, 2);
        for raw in [
            RawTimestamp::Text("2024-01-02".into()),
            RawTimestamp::Text("2024-01-02T00:00:00.000".into()),
            RawTimestamp::Text("2024-01-02 00:00:00".into()),
            RawTimestamp::Text("2024-01-02T00:00:00Z".into()),
            RawTimestamp::Text("2024-01-01T19:00:00-05:00".into()),
            RawTimestamp::Epoch(1_704_153_600),
            RawTimestamp::Epoch(1_704_153_600_000),
        ] {
            assert_eq!(raw.resolve(), Some(want), "failed for {raw:?}");
        }
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert_eq!(RawTimestamp::Text("yesterday".into()).resolve(), None);
        assert_eq!(RawTimestamp::Text(String::new()).resolve(), None);
    }

    #[test]
    fn empty_level_list_has_no_name() {
        assert_eq!(ColumnName::Levels(vec![]).first_level(), None);
    }

    #[test]
    fn retain_since_drops_only_older_rows() {
        let mut frame: RawFrame = serde_json::from_value(json!({
            "columns": ["Close"],
            "index": ["2024-01-01", "not-a-date", "2024-02-01", "2024-03-01"],
            "data": [[1.0], [2.0], [3.0], [4.0]]
        }))
        .unwrap();

        frame.retain_since(ts(2024, 1, 15));

        assert_eq!(frame.row_count(), 3);
        assert_eq!(frame.index.len(), 3);
        assert_eq!(frame.cell(0, 0), Some(2.0));
        assert_eq!(frame.cell(2, 0), Some(4.0));
        assert_eq!(frame.last_timestamp(), Some(ts(2024, 3, 1)));
    }
}

// =============================================================================
// Bar Normalizer
// =============================================================================
//
// Turns a RawFrame into a BarSeries. Column identity is decided exactly once
// per frame, before any row is read:
//
//   1. Collapse every header to its first level.
//   2. Map names to fields case-insensitively, ignoring spaces/punctuation.
//   3. When two headers collapse to the same field, the first one wins.
//
// Per-row repair, in order:
//   close missing          -> adjusted close
//   volume missing         -> 0
//   open/high/low missing  -> close
//
// Rows with no resolvable close, no parseable timestamp, a duplicate
// timestamp, or a timestamp earlier than the previous kept row are dropped.
// Input order is otherwise preserved; nothing is re-sorted.
// =============================================================================

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::bar::{Bar, BarSeries};
use super::frame::{ColumnName, RawFrame};
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

fn field_for(name: &str) -> Option<Field> {
    let key: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match key.as_str() {
        "open" => Some(Field::Open),
        "high" => Some(Field::High),
        "low" => Some(Field::Low),
        "close" => Some(Field::Close),
        "adjclose" | "adjustedclose" => Some(Field::AdjClose),
        "volume" => Some(Field::Volume),
        _ => None,
    }
}

/// Column position of each known field within a frame's rows.
#[derive(Debug, Default, PartialEq, Eq)]
struct ColumnMap {
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl ColumnMap {
    fn from_columns(columns: &[ColumnName]) -> Self {
        let mut map = Self::default();
        for (idx, column) in columns.iter().enumerate() {
            let Some(field) = column.first_level().and_then(field_for) else {
                continue;
            };
            let slot = match field {
                Field::Open => &mut map.open,
                Field::High => &mut map.high,
                Field::Low => &mut map.low,
                Field::Close => &mut map.close,
                Field::AdjClose => &mut map.adj_close,
                Field::Volume => &mut map.volume,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }
}

#[derive(Debug, Default)]
struct DropCounts {
    no_close: usize,
    bad_timestamp: usize,
    duplicate: usize,
    out_of_order: usize,
}

impl DropCounts {
    fn total(&self) -> usize {
        self.no_close + self.bad_timestamp + self.duplicate + self.out_of_order
    }
}

/// Normalize `frame` into a [`BarSeries`] for `ticker`.
///
/// # Errors
/// - [`PipelineError::EmptyInput`] when the frame has zero rows.
/// - [`PipelineError::NoValidRows`] when every row is dropped.
pub fn normalize(ticker: &str, frame: &RawFrame) -> Result<BarSeries, PipelineError> {
    if frame.row_count() == 0 {
        return Err(PipelineError::EmptyInput);
    }

    let columns = ColumnMap::from_columns(&frame.columns);
    if columns.close.is_none() && columns.adj_close.is_none() {
        warn!(ticker, "frame has neither a close nor an adjusted close column");
    }

    let cell = |row: usize, col: Option<usize>| col.and_then(|c| frame.cell(row, c));

    let mut bars: Vec<Bar> = Vec::with_capacity(frame.row_count());
    let mut dropped = DropCounts::default();

    for row in 0..frame.row_count() {
        let Some(timestamp) = frame.timestamp(row) else {
            dropped.bad_timestamp += 1;
            continue;
        };

        let Some(close) = cell(row, columns.close).or_else(|| cell(row, columns.adj_close)) else {
            dropped.no_close += 1;
            continue;
        };

        if let Some(prev) = bars.last() {
            match timestamp.cmp(&prev.timestamp) {
                Ordering::Greater => {}
                Ordering::Equal => {
                    dropped.duplicate += 1;
                    continue;
                }
                Ordering::Less => {
                    dropped.out_of_order += 1;
                    continue;
                }
            }
        }

        bars.push(Bar {
            timestamp,
            open: cell(row, columns.open).unwrap_or(close),
            high: cell(row, columns.high).unwrap_or(close),
            low: cell(row, columns.low).unwrap_or(close),
            close,
            volume: cell(row, columns.volume).unwrap_or(0.0),
        });
    }

    if dropped.total() > 0 {
        warn!(
            ticker,
            no_close = dropped.no_close,
            bad_timestamp = dropped.bad_timestamp,
            duplicate = dropped.duplicate,
            out_of_order = dropped.out_of_order,
            "dropped rows during normalization"
        );
    }

    if bars.is_empty() {
        return Err(PipelineError::NoValidRows);
    }

    debug!(ticker, rows = bars.len(), "bars normalized");
    Ok(BarSeries::new(ticker, bars))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

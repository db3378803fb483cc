// =============================================================================
// Span Resolver
// =============================================================================
//
// Maps a requested display span token to a sampling granularity and a lookback
// policy. The mapping is a static table: finer bars for short spans, coarser
// bars for long ones. Tokens are matched case-insensitively after trimming.
//
//   tokens                      span        granularity  lookback
//   intraday | 1d | day         intraday    5m           1 day
//   week | 1w | 5d              week        30m          7 days
//   month | 1mo | 1m            month       1h           1 month
//   quarter | 3mo               quarter     1d           3 months
//   6mo | halfyear              6mo         1d           6 months
//   ytd | year-to-date          ytd         1d           since Jan 1 (UTC)
//   year | 1y                   year        1d           12 months
//   2y                          2y          1d           24 months  <- default
//   5y                          5y          1wk          60 months
//   max | all                   max         1mo          unbounded
//
// Unknown tokens are not an error; they resolve to the 2y / daily default.
// =============================================================================

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

/// A display span, serialized as its canonical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Span {
    #[serde(rename = "intraday")]
    Intraday,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "6mo")]
    HalfYear,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

/// Bar sampling interval, serialized as the upstream interval label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Granularity {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveMinutes => "5m",
            Self::ThirtyMinutes => "30m",
            Self::Hourly => "1h",
            Self::Daily => "1d",
            Self::Weekly => "1wk",
            Self::Monthly => "1mo",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far back from "now" a span reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Days(u32),
    Months(u32),
    YearToDate,
    Unbounded,
}

impl Lookback {
    /// First instant inside the window ending at `now`; `None` when unbounded.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::Days(n) => Some(now - Duration::days(i64::from(n))),
            Self::Months(n) => now.checked_sub_months(Months::new(n)),
            Self::YearToDate => Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single(),
            Self::Unbounded => None,
        }
    }
}

/// Resolved sampling policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanConfig {
    pub span: Span,
    pub granularity: Granularity,
    pub lookback: Lookback,
}

/// Fallback for unknown or absent tokens.
pub const DEFAULT_SPAN: SpanConfig = SpanConfig {
    span: Span::TwoYears,
    granularity: Granularity::Daily,
    lookback: Lookback::Months(24),
};

struct SpanEntry {
    tokens: &'static [&'static str],
    config: SpanConfig,
}

const fn entry(
    tokens: &'static [&'static str],
    span: Span,
    granularity: Granularity,
    lookback: Lookback,
) -> SpanEntry {
    SpanEntry {
        tokens,
        config: SpanConfig {
            span,
            granularity,
            lookback,
        },
    }
}

const SPAN_TABLE: &[SpanEntry] = &[
    entry(&["intraday", "1d", "day"], Span::Intraday, Granularity::FiveMinutes, Lookback::Days(1)),
    entry(&["week", "1w", "5d"], Span::Week, Granularity::ThirtyMinutes, Lookback::Days(7)),
    entry(&["month", "1mo", "1m"], Span::Month, Granularity::Hourly, Lookback::Months(1)),
    entry(&["quarter", "3mo"], Span::Quarter, Granularity::Daily, Lookback::Months(3)),
    entry(&["6mo", "halfyear"], Span::HalfYear, Granularity::Daily, Lookback::Months(6)),
    entry(&["ytd", "year-to-date"], Span::YearToDate, Granularity::Daily, Lookback::YearToDate),
    entry(&["year", "1y"], Span::Year, Granularity::Daily, Lookback::Months(12)),
    entry(&["2y"], Span::TwoYears, Granularity::Daily, Lookback::Months(24)),
    entry(&["5y"], Span::FiveYears, Granularity::Weekly, Lookback::Months(60)),
    entry(&["max", "all"], Span::Max, Granularity::Monthly, Lookback::Unbounded),
];

/// Look `token` up in the span table.
pub fn try_resolve(token: &str) -> Option<SpanConfig> {
    let wanted = token.trim().to_lowercase();
    SPAN_TABLE
        .iter()
        .find(|e| e.tokens.iter().any(|t| *t == wanted))
        .map(|e| e.config)
}

/// Resolve `token`, falling back to [`DEFAULT_SPAN`] for unknown tokens.
pub fn resolve(token: &str) -> SpanConfig {
    try_resolve(token).unwrap_or_else(|| {
        debug!(token, "unknown span token, using default");
        DEFAULT_SPAN
    })
}

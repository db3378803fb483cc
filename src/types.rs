// =============================================================================
// Shared types used across the TickerLens service
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};

/// Point-in-time fundamentals for a ticker. Every field is individually
/// nullable; upstreams routinely omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(rename = "marketCap", default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(rename = "trailingPE", default, deserialize_with = "lenient_f64")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", default, deserialize_with = "lenient_f64")]
    pub forward_pe: Option<f64>,
    #[serde(rename = "debtToEquity", default, deserialize_with = "lenient_f64")]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "dividendYield", default, deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,
    #[serde(rename = "fiftyTwoWeekHigh", default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(rename = "fiftyTwoWeekLow", default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_low: Option<f64>,
}

/// Where raw bars come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Generic HTTP upstream serving split-frame JSON.
    #[default]
    Http,
    /// Local directory of `{TICKER}.json` fixture files.
    Directory,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "directory" | "dir" => Ok(Self::Directory),
            other => Err(format!("unknown source kind '{other}'")),
        }
    }
}

/// Read a JSON value that may be a number or a numeric string as a finite
/// `f64`. Anything else (null, bool, "N/A", NaN) is `None`.
pub fn value_as_f64(val: &serde_json::Value) -> Option<f64> {
    let n = match val {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_as_f64))
}

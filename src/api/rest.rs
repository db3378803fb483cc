// =============================================================================
// REST API Endpoints (Axum 0.7)
// =============================================================================
//
//   GET /api/v1/health
//   GET /api/metrics/:ticker?span=<token>&layout=rows|columnar&fundamentals=true|false
//
// Query parameters are read leniently: an unknown span falls back to the
// default, an unknown layout means rows, an unparseable fundamentals flag
// means "use the configured default". The only error statuses are 404 (no
// data for the ticker) and 500 (anything else), always with `{"error": msg}`.
//
// CORS is permissive.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::assembler::{ColumnarTimeseries, ResultRecord};
use crate::error::PipelineError;
use crate::pipeline::{self, PipelineOptions};
use crate::service_config::ServiceConfig;
use crate::source::{with_timeout, BarSource};
use crate::span::{self, Granularity, Span};
use crate::types::Fundamentals;

/// Longest ticker symbol accepted, e.g. `BRK-B`, `^GSPC`, `EURUSD=X`.
const MAX_TICKER_LEN: usize = 15;

/// Immutable state shared by every handler.
pub struct ApiState {
    pub config: ServiceConfig,
    pub source: BarSource,
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/metrics/:ticker", get(metrics))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// A pipeline or source failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            warn!(error = %self.0, "request yielded no data");
            StatusCode::NOT_FOUND
        } else {
            error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct MetricsQuery {
    span: Option<String>,
    layout: Option<String>,
    fundamentals: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Rows,
    Columnar,
}

impl Layout {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "columnar" || s == "columns" => Self::Columnar,
            _ => Self::Rows,
        }
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Canonical ticker: trimmed, uppercased, 1..=15 symbol characters.
fn canonical_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    valid.then_some(ticker)
}

#[derive(Serialize)]
#[serde(untagged)]
enum Timeseries {
    Rows(Vec<ResultRecord>),
    Columnar(ColumnarTimeseries),
}

#[derive(Serialize)]
struct MetricsResponse {
    ticker: String,
    span: Span,
    granularity: Granularity,
    latest: ResultRecord,
    timeseries: Timeseries,
    #[serde(skip_serializing_if = "Option::is_none")]
    fundamentals: Option<Fundamentals>,
}

async fn metrics(
    State(state): State<Arc<ApiState>>,
    Path(raw_ticker): Path<String>,
    query: Option<Query<MetricsQuery>>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();

    let ticker = canonical_ticker(&raw_ticker).ok_or_else(|| PipelineError::NotFound {
        ticker: raw_ticker.trim().to_string(),
    })?;

    let config = &state.config;
    let span_cfg = span::resolve(query.span.as_deref().unwrap_or(&config.default_span));
    let layout = Layout::parse(query.layout.as_deref());
    let include_fundamentals =
        parse_flag(query.fundamentals.as_deref()).unwrap_or(config.include_fundamentals);
    let timeout = config.fetch_timeout();

    let frame = with_timeout(timeout, "bars", state.source.fetch_bars(&ticker, &span_cfg)).await?;

    let options = PipelineOptions {
        round_output: config.round_output,
        ..PipelineOptions::default()
    };
    let analysis = pipeline::run(&ticker, &frame, &options)?;

    let fundamentals = if include_fundamentals {
        let fetched =
            with_timeout(timeout, "fundamentals", state.source.fetch_fundamentals(&ticker)).await;
        match fetched {
            Ok(f) => Some(f),
            // Bars exist, so a ticker without fundamentals still gets a response.
            Err(PipelineError::NotFound { .. }) => {
                warn!(ticker = %ticker, "no fundamentals for ticker, returning nulls");
                Some(Fundamentals::default())
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        None
    };

    info!(
        ticker = %ticker,
        span = ?span_cfg.span,
        granularity = %span_cfg.granularity,
        rows = analysis.records.len(),
        layout = ?layout,
        "metrics served"
    );

    let timeseries = match layout {
        Layout::Rows => Timeseries::Rows(analysis.records),
        Layout::Columnar => Timeseries::Columnar(ColumnarTimeseries::from_records(&analysis.records)),
    };

    Ok(Json(MetricsResponse {
        ticker,
        span: span_cfg.span,
        granularity: span_cfg.granularity,
        latest: analysis.latest,
        timeseries,
        fundamentals,
    }))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectoryBarSource;
    use crate::types::SourceKind;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn daily_rows(n: usize) -> Value {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let index: Vec<String> = (0..n)
            .map(|i| (start + chrono::Duration::days(i as i64)).to_string())
            .collect();
        let data: Vec<Value> = (0..n)
            .map(|i| {
                let c = 50.0 + i as f64 * 0.4 + (i as f64 * 0.5).cos();
                json!([c, c + 1.0, c - 1.0, c, 10_000 + i * 10])
            })
            .collect();
        json!({
            "columns": ["Open", "High", "Low", "Close", "Volume"],
            "index": index,
            "data": data
        })
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let put = |name: &str, body: String| std::fs::write(dir.path().join(name), body).unwrap();
        put("AAPL.json", daily_rows(60).to_string());
        put(
            "AAPL.fundamentals.json",
            json!({ "marketCap": 3.1e12, "trailingPE": 29.5 }).to_string(),
        );
        put("ONE.json", daily_rows(1).to_string());
        put("NOFUND.json", daily_rows(30).to_string());
        put("BROKEN.json", "[1, 2".to_string());
        put(
            "EMPTY.json",
            json!({ "columns": ["Close"], "index": [], "data": [] }).to_string(),
        );
        dir
    }

    fn app(dir: &tempfile::TempDir) -> Router {
        let config = ServiceConfig {
            source: SourceKind::Directory,
            data_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        };
        let source = BarSource::Directory(DirectoryBarSource::new(dir.path()));
        router(Arc::new(ApiState { config, source }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["server_time"].is_i64());
    }

    #[tokio::test]
    async fn metrics_rows_layout_with_fundamentals() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/metrics/aapl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "AAPL");
        assert_eq!(body["span"], "2y");
        assert_eq!(body["granularity"], "1d");

        let rows = body["timeseries"].as_array().unwrap();
        assert_eq!(rows.len(), 60);
        assert_eq!(body["latest"], rows[59]);
        assert!(rows[0]["sma50"].is_null());
        assert!(!rows[59]["sma50"].is_null());
        assert_eq!(body["fundamentals"]["marketCap"], json!(3.1e12));
        assert!(body["fundamentals"]["forwardPE"].is_null());
    }

    #[tokio::test]
    async fn metrics_columnar_layout() {
        let dir = fixture();
        let (status, body) =
            get_json(app(&dir), "/api/metrics/AAPL?layout=columnar&fundamentals=false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeseries"]["dates"].as_array().unwrap().len(), 60);
        assert_eq!(body["timeseries"]["close"].as_array().unwrap().len(), 60);
        assert!(body.get("fundamentals").is_none());
    }

    #[tokio::test]
    async fn unknown_span_and_junk_params_fall_back() {
        let dir = fixture();
        let (status, body) = get_json(
            app(&dir),
            "/api/metrics/AAPL?span=banana&layout=diagonal&fundamentals=maybe",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["span"], "2y");
        assert!(body["timeseries"].is_array());
        assert!(body["fundamentals"].is_object());
    }

    #[tokio::test]
    async fn unknown_ticker_is_404() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/metrics/ZZZZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no data found for ticker: ZZZZ");
    }

    #[tokio::test]
    async fn invalid_or_blank_ticker_is_404() {
        let dir = fixture();
        let (status, _) = get_json(app(&dir), "/api/metrics/TOO_LONG_TICKER_NAME").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = get_json(app(&dir), "/api/metrics/%20%20").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn empty_and_single_row_frames_are_404() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/metrics/EMPTY").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no data returned");

        let (status, _) = get_json(app(&dir), "/api/metrics/ONE?fundamentals=false").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_source_file_is_500() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/metrics/BROKEN").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("upstream error"));
    }

    #[tokio::test]
    async fn missing_fundamentals_come_back_as_nulls() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/metrics/nofund").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "NOFUND");
        assert_eq!(body["timeseries"].as_array().unwrap().len(), 30);
        let fundamentals = body["fundamentals"].as_object().unwrap();
        assert_eq!(fundamentals.len(), 7);
        assert!(fundamentals.values().all(Value::is_null));

        let (status, body) = get_json(app(&dir), "/api/metrics/NOFUND?fundamentals=0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeseries"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn malformed_fundamentals_file_is_still_500() {
        let dir = fixture();
        std::fs::write(dir.path().join("NOFUND.fundamentals.json"), "{ oops").unwrap();
        let (status, body) = get_json(app(&dir), "/api/metrics/NOFUND").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("NOFUND.fundamentals.json"));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let dir = fixture();
        let (status, body) = get_json(app(&dir), "/api/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }

    #[test]
    fn ticker_canonicalisation() {
        assert_eq!(canonical_ticker("  brk-b "), Some("BRK-B".into()));
        assert_eq!(canonical_ticker("^gspc"), Some("^GSPC".into()));
        assert_eq!(canonical_ticker("eurusd=x"), Some("EURUSD=X".into()));
        assert_eq!(canonical_ticker(""), None);
        assert_eq!(canonical_ticker("a/b"), None);
    }

    #[test]
    fn lenient_query_parsing() {
        assert_eq!(Layout::parse(Some("COLUMNAR")), Layout::Columnar);
        assert_eq!(Layout::parse(Some("rows")), Layout::Rows);
        assert_eq!(Layout::parse(None), Layout::Rows);
        assert_eq!(parse_flag(Some("False")), Some(false));
        assert_eq!(parse_flag(Some("1")), Some(true));
        assert_eq!(parse_flag(Some("maybe")), None);
        assert_eq!(parse_flag(None), None);
    }
}

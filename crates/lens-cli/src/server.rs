//! Dashboard HTTP server
//!
//! Routes:
//! - `GET /` dashboard page, looks up when `query` is present
//! - `GET /api/analysis?query=&start=&end=` report as JSON
//! - `GET /api/export?query=&start=&end=` xlsx download
//! - `POST /api/directory/refresh` reload the company directory, keeping the
//!   current one if the reload fails
//! - `POST /api/prices/clear` forget cached price series
//! - `GET /health`

use crate::templates::{FormState, Notice, Pages};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use lens_stock::export::{self, XLSX_MIME};
use lens_stock::series::DEFAULT_START_DATE;
use lens_stock::{
    Dashboard, DashboardReport, ErrorKind, LookupRequest, StockError, parse_date_field,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state, passed to all route handlers via `State`
pub struct AppState {
    pub dashboard: Dashboard,
    pub pages: Pages,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> anyhow::Result<Arc<Self>> {
        Ok(Arc::new(Self {
            dashboard,
            pages: Pages::new()?,
        }))
    }
}

/// Unified error type for API responses
#[derive(Debug)]
pub enum ApiError {
    Lookup(StockError),
    Render(String),
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        Self::Lookup(err)
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        Self::Render(err.to_string())
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MissingInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::DirectoryUnavailable => StatusCode::BAD_GATEWAY,
        // informational: the lookup worked, there is just nothing to show
        ErrorKind::EmptyResult => StatusCode::OK,
        ErrorKind::UnexpectedFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Lookup(err) => {
                let kind = err.kind();
                if kind == ErrorKind::UnexpectedFailure {
                    tracing::error!("Lookup failed: {}", err);
                }
                let body = json!({
                    "kind": kind,
                    "severity": kind.severity(),
                    "message": err.to_string(),
                    "hint": err.hint(),
                    "empty": kind == ErrorKind::EmptyResult,
                });
                (status_for(kind), Json(body)).into_response()
            }
            Self::Render(message) => {
                tracing::error!("Template rendering failed: {}", message);
                let body = json!({ "kind": ErrorKind::UnexpectedFailure, "message": message });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Raw query string of a lookup; every field may be missing or blank
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    pub query: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl LookupParams {
    pub fn to_request(&self) -> Result<LookupRequest, StockError> {
        Ok(LookupRequest {
            query: self.query.clone().unwrap_or_default(),
            start: parse_date_field(self.start.as_deref())?,
            end: parse_date_field(self.end.as_deref())?,
        })
    }

    /// Echo of the submitted form, pre-filled with the default range
    fn form(&self, today: NaiveDate) -> FormState {
        let or_default = |value: &Option<String>, default: NaiveDate| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        FormState {
            query: self.query.clone().unwrap_or_default(),
            start: or_default(&self.start, DEFAULT_START_DATE),
            end: or_default(&self.end, today),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/analysis", get(analysis))
        .route("/api/export", get(export_xlsx))
        .route("/api/directory/refresh", post(refresh_directory))
        .route("/api/prices/clear", post(clear_prices))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, stopping");
}

async fn run_lookup(state: &AppState, params: &LookupParams) -> Result<DashboardReport, StockError> {
    let request = params.to_request()?;
    state.dashboard.run(&request).await
}

async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Html<String>, ApiError> {
    let today = Local::now().date_naive();
    let form = params.form(today);

    // first visit: form only
    if params.query.is_none() {
        return Ok(Html(state.pages.dashboard(&form, today, None, None)?));
    }

    let page = match run_lookup(&state, &params).await {
        Ok(report) => state.pages.dashboard(&form, today, Some(&report), None)?,
        Err(err) => {
            let notice = Notice::from(&err);
            state.pages.dashboard(&form, today, None, Some(&notice))?
        }
    };
    Ok(Html(page))
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<DashboardReport>, ApiError> {
    Ok(Json(run_lookup(&state, &params).await?))
}

async fn export_xlsx(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Response, ApiError> {
    let report = run_lookup(&state, &params).await?;
    let bytes = report.table.to_xlsx()?;
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&export::file_name(&report.company))
    );

    tracing::info!("Exporting {} rows for {}", report.table.len(), report.ticker);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn refresh_directory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let directory = state.dashboard.directory().refresh().await?;
    Ok(Json(json!({
        "available": true,
        "entries": directory.len(),
    })))
}

async fn clear_prices(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cleared = state.dashboard.clear_price_cache().await;
    Json(json!({ "cleared": cleared }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

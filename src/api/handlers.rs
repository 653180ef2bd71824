//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::analysis::{FilterConfig, Opportunity, ResultSet};
use crate::dashboard::{
    category_counts, filter_by_category, paginate, render_page, CategoryCounts, CategorySelection,
    Page, PAGE_SIZE,
};
use crate::error::PipelineError;
use crate::market::MarketSource;
use crate::pipeline;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether a snapshot has been published.
    pub ready: Arc<AtomicBool>,
    /// Latest published result set.
    pub snapshot: Arc<RwLock<Option<Arc<ResultSet>>>>,
    /// Error from the most recent failed refresh, cleared on success.
    pub last_error: Arc<RwLock<Option<String>>>,
    /// Prometheus recorder handle, when one is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(RwLock::new(None)),
            last_error: Arc::new(RwLock::new(None)),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Latest published result set.
    pub async fn snapshot(&self) -> Option<Arc<ResultSet>> {
        self.snapshot.read().await.clone()
    }

    /// Replace the published result set.
    pub async fn publish(&self, result: ResultSet) {
        *self.snapshot.write().await = Some(Arc::new(result));
        *self.last_error.write().await = None;
        self.set_ready(true);
    }

    /// Remember a refresh failure; the previous snapshot stays published.
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }

    /// Run the pipeline against `source` and publish the result.
    pub async fn refresh_from<S: MarketSource>(
        &self,
        source: &S,
        filters: &FilterConfig,
        base_url: &str,
    ) -> Result<(), PipelineError> {
        match pipeline::refresh_with_base(source, filters, base_url).await {
            Ok(result) => {
                self.publish(result).await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Refresh failed, keeping previous snapshot");
                self.record_error(e.to_string()).await;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ready", &self.is_ready())
            .field("prometheus", &self.prometheus.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// Whether a snapshot is available.
    pub ready: bool,
    /// When the current snapshot was generated.
    #[serde(with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
}

/// Status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// When the current snapshot was generated.
    #[serde(with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
    /// Opportunities in the current snapshot.
    pub total_count: usize,
    /// Fallback tier of the current snapshot.
    pub tier: Option<String>,
    /// Error from the most recent failed refresh.
    pub last_error: Option<String>,
}

/// Query parameters for the opportunities listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesQuery {
    /// Category label, or "All".
    pub category: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
    /// Items per page.
    pub page_size: Option<usize>,
}

/// One page of the current snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesResponse {
    /// When the snapshot was generated.
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Configured thresholds.
    pub filters: FilterConfig,
    /// Category counts over the whole snapshot.
    pub categories: CategoryCounts,
    /// Requested page.
    #[serde(flatten)]
    pub page: Page<Opportunity>,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once a snapshot exists, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let generated_at = state.snapshot().await.map(|s| s.generated_at);

    let response = ReadyResponse {
        ready: is_ready,
        generated_at,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns snapshot metadata and the last refresh error.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot().await;
    let last_error = state.last_error.read().await.clone();

    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        generated_at: snapshot.as_ref().map(|s| s.generated_at),
        total_count: snapshot.as_ref().map(|s| s.total_count).unwrap_or(0),
        tier: snapshot.as_ref().map(|s| s.tier.to_string()),
        last_error,
    })
}

/// Opportunities handler - category filter and pagination over the snapshot.
pub async fn opportunities(
    State(state): State<AppState>,
    Query(query): Query<OpportunitiesQuery>,
) -> Response {
    let Some(snapshot) = state.snapshot().await else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "no snapshot available yet");
    };

    let selection = match query
        .category
        .as_deref()
        .unwrap_or_default()
        .parse::<CategorySelection>()
    {
        Ok(selection) => selection,
        Err(_) => {
            warn!(category = ?query.category, "Unknown category requested");
            return error_response(StatusCode::BAD_REQUEST, "unknown category");
        }
    };

    let matching: Vec<Opportunity> = filter_by_category(&snapshot.opportunities, selection)
        .into_iter()
        .cloned()
        .collect();
    let page = paginate(
        &matching,
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(PAGE_SIZE),
    );

    Json(OpportunitiesResponse {
        generated_at: snapshot.generated_at,
        filters: snapshot.filters,
        categories: category_counts(&snapshot.opportunities),
        page,
    })
    .into_response()
}

/// Dashboard page handler - 503 until the first snapshot.
pub async fn index(State(state): State<AppState>) -> Response {
    let Some(snapshot) = state.snapshot().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Html("<!DOCTYPE html><html><body><p>Loading opportunities...</p></body></html>"),
        )
            .into_response();
    };

    match render_page(&snapshot) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render dashboard");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to render dashboard")
        }
    }
}

/// Prometheus metrics handler.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics recorder not installed"),
    }
}

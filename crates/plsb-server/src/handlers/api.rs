//! JSON API handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState};
use plsb_core::{compute, CachedDataset};

/// Response for GET /api/months
#[derive(Debug, Serialize)]
pub struct MonthsResponse {
    pub months: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    pub fingerprint: String,
}

/// GET /api/months - Months in sheet order
pub async fn list_months(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonthsResponse>, AppError> {
    let cached = state
        .source
        .dataset()
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(MonthsResponse {
        months: cached
            .dataset
            .months()
            .into_iter()
            .map(String::from)
            .collect(),
        fetched_at: cached.fetched_at,
        fingerprint: cached.fingerprint.clone(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    /// Month name exactly as it appears in the sheet
    pub month: Option<String>,
}

/// GET /api/metrics?month= - Metrics view for one month
///
/// Responses carry an ETag built from the dataset fingerprint, so clients
/// polling the same month get 304 until the sheet changes.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<MetricsQuery>,
) -> Result<Response, AppError> {
    let month = params
        .month
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing 'month' query parameter"))?;

    let cached = state
        .source
        .dataset()
        .await
        .map_err(AppError::from_core)?;
    let view = compute(&cached.dataset, month).map_err(AppError::from_core)?;

    let etag = format!("\"{}-{}\"", &cached.fingerprint[..16], view.position);
    let etag_value = HeaderValue::from_str(&etag)?;

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|tag| tag.trim() == etag))
        .unwrap_or(false);

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    Ok(([(header::ETAG, etag_value)], Json(view)).into_response())
}

/// Response for GET /api/status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub source: String,
    pub months: usize,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub fingerprint: String,
    pub cache_ttl_secs: u64,
}

fn status_response(state: &AppState, cached: &CachedDataset) -> StatusResponse {
    let months = cached.dataset.months();
    StatusResponse {
        source: state.source.name(),
        months: months.len(),
        first_month: months.first().map(|m| m.to_string()),
        last_month: months.last().map(|m| m.to_string()),
        fetched_at: cached.fetched_at,
        fingerprint: cached.fingerprint.clone(),
        cache_ttl_secs: state.source.ttl().as_secs(),
    }
}

/// GET /api/status - Data source status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    let cached = state
        .source
        .dataset()
        .await
        .map_err(AppError::from_core)?;
    Ok(Json(status_response(&state, &cached)))
}

/// Response for POST /api/refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(flatten)]
    pub status: StatusResponse,
    /// Whether the sheet content differs from the previously cached copy
    pub changed: bool,
}

/// POST /api/refresh - Fetch the sheet again, replacing the cached copy
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, AppError> {
    let before = state.source.cached().map(|c| c.fingerprint.clone());
    let cached = state
        .source
        .refresh()
        .await
        .map_err(AppError::from_core)?;
    let changed = before.as_deref() != Some(cached.fingerprint.as_str());

    info!(source = %state.source.name(), months = cached.dataset.len(), changed, "Sheet refreshed on request");
    Ok(Json(RefreshResponse {
        status: status_response(&state, &cached),
        changed,
    }))
}

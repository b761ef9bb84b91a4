// GET handlers: version, api/info, cpu-usage minute/hourly/daily

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::AppState;
use crate::error::QueryError;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/info: static host identity, read once at startup.
pub(super) async fn api_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.host_info.as_ref().clone())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DateTimeRange {
    start_date_time: Option<NaiveDateTime>,
    end_date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DateRange {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

/// GET /api/cpu-usage/minute?startDateTime=&endDateTime=
pub(super) async fn minute_usage_handler(
    State(state): State<AppState>,
    Query(range): Query<DateTimeRange>,
) -> Response {
    match state
        .query
        .get_minute_usage(range.start_date_time, range.end_date_time)
        .await
    {
        Ok(samples) => Json(samples).into_response(),
        Err(e) => query_error_response(e),
    }
}

/// GET /api/cpu-usage/hourly?startDate=&endDate=
pub(super) async fn hourly_usage_handler(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Response {
    match state
        .query
        .get_hourly_usage(range.start_date, range.end_date)
        .await
    {
        Ok(buckets) => Json(buckets).into_response(),
        Err(e) => query_error_response(e),
    }
}

/// GET /api/cpu-usage/daily?startDate=&endDate=
pub(super) async fn daily_usage_handler(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Response {
    match state
        .query
        .get_daily_usage(range.start_date, range.end_date)
        .await
    {
        Ok(buckets) => Json(buckets).into_response(),
        Err(e) => query_error_response(e),
    }
}

fn query_error_response(e: QueryError) -> Response {
    tracing::warn!(error = %e, cause = %e.cause(), "query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

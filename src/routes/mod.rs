// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::host_info::HostInfo;
use crate::query::QueryService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) query: Arc<QueryService>,
    pub(crate) host_info: Arc<HostInfo>,
}

pub fn app(query: Arc<QueryService>, host_info: Arc<HostInfo>) -> Router {
    let state = AppState { query, host_info };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/info", get(http::api_info_handler)) // GET /api/info
        .route("/api/cpu-usage/minute", get(http::minute_usage_handler))
        .route("/api/cpu-usage/hourly", get(http::hourly_usage_handler))
        .route("/api/cpu-usage/daily", get(http::daily_usage_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

//! neuroscan-server library
//!
//! HTTP service wrapping the MRI analysis pipeline: upload validation,
//! plausibility gate, classifier call, and the analysis history API.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use neuroscan_common::config::ServiceConfig;
use neuroscan_common::db::HistoryStore;

pub mod analysis;
pub mod api;
pub mod error;
pub mod services;

use analysis::AnalysisPipeline;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub store: HistoryStore,
    pub config: ServiceConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<AnalysisPipeline>, store: HistoryStore, config: ServiceConfig) -> Self {
        Self {
            pipeline,
            store,
            config,
        }
    }
}

/// Build application router.
///
/// CORS is permissive (the browser front-end runs on a different
/// origin) and the body limit is the configured maximum upload size.
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/predict", post(api::analyze::predict))
        .route("/predict_api", post(api::analyze::predict_api))
        .route("/history", get(api::history::list_history))
        .route("/history/:id", delete(api::history::delete_history))
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

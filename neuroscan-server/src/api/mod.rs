//! HTTP API surface

use axum::response::Html;

pub mod analyze;
pub mod health;
pub mod history;

pub use health::health_routes;

/// GET /
///
/// Embedded upload page for the display path.
pub async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

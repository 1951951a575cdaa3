//! Router assembly.

mod blog;
mod common;

pub use blog::blog_routes;
pub use common::common_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

/// Prefix of the blog API.
pub const API_PREFIX: &str = "/api/v1";

/// Full application: service routes at the root, blog API under `/api/v1`, request tracing and a body size cap.
/// Oversized bodies surface as `Json` rejections: 413 in the error envelope.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, blog_routes(state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

use std::sync::Arc;

use crate::recommendation::orchestrator::Recommender;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; concurrent requests never coordinate.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

pub mod api;
pub mod tts;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Build the complete application router
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::create_api_router())
        .merge(tts::create_tts_router())
        .with_state(state)
}

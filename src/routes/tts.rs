//! TTS relay WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::tts::tts_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the TTS relay WebSocket router
///
/// # Endpoint
///
/// `GET /tts` - WebSocket upgrade for sentence-by-sentence synthesis
///
/// # Protocol
///
/// Clients send one `speak` message per sentence. For each sentence the
/// server sends a `sentence_start` marker, the audio as binary chunks, and a
/// `sentence_end` marker. A failed sentence produces an `error` message.
///
/// # Example
///
/// ```json
/// // Client sends
/// {"type": "speak", "text": "<happy> Hello!", "sentence_id": 0, "first_sentence": true}
///
/// // Server responds
/// {"type": "tts", "state": "sentence_start", "text": "Hello!", "point": 0}
/// // ... binary audio chunks ...
/// {"type": "tts", "state": "sentence_end", "point": 0}
/// ```
pub fn create_tts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tts", get(tts_handler))
        .layer(TraceLayer::new_for_http())
}

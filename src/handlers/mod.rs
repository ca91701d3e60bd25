//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `tts` - TTS relay WebSocket

pub mod api;
pub mod tts;

pub use tts::tts_handler;

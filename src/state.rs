use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::tts::{SeedTts, TTSResult};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub tts: Arc<SeedTts>,
}

impl AppState {
    /// Creates the state with a WebSocket-backed SeedTTS client.
    pub fn new(config: ServerConfig) -> TTSResult<Arc<Self>> {
        let tts = SeedTts::new(config.seedtts.clone())?;
        Ok(Self::with_tts(config, tts))
    }

    /// Creates the state around an existing client.
    pub fn with_tts(config: ServerConfig, tts: SeedTts) -> Arc<Self> {
        Arc::new(Self {
            config,
            tts: Arc::new(tts),
        })
    }
}

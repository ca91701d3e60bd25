mod base;
pub mod seedtts;

pub use base::{TTSError, TTSResult};
pub use seedtts::{SEEDTTS_WS_URL, SeedTts, SeedTtsConfig};
use std::collections::HashMap;

/// Provider names accepted by [`create_tts_provider`].
pub const SUPPORTED_TTS_PROVIDERS: &[&str] = &["seedtts"];

/// Factory function to create a TTS provider.
///
/// # Supported Providers
///
/// - `"seedtts"` or `"seed-tts"` or `"seed_tts"` - SeedTTS binary WebSocket API
///
/// # Example
///
/// ```rust,ignore
/// use seedtts_gateway::core::tts::{create_tts_provider, SeedTtsConfig};
///
/// let provider = create_tts_provider("seedtts", SeedTtsConfig::new("app-id", "token"))?;
/// ```
pub fn create_tts_provider(provider_type: &str, config: SeedTtsConfig) -> TTSResult<SeedTts> {
    match provider_type.to_lowercase().as_str() {
        "seedtts" | "seed-tts" | "seed_tts" => SeedTts::new(config),
        _ => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {provider_type}. Supported providers: {}",
            SUPPORTED_TTS_PROVIDERS.join(", ")
        ))),
    }
}

/// Returns a map of provider names to their default API endpoint URLs.
pub fn get_tts_provider_urls() -> HashMap<String, String> {
    let mut urls = HashMap::new();
    urls.insert("seedtts".to_string(), SEEDTTS_WS_URL.to_string());
    urls
}

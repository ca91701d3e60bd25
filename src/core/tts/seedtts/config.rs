//! SeedTTS configuration types.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::tts::base::{TTSError, TTSResult};

use super::{
    DEFAULT_CLUSTER, DEFAULT_ENCODING, DEFAULT_LANGUAGE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RATIO,
    DEFAULT_SAMPLE_RATE, DEFAULT_UID, DEFAULT_VOICE_TYPE, SEEDTTS_WS_URL,
};

// =============================================================================
// SeedTTS Configuration
// =============================================================================

/// Connection and voice settings for SeedTTS.
///
/// Every field has a default, so a YAML section only needs the credentials:
///
/// ```yaml
/// seedtts:
///   app_id: "1234567890"
///   token: "secret"
///   voice_type: "S_xyiql9xn1"
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedTtsConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub endpoint: String,

    /// Application id issued by the console
    pub app_id: String,

    /// Access token, sent in the upgrade header and the request body
    pub token: String,

    /// Voice cluster
    pub cluster: String,

    /// User id reported in the `user` section
    pub uid: String,

    /// Voice identifier
    pub voice_type: String,

    /// Output encoding requested from the server
    pub encoding: String,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    pub speed_ratio: f32,
    pub volume_ratio: f32,
    pub pitch_ratio: f32,

    /// Language hint. Not part of the request body.
    pub language: String,

    /// Total attempts per synthesis call, including the first
    pub max_attempts: u32,
}

impl Default for SeedTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: SEEDTTS_WS_URL.to_string(),
            app_id: String::new(),
            token: String::new(),
            cluster: DEFAULT_CLUSTER.to_string(),
            uid: DEFAULT_UID.to_string(),
            voice_type: DEFAULT_VOICE_TYPE.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            speed_ratio: DEFAULT_RATIO,
            volume_ratio: DEFAULT_RATIO,
            pitch_ratio: DEFAULT_RATIO,
            language: DEFAULT_LANGUAGE.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl std::fmt::Debug for SeedTtsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedTtsConfig")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("token", &"<redacted>")
            .field("cluster", &self.cluster)
            .field("uid", &self.uid)
            .field("voice_type", &self.voice_type)
            .field("encoding", &self.encoding)
            .field("sample_rate", &self.sample_rate)
            .field("speed_ratio", &self.speed_ratio)
            .field("volume_ratio", &self.volume_ratio)
            .field("pitch_ratio", &self.pitch_ratio)
            .field("language", &self.language)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl SeedTtsConfig {
    /// Creates a config with the given credentials and default voice settings.
    pub fn new(app_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    /// Sets the voice identifier.
    #[inline]
    pub fn with_voice_type(mut self, voice_type: impl Into<String>) -> Self {
        self.voice_type = voice_type.into();
        self
    }

    /// Sets the endpoint URL.
    #[inline]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the total number of attempts per call.
    #[inline]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Parses the endpoint into a URL.
    pub fn endpoint_url(&self) -> TTSResult<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            TTSError::InvalidConfiguration(format!("invalid endpoint '{}': {e}", self.endpoint))
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(TTSError::InvalidConfiguration(format!(
                "endpoint scheme must be ws or wss, got {other}"
            ))),
        }
    }

    /// Value of the `Authorization` header on the upgrade request.
    ///
    /// The server expects a semicolon after `Bearer`.
    #[inline]
    pub fn authorization_header(&self) -> String {
        format!("Bearer; {}", self.token)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if:
    /// - `app_id` or `token` is empty
    /// - `endpoint` is not a ws/wss URL
    /// - `sample_rate` or `max_attempts` is zero
    pub fn validate(&self) -> TTSResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "app_id is required".to_string(),
            ));
        }

        if self.token.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "token is required".to_string(),
            ));
        }

        self.endpoint_url()?;

        if self.sample_rate == 0 {
            return Err(TTSError::InvalidConfiguration(
                "sample_rate must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(TTSError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

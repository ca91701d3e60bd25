//! SeedTTS streaming provider.
//!
//! SeedTTS synthesizes speech over a binary WebSocket protocol: the client
//! sends one gzip-compressed JSON request frame, the server answers with a
//! sequence of audio frames and marks the last one with a negative sequence
//! number.
//!
//! # Features
//!
//! - **Capture**: reassemble the whole utterance and write a WAV file
//! - **Relay**: forward each audio payload to a downstream consumer as it arrives
//! - **Streaming**: yield each payload as its own WAV container
//! - **Emotion tags**: a leading `<happy>` style tag is sent as the `emotion` field
//! - **Retry**: transport failures replay the whole session once
//!
//! # Example
//!
//! ```rust,ignore
//! use seedtts_gateway::core::tts::seedtts::{SeedTts, SeedTtsConfig};
//!
//! let config = SeedTtsConfig {
//!     app_id: "your-app-id".to_string(),
//!     token: "your-token".to_string(),
//!     ..Default::default()
//! };
//!
//! let tts = SeedTts::new(config)?;
//! tts.synthesize_to_file("<happy> Hello there!", "hello.wav").await?;
//! ```
//!
//! # Authentication
//!
//! The token travels twice: in the `Authorization: Bearer; {token}` header of
//! the WebSocket upgrade and inside the request JSON (`app.token`).

pub mod config;
pub mod messages;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod transport;


pub use config::SeedTtsConfig;
pub use messages::{SynthesisRequest, parse_emotion};
pub use protocol::{
    Frame, FrameBody, MessageKind, ProtocolError, decode_frame, encode_full_client_request,
    encode_request,
};
pub use provider::SeedTts;
pub use session::{
    AudioSink, Session, SessionOutcome, SessionState, run_session, run_with_retry,
};
pub use transport::{Connector, FrameConnection, WsConnector};

// =============================================================================
// API Constants
// =============================================================================

/// SeedTTS binary WebSocket endpoint.
pub const SEEDTTS_WS_URL: &str = "wss://openspeech.bytedance.com/api/v1/tts/ws_binary";

// =============================================================================
// Limits and Defaults
// =============================================================================

/// Default voice cluster (custom voices).
pub const DEFAULT_CLUSTER: &str = "volcano_icl";

/// Default English voice.
pub const DEFAULT_VOICE_TYPE: &str = "S_xyiql9xn1";

/// Default user id sent in the `user` section.
pub const DEFAULT_UID: &str = "388808087185088";

/// Default output encoding requested from the server.
///
/// Raw PCM is what the capture path wraps into a WAV container.
pub const DEFAULT_ENCODING: &str = "pcm";

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Default language hint.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Neutral speed/volume/pitch ratio.
pub const DEFAULT_RATIO: f32 = 1.0;

/// Total attempts for one synthesis (first try plus one retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Sample width of the PCM stream in bytes.
pub const PCM_SAMPLE_WIDTH: u16 = 2;

/// Channel count of the PCM stream.
pub const PCM_CHANNELS: u16 = 1;

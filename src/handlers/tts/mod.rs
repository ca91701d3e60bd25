pub mod handler;
pub mod messages;

pub use handler::tts_handler;
pub use messages::{MAX_TEXT_SIZE, TtsIncomingMessage, TtsMessageRoute, TtsOutgoingMessage};

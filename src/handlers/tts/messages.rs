//! TTS relay WebSocket message types

use serde::{Deserialize, Serialize};

use crate::core::relay::RelayFrame;

/// Maximum allowed size for one sentence (50 KB)
pub const MAX_TEXT_SIZE: usize = 50 * 1024;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming WebSocket messages from client
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum TtsIncomingMessage {
    /// Synthesize one sentence and relay its audio
    #[serde(rename = "speak")]
    Speak {
        /// Text to speak, optionally starting with an emotion tag
        text: String,
        /// Positional id echoed in the relay markers
        #[serde(default)]
        sentence_id: u32,
        /// First sentence of a reply
        #[serde(default)]
        first_sentence: bool,
    },
}

impl TtsIncomingMessage {
    /// Reject messages whose text exceeds [`MAX_TEXT_SIZE`].
    pub fn validate_size(&self) -> Result<(), String> {
        match self {
            TtsIncomingMessage::Speak { text, .. } if text.len() > MAX_TEXT_SIZE => Err(format!(
                "Text too large: {} bytes (max {MAX_TEXT_SIZE})",
                text.len()
            )),
            TtsIncomingMessage::Speak { text, .. } if text.trim().is_empty() => {
                Err("Text is empty".to_string())
            }
            TtsIncomingMessage::Speak { .. } => Ok(()),
        }
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing JSON messages other than the relay markers
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum TtsOutgoingMessage {
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sentence_id: Option<u32>,
    },
}

// =============================================================================
// Message Routing
// =============================================================================

/// Everything the writer task may send to the client
pub enum TtsMessageRoute {
    /// Relay marker or audio chunk
    Relay(RelayFrame),
    /// JSON message
    Outgoing(TtsOutgoingMessage),
}

impl From<RelayFrame> for TtsMessageRoute {
    fn from(frame: RelayFrame) -> Self {
        TtsMessageRoute::Relay(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speak() {
        let msg: TtsIncomingMessage = serde_json::from_str(
            r#"{"type":"speak","text":"<happy> Hi","sentence_id":3,"first_sentence":true}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            TtsIncomingMessage::Speak {
                text: "<happy> Hi".to_string(),
                sentence_id: 3,
                first_sentence: true,
            }
        );
        assert!(msg.validate_size().is_ok());
    }

    #[test]
    fn test_speak_defaults() {
        let msg: TtsIncomingMessage =
            serde_json::from_str(r#"{"type":"speak","text":"Hi"}"#).unwrap();
        assert!(matches!(
            msg,
            TtsIncomingMessage::Speak {
                sentence_id: 0,
                first_sentence: false,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<TtsIncomingMessage>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_validate_size() {
        let msg = TtsIncomingMessage::Speak {
            text: "a".repeat(MAX_TEXT_SIZE + 1),
            sentence_id: 0,
            first_sentence: false,
        };
        assert!(msg.validate_size().is_err());

        let msg = TtsIncomingMessage::Speak {
            text: "   ".to_string(),
            sentence_id: 0,
            first_sentence: false,
        };
        assert!(msg.validate_size().is_err());
    }

    #[test]
    fn test_relay_frame_routes_to_writer() {
        let route = TtsMessageRoute::from(RelayFrame::Audio(bytes::Bytes::from_static(b"ab")));
        assert!(matches!(route, TtsMessageRoute::Relay(RelayFrame::Audio(data)) if &data[..] == b"ab"));
    }

    #[test]
    fn test_error_json() {
        let msg = TtsOutgoingMessage::Error {
            message: "boom".to_string(),
            sentence_id: None,
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"error","message":"boom"}"#
        );
    }
}

//! Messages sent to a downstream relay consumer.
//!
//! A relayed sentence looks like this on the wire:
//!
//! ```text
//! {"type":"tts","state":"sentence_start","text":"Hello there.","point":3}
//! <binary chunk>
//! <binary chunk>
//! ...
//! {"type":"tts","state":"sentence_end","point":3}
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::audio::f32_to_pcm16;

/// Value of the `type` field on every relay control message.
pub const RELAY_MESSAGE_TYPE: &str = "tts";

/// Sentence boundary marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SentenceMarker {
    SentenceStart { text: String, point: u32 },
    SentenceEnd { point: u32 },
}

/// JSON control message framing a relayed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayControl {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(flatten)]
    pub marker: SentenceMarker,
}

impl RelayControl {
    pub fn sentence_start(text: impl Into<String>, point: u32) -> Self {
        Self {
            message_type: RELAY_MESSAGE_TYPE.to_string(),
            marker: SentenceMarker::SentenceStart {
                text: text.into(),
                point,
            },
        }
    }

    pub fn sentence_end(point: u32) -> Self {
        Self {
            message_type: RELAY_MESSAGE_TYPE.to_string(),
            marker: SentenceMarker::SentenceEnd { point },
        }
    }

    /// Sentence id this marker belongs to.
    pub fn point(&self) -> u32 {
        match self.marker {
            SentenceMarker::SentenceStart { point, .. } | SentenceMarker::SentenceEnd { point } => {
                point
            }
        }
    }
}

/// One message for the downstream transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    Control(RelayControl),
    Audio(Bytes),
}

/// Audio handed to the relay, either as encoded bytes or as float samples.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayPayload {
    /// Bytes forwarded as received
    Raw(Bytes),
    /// Samples in [-1.0, 1.0], sent as 16-bit little-endian PCM
    Samples(Vec<f32>),
}

impl RelayPayload {
    /// Converts the payload to the bytes that get chunked downstream.
    pub fn into_bytes(self) -> Bytes {
        match self {
            RelayPayload::Raw(bytes) => bytes,
            RelayPayload::Samples(samples) => Bytes::from(f32_to_pcm16(&samples)),
        }
    }
}

impl From<Bytes> for RelayPayload {
    fn from(bytes: Bytes) -> Self {
        RelayPayload::Raw(bytes)
    }
}

impl From<Vec<f32>> for RelayPayload {
    fn from(samples: Vec<f32>) -> Self {
        RelayPayload::Samples(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentence_start_json() {
        let msg = RelayControl::sentence_start("Hello.", 2);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"type": "tts", "state": "sentence_start", "text": "Hello.", "point": 2})
        );
    }

    #[test]
    fn test_sentence_end_json() {
        let msg = RelayControl::sentence_end(7);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "tts", "state": "sentence_end", "point": 7}));
        assert_eq!(msg.point(), 7);
    }

    #[test]
    fn test_control_parses_back() {
        let parsed: RelayControl =
            serde_json::from_str(r#"{"type":"tts","state":"sentence_end","point":1}"#).unwrap();
        assert_eq!(parsed, RelayControl::sentence_end(1));
    }

    #[test]
    fn test_samples_become_pcm16() {
        let bytes = RelayPayload::from(vec![0.0f32, 1.0]).into_bytes();
        assert_eq!(bytes.as_ref(), &[0x00, 0x00, 0xFF, 0x7F]);

        let raw = Bytes::from_static(b"\x01\x02\x03");
        assert_eq!(RelayPayload::from(raw.clone()).into_bytes(), raw);
    }
}

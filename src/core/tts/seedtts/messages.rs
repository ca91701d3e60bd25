//! SeedTTS request message types.
//!
//! A synthesis request is serialized as JSON with four sections:
//!
//! ```json
//! {
//!   "app": {"appid": "...", "token": "...", "cluster": "volcano_icl"},
//!   "user": {"uid": "388808087185088"},
//!   "audio": {
//!     "voice_type": "S_xyiql9xn1",
//!     "encoding": "pcm",
//!     "speed_ratio": 1.0,
//!     "volume_ratio": 1.0,
//!     "pitch_ratio": 1.0,
//!     "rate": 16000,
//!     "emotion": "happy"
//!   },
//!   "request": {"reqid": "...", "text": "...", "text_type": "plain", "operation": "submit"}
//! }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::SeedTtsConfig;

/// Literal `text_type` marker for plain text input.
pub const TEXT_TYPE_PLAIN: &str = "plain";

/// Literal `operation` marker for a one-shot submit.
pub const OPERATION_SUBMIT: &str = "submit";

static EMOTION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([^>\n]*)>\s*").expect("emotion tag pattern is valid"));

/// Split a leading `<tag>` off `text`.
///
/// Returns the lowercased tag (empty when absent) and the text to speak.
///
/// ```rust,ignore
/// assert_eq!(parse_emotion("<Happy> Hi"), ("happy".to_string(), "Hi"));
/// assert_eq!(parse_emotion("Hi"), (String::new(), "Hi"));
/// ```
pub fn parse_emotion(text: &str) -> (String, &str) {
    match EMOTION_TAG.captures(text) {
        Some(caps) => {
            let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let end = caps.get(0).map(|m| m.end()).unwrap_or_default();
            (tag.to_lowercase(), &text[end..])
        }
        None => (String::new(), text),
    }
}

/// One utterance to synthesize.
///
/// Built once per call and never mutated; the request id stays the same
/// across retries of the same call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Text to speak, with any emotion tag removed
    pub text: String,
    /// Lowercased emotion tag, empty when the text had none
    pub emotion: String,
    /// Voice identifier
    pub voice_type: String,
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Locally generated request id
    pub reqid: String,
}

impl SynthesisRequest {
    /// Build a request from caller text, parsing a leading emotion tag.
    pub fn new(raw_text: &str, config: &SeedTtsConfig) -> Self {
        let (emotion, text) = parse_emotion(raw_text);
        Self {
            text: text.to_string(),
            emotion,
            voice_type: config.voice_type.clone(),
            sample_rate: config.sample_rate,
            reqid: Uuid::new_v4().to_string(),
        }
    }

    /// Build the JSON body sent in the full client request frame.
    pub fn to_body(&self, config: &SeedTtsConfig) -> TtsRequestBody {
        TtsRequestBody {
            app: AppSection {
                appid: config.app_id.clone(),
                token: config.token.clone(),
                cluster: config.cluster.clone(),
            },
            user: UserSection {
                uid: config.uid.clone(),
            },
            audio: AudioSection {
                voice_type: self.voice_type.clone(),
                encoding: config.encoding.clone(),
                speed_ratio: config.speed_ratio,
                volume_ratio: config.volume_ratio,
                pitch_ratio: config.pitch_ratio,
                rate: self.sample_rate,
                emotion: (!self.emotion.is_empty()).then(|| self.emotion.clone()),
            },
            request: RequestSection {
                reqid: self.reqid.clone(),
                text: self.text.clone(),
                text_type: TEXT_TYPE_PLAIN.to_string(),
                operation: OPERATION_SUBMIT.to_string(),
            },
        }
    }
}

/// Complete request JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequestBody {
    pub app: AppSection,
    pub user: UserSection,
    pub audio: AudioSection,
    pub request: RequestSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub appid: String,
    pub token: String,
    pub cluster: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSection {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSection {
    pub voice_type: String,
    pub encoding: String,
    pub speed_ratio: f32,
    pub volume_ratio: f32,
    pub pitch_ratio: f32,
    /// Sample rate in Hz
    pub rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSection {
    pub reqid: String,
    pub text: String,
    pub text_type: String,
    pub operation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_pattern_compiles() {
        assert!(EMOTION_TAG.is_match("<sad>"));
        assert!(!EMOTION_TAG.is_match("sad"));
    }

    #[test]
    fn test_parse_emotion_with_tag() {
        let (emotion, text) = parse_emotion("<Happy> Hello, I'm Newton!");
        assert_eq!(emotion, "happy");
        assert_eq!(text, "Hello, I'm Newton!");
    }

    #[test]
    fn test_parse_emotion_without_space() {
        let (emotion, text) = parse_emotion("<sad>Goodbye");
        assert_eq!(emotion, "sad");
        assert_eq!(text, "Goodbye");
    }

    #[test]
    fn test_parse_emotion_without_tag() {
        let (emotion, text) = parse_emotion("Plain sentence.");
        assert!(emotion.is_empty());
        assert_eq!(text, "Plain sentence.");
    }

    #[test]
    fn test_tag_must_lead() {
        let (emotion, text) = parse_emotion("Say <happy> later");
        assert!(emotion.is_empty());
        assert_eq!(text, "Say <happy> later");
    }

    #[test]
    fn test_multiline_text_is_kept() {
        let (emotion, text) = parse_emotion("<calm> first line\nsecond line");
        assert_eq!(emotion, "calm");
        assert_eq!(text, "first line\nsecond line");
    }

    #[test]
    fn test_request_body_sections() {
        let config = SeedTtsConfig {
            app_id: "app".to_string(),
            token: "tok".to_string(),
            ..Default::default()
        };
        let request = SynthesisRequest::new("<angry> Stop that", &config);
        let body = request.to_body(&config);

        assert_eq!(body.app.appid, "app");
        assert_eq!(body.app.token, "tok");
        assert_eq!(body.app.cluster, "volcano_icl");
        assert_eq!(body.audio.emotion.as_deref(), Some("angry"));
        assert_eq!(body.audio.rate, 16000);
        assert_eq!(body.audio.speed_ratio, 1.0);
        assert_eq!(body.request.text, "Stop that");
        assert_eq!(body.request.text_type, "plain");
        assert_eq!(body.request.operation, "submit");
        assert_eq!(body.request.reqid, request.reqid);
    }

    #[test]
    fn test_emotion_omitted_when_empty() {
        let config = SeedTtsConfig::default();
        let body = SynthesisRequest::new("Hi", &config).to_body(&config);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["audio"].get("emotion").is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let config = SeedTtsConfig::default();
        let a = SynthesisRequest::new("Hi", &config);
        let b = SynthesisRequest::new("Hi", &config);
        assert_ne!(a.reqid, b.reqid);
    }
}

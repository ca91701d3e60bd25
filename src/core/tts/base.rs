//! Base types shared by the TTS provider modules.
//!
//! Errors follow a small taxonomy:
//!
//! - **Transport** (`ConnectionFailed`, `WebSocketError`): the connection could
//!   not be opened, a send/receive failed, or the peer hung up before the
//!   terminal frame. These are the only retryable errors.
//! - **Protocol** (`Protocol`): an inbound frame could not be decoded.
//! - **Application** (`ProviderError`): the server sent an error frame.
//! - Everything else is local (configuration, audio packaging, I/O, relay).

use thiserror::Error;

use super::seedtts::protocol::ProtocolError;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during TTS operations.
#[derive(Debug, Error)]
pub enum TTSError {
    /// Opening the connection to the synthesis endpoint failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Sending or receiving on an open connection failed
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// The server reported an application error
    #[error("Provider error {code}: {message}")]
    ProviderError { code: u32, message: String },

    /// An inbound frame could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Audio container packaging failed
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    /// The downstream relay transport rejected a message
    #[error("Relay error: {0}")]
    RelayError(String),

    /// Filesystem error while persisting audio
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Every attempt of a retried session failed
    #[error("TTS failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<TTSError>,
    },
}

impl TTSError {
    /// Whether the whole session may be replayed after this error.
    ///
    /// Server-reported errors and decode failures are final: replaying the
    /// same request would fail the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TTSError::ConnectionFailed(_) | TTSError::WebSocketError(_)
        )
    }

    /// The server error code, if this error (or the last retried one) carries one.
    pub fn provider_code(&self) -> Option<u32> {
        match self {
            TTSError::ProviderError { code, .. } => Some(*code),
            TTSError::RetryExhausted { source, .. } => source.provider_code(),
            _ => None,
        }
    }
}

/// Result type for TTS operations.
pub type TTSResult<T> = Result<T, TTSError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(TTSError::ConnectionFailed("refused".into()).is_retryable());
        assert!(TTSError::WebSocketError("reset".into()).is_retryable());
    }

    #[test]
    fn test_application_errors_are_final() {
        let err = TTSError::ProviderError {
            code: 3001,
            message: "invalid voice".into(),
        };
        assert!(!err.is_retryable());
        assert!(!TTSError::Protocol(ProtocolError::UnknownMessageKind(0x3)).is_retryable());
        assert!(!TTSError::InvalidConfiguration("token".into()).is_retryable());
    }

    #[test]
    fn test_provider_code_through_retry_wrapper() {
        let err = TTSError::RetryExhausted {
            attempts: 2,
            source: Box::new(TTSError::ProviderError {
                code: 3050,
                message: "quota".into(),
            }),
        };
        assert_eq!(err.provider_code(), Some(3050));
        assert_eq!(TTSError::WebSocketError("x".into()).provider_code(), None);
    }

    #[test]
    fn test_error_display() {
        let err = TTSError::ProviderError {
            code: 3011,
            message: "empty text".into(),
        };
        assert_eq!(err.to_string(), "Provider error 3011: empty text");
    }
}

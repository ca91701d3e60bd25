//! WebSocket transport for SeedTTS sessions.
//!
//! The session driver talks to a [`FrameConnection`] obtained from a
//! [`Connector`], so tests can substitute a scripted peer for the network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use super::config::SeedTtsConfig;
use crate::core::tts::base::{TTSError, TTSResult};

// =============================================================================
// Constants
// =============================================================================

/// Upper bound on opening the WebSocket (TCP, TLS and upgrade).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-message idle timeout. Resets after each received message.
const WS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Traits
// =============================================================================

/// One open duplex connection carrying binary frames.
#[async_trait]
pub trait FrameConnection: Send {
    /// Sends one binary frame.
    async fn send_frame(&mut self, frame: Bytes) -> TTSResult<()>;

    /// Waits for the next binary frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn next_frame(&mut self) -> TTSResult<Option<Bytes>>;

    /// Closes the connection. Errors while closing are not reported.
    async fn close(&mut self);
}

/// Opens connections to the synthesis endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &SeedTtsConfig) -> TTSResult<Box<dyn FrameConnection>>;
}

// =============================================================================
// WebSocket Implementation
// =============================================================================

/// Connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, config: &SeedTtsConfig) -> TTSResult<Box<dyn FrameConnection>> {
        let url = config.endpoint_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TTSError::ConnectionFailed(format!("Failed to build request: {e}")))?;

        let auth = HeaderValue::from_str(&config.authorization_header()).map_err(|e| {
            TTSError::InvalidConfiguration(format!("token is not a valid header value: {e}"))
        })?;
        request.headers_mut().insert("Authorization", auth);

        debug!("Connecting to SeedTTS at {}", url.host_str().unwrap_or_default());

        let (stream, response) = match timeout(CONNECT_TIMEOUT, connect_async(request)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return Err(TTSError::ConnectionFailed(format!(
                    "Failed to connect to SeedTTS: {e}"
                )));
            }
            Err(_) => {
                return Err(TTSError::ConnectionFailed(
                    "Connection to SeedTTS timed out".to_string(),
                ));
            }
        };

        info!("Connected to SeedTTS (status: {})", response.status());

        Ok(Box::new(WsConnection { stream }))
    }
}

/// Open SeedTTS WebSocket.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameConnection for WsConnection {
    async fn send_frame(&mut self, frame: Bytes) -> TTSResult<()> {
        self.stream
            .send(Message::Binary(frame))
            .await
            .map_err(|e| TTSError::WebSocketError(format!("Failed to send frame: {e}")))
    }

    async fn next_frame(&mut self) -> TTSResult<Option<Bytes>> {
        loop {
            let message = timeout(WS_MESSAGE_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| {
                    TTSError::WebSocketError(format!(
                        "No message from SeedTTS for {}s",
                        WS_MESSAGE_TIMEOUT.as_secs()
                    ))
                })?;

            match message {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data)),
                Some(Ok(Message::Close(frame))) => {
                    debug!("SeedTTS closed the connection: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(Message::Text(text))) => {
                    debug!("Ignoring text message from SeedTTS: {}", text);
                }
                // Pings are answered by tungstenite on the next read
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(TTSError::WebSocketError(format!(
                        "Failed to receive frame: {e}"
                    )));
                }
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Error closing SeedTTS connection: {}", e);
        }
    }
}

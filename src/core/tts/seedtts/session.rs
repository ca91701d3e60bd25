//! SeedTTS session driver.
//!
//! One session serves one request over one connection:
//!
//! ```text
//! Idle ──connect──▶ Connecting ──send request──▶ Streaming ──seq < 0──▶ Succeeded
//!                       │                            │
//!                       └──────── failure ───────────┴──error frame──▶ Failed
//! ```
//!
//! Audio payloads go to an [`AudioSink`]: the capture buffer or the relay
//! forwarder. Retrying is layered on top by [`run_with_retry`], which replays
//! a whole session and never resumes a half-finished one.

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::config::SeedTtsConfig;
use super::protocol::{Frame, FrameBody, decode_frame};
use super::transport::Connector;
use crate::core::tts::base::{TTSError, TTSResult};

// =============================================================================
// Types
// =============================================================================

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    /// Terminal audio frame received
    Succeeded,
    /// Error frame, decode failure or transport failure
    Failed,
}

impl SessionState {
    #[inline]
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Consumer of the audio payloads of one session.
#[async_trait]
pub trait AudioSink: Send {
    /// Receives one non-empty audio payload, in arrival order.
    async fn on_audio(&mut self, payload: Bytes) -> TTSResult<()>;
}

/// Summary of a successful session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionOutcome {
    /// Frames received, including acknowledgments and frontend info
    pub frames: usize,
    /// Audio payloads handed to the sink
    pub audio_payloads: usize,
    /// Total audio bytes handed to the sink
    pub audio_bytes: usize,
    /// Sequence number of the terminal frame
    pub final_sequence: i32,
    /// Time from session start to the first audio payload
    pub first_audio_latency: Option<Duration>,
}

// =============================================================================
// Frame Processing
// =============================================================================

/// Frame-level state machine of one session.
///
/// Owns no transport: the caller feeds raw inbound frames via [`Session::process`].
pub struct Session<'a, S: AudioSink + ?Sized> {
    state: SessionState,
    sink: &'a mut S,
    started: Instant,
    outcome: SessionOutcome,
}

impl<'a, S: AudioSink + ?Sized> Session<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            state: SessionState::Idle,
            sink,
            started: Instant::now(),
            outcome: SessionOutcome::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }

    fn transition(&mut self, next: SessionState) {
        debug!("SeedTTS session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Decodes and dispatches one inbound frame.
    ///
    /// An error frame or an undecodable frame fails the session.
    pub async fn process(&mut self, data: &[u8]) -> TTSResult<()> {
        let frame = match decode_frame(data) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to decode SeedTTS frame ({} bytes): {}", data.len(), e);
                self.transition(SessionState::Failed);
                return Err(e.into());
            }
        };
        self.outcome.frames += 1;

        if !frame.header_extensions.is_empty() {
            debug!(
                "SeedTTS frame carries {} header extension bytes",
                frame.header_extensions.len()
            );
        }

        self.dispatch(frame).await
    }

    async fn dispatch(&mut self, frame: Frame) -> TTSResult<()> {
        let terminal = frame.is_terminal();

        match frame.body {
            FrameBody::Ack => {
                debug!("SeedTTS acknowledgment");
            }
            FrameBody::FrontendInfo { payload } => {
                debug!(
                    "SeedTTS frontend info: {}",
                    String::from_utf8_lossy(&payload)
                );
            }
            FrameBody::Error { code, message } => {
                error!(code, "SeedTTS error: {}", message);
                self.transition(SessionState::Failed);
                return Err(TTSError::ProviderError { code, message });
            }
            FrameBody::Audio {
                sequence,
                declared_size,
                payload,
            } => {
                if declared_size as usize != payload.len() {
                    debug!(
                        sequence,
                        "SeedTTS declared {} audio bytes, frame carries {}",
                        declared_size,
                        payload.len()
                    );
                }

                if !payload.is_empty() {
                    if self.outcome.first_audio_latency.is_none() {
                        let latency = self.started.elapsed();
                        debug!("First SeedTTS audio after {} ms", latency.as_millis());
                        self.outcome.first_audio_latency = Some(latency);
                    }
                    self.outcome.audio_payloads += 1;
                    self.outcome.audio_bytes += payload.len();
                    if let Err(e) = self.sink.on_audio(payload).await {
                        self.transition(SessionState::Failed);
                        return Err(e);
                    }
                }

                if terminal {
                    self.outcome.final_sequence = sequence;
                    self.transition(SessionState::Succeeded);
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Session Execution
// =============================================================================

/// Runs one complete session: connect, send the request frame, then consume
/// frames until the terminal audio frame.
///
/// The connection is closed on every exit path. A peer that closes before
/// the terminal frame is reported as a `WebSocketError`.
pub async fn run_session<S: AudioSink + ?Sized>(
    connector: &dyn Connector,
    config: &SeedTtsConfig,
    request_frame: &Bytes,
    sink: &mut S,
) -> TTSResult<SessionOutcome> {
    let mut session = Session::new(sink);

    session.transition(SessionState::Connecting);
    let mut connection = match connector.connect(config).await {
        Ok(connection) => connection,
        Err(e) => {
            session.transition(SessionState::Failed);
            return Err(e);
        }
    };

    if let Err(e) = connection.send_frame(request_frame.clone()).await {
        session.transition(SessionState::Failed);
        connection.close().await;
        return Err(e);
    }
    session.transition(SessionState::Streaming);

    let result = loop {
        match connection.next_frame().await {
            Ok(Some(data)) => {
                if let Err(e) = session.process(&data).await {
                    break Err(e);
                }
                if session.state() == SessionState::Succeeded {
                    break Ok(());
                }
            }
            Ok(None) => {
                session.transition(SessionState::Failed);
                break Err(TTSError::WebSocketError(
                    "Connection closed before the final audio frame".to_string(),
                ));
            }
            Err(e) => {
                session.transition(SessionState::Failed);
                break Err(e);
            }
        }
    };

    connection.close().await;
    result.map(|()| session.outcome().clone())
}

/// Runs `attempt_fn` up to `max_attempts` times.
///
/// Only retryable (transport) errors trigger another attempt. When every
/// attempt failed that way, the last error is wrapped in `RetryExhausted`.
/// Attempts are numbered from 1.
pub async fn run_with_retry<T, F, Fut>(max_attempts: u32, mut attempt_fn: F) -> TTSResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = TTSResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(attempt, "SeedTTS session failed, retrying: {}", e);
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                return Err(TTSError::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::debug;

use super::messages::{RelayControl, RelayFrame, RelayPayload};
use crate::core::tts::seedtts::AudioSink;
use crate::core::tts::{TTSError, TTSResult};

/// Default size of one relayed audio chunk in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Bytes per downstream audio message
    pub chunk_size: usize,
    /// Drop the first chunk of every payload. Some consumers expect this
    /// when each payload starts with a container header.
    pub skip_leading_chunk: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_leading_chunk: false,
        }
    }
}

/// Identity of the sentence being relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceInfo {
    /// Positional id, echoed as `point` in the markers
    pub sentence_id: u32,
    /// Source text, sent with the start marker
    pub text: String,
    /// First sentence of a reply; only used for latency logging
    pub first_sentence: bool,
}

impl SentenceInfo {
    pub fn new(sentence_id: u32, text: impl Into<String>) -> Self {
        Self {
            sentence_id,
            text: text.into(),
            first_sentence: false,
        }
    }

    pub fn first(mut self, first_sentence: bool) -> Self {
        self.first_sentence = first_sentence;
        self
    }
}

// =============================================================================
// Downstream Transport
// =============================================================================

/// Connection to the relay consumer.
#[async_trait]
pub trait DownstreamTransport: Send {
    async fn send(&mut self, frame: RelayFrame) -> TTSResult<()>;
}

/// Downstream transport feeding an mpsc channel.
///
/// The receiving end is usually a WebSocket writer task.
pub struct ChannelDownstream<T = RelayFrame> {
    tx: mpsc::Sender<T>,
}

impl<T> ChannelDownstream<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl<T> DownstreamTransport for ChannelDownstream<T>
where
    T: From<RelayFrame> + Send,
{
    async fn send(&mut self, frame: RelayFrame) -> TTSResult<()> {
        self.tx
            .send(frame.into())
            .await
            .map_err(|_| TTSError::RelayError("downstream channel closed".to_string()))
    }
}

// =============================================================================
// Relay Sink
// =============================================================================

/// Forwards synthesized audio to one downstream transport.
///
/// A sentence holds the transport from its start marker to its end marker,
/// so sentences relayed concurrently through the same sink are delivered
/// one after another, never interleaved. Waiting sentences park on an async
/// mutex.
pub struct RelaySink<D> {
    downstream: Mutex<D>,
    config: RelayConfig,
}

impl<D: DownstreamTransport> RelaySink<D> {
    pub fn new(downstream: D, config: RelayConfig) -> Self {
        Self {
            downstream: Mutex::new(downstream),
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relays one complete sentence: start marker, chunks, end marker.
    ///
    /// An empty payload sends nothing.
    pub async fn forward(&self, payload: RelayPayload, sentence: &SentenceInfo) -> TTSResult<()> {
        let mut relay = self.begin(sentence.clone());
        relay.send_payload(payload.into_bytes()).await?;
        relay.finish().await?;
        Ok(())
    }

    /// Starts relaying a sentence whose audio arrives in several payloads.
    ///
    /// The transport is claimed on the first non-empty payload and released
    /// by [`SentenceRelay::finish`].
    pub fn begin(&self, sentence: SentenceInfo) -> SentenceRelay<'_, D> {
        SentenceRelay {
            sink: self,
            sentence,
            guard: None,
            chunks_sent: 0,
        }
    }

    pub fn into_inner(self) -> D {
        self.downstream.into_inner()
    }
}

/// One sentence in flight on a [`RelaySink`].
pub struct SentenceRelay<'a, D> {
    sink: &'a RelaySink<D>,
    sentence: SentenceInfo,
    guard: Option<MutexGuard<'a, D>>,
    chunks_sent: usize,
}

impl<'a, D: DownstreamTransport> SentenceRelay<'a, D> {
    pub fn sentence(&self) -> &SentenceInfo {
        &self.sentence
    }

    /// Whether the start marker has been sent.
    pub fn is_started(&self) -> bool {
        self.guard.is_some()
    }

    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Sends `payload` as fixed-size chunks, preceded by the start marker
    /// if this is the first payload of the sentence.
    pub async fn send_payload(&mut self, payload: Bytes) -> TTSResult<()> {
        if payload.is_empty() {
            return Ok(());
        }

        if self.guard.is_none() {
            let mut guard = self.sink.downstream.lock().await;
            guard
                .send(RelayFrame::Control(RelayControl::sentence_start(
                    self.sentence.text.clone(),
                    self.sentence.sentence_id,
                )))
                .await?;
            debug!(sentence_id = self.sentence.sentence_id, "Relay sentence started");
            self.guard = Some(guard);
        }

        let chunk_size = self.sink.config.chunk_size.max(1);
        let skip = usize::from(self.sink.config.skip_leading_chunk);
        let Some(guard) = self.guard.as_mut() else {
            return Err(TTSError::RelayError("relay transport not held".to_string()));
        };

        for start in (0..payload.len()).step_by(chunk_size).skip(skip) {
            let end = (start + chunk_size).min(payload.len());
            guard.send(RelayFrame::Audio(payload.slice(start..end))).await?;
            self.chunks_sent += 1;
        }

        Ok(())
    }

    /// Sends the end marker if the sentence was started and releases the
    /// transport. Returns the number of chunks sent.
    pub async fn finish(mut self) -> TTSResult<usize> {
        if let Some(mut guard) = self.guard.take() {
            guard
                .send(RelayFrame::Control(RelayControl::sentence_end(
                    self.sentence.sentence_id,
                )))
                .await?;
            debug!(
                sentence_id = self.sentence.sentence_id,
                chunks = self.chunks_sent,
                "Relay sentence finished"
            );
        }
        Ok(self.chunks_sent)
    }
}

#[async_trait]
impl<'a, D: DownstreamTransport> AudioSink for SentenceRelay<'a, D> {
    async fn on_audio(&mut self, payload: Bytes) -> TTSResult<()> {
        self.send_payload(payload).await
    }
}

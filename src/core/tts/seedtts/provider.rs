//! SeedTTS provider.
//!
//! Three ways to consume a synthesis:
//!
//! | Method | Output | Retry |
//! |--------|--------|-------|
//! | [`SeedTts::synthesize`] / [`SeedTts::synthesize_to_file`] | whole utterance, WAV on disk | yes |
//! | [`SeedTts::relay`] | chunks on a [`RelaySink`] as they arrive | yes |
//! | [`SeedTts::synthesize_stream`] | one WAV per payload | no |

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use super::config::SeedTtsConfig;
use super::messages::SynthesisRequest;
use super::protocol::encode_request;
use super::session::{AudioSink, SessionOutcome, run_session, run_with_retry};
use super::transport::{Connector, WsConnector};
use super::{PCM_CHANNELS, PCM_SAMPLE_WIDTH};
use crate::core::audio::{AudioFormat, AudioReassembler, pcm_to_wav};
use crate::core::relay::{DownstreamTransport, RelaySink, SentenceInfo};
use crate::core::tts::base::{TTSError, TTSResult};

/// Payloads buffered between the session task and a stream consumer.
const STREAM_BUFFER_SIZE: usize = 64;

/// SeedTTS client.
///
/// Cheap to share: every call opens its own connection.
pub struct SeedTts {
    config: Arc<SeedTtsConfig>,
    connector: Arc<dyn Connector>,
}

impl SeedTts {
    /// Creates a client that connects over WebSocket.
    pub fn new(config: SeedTtsConfig) -> TTSResult<Self> {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Creates a client that opens connections through `connector`.
    pub fn with_connector(config: SeedTtsConfig, connector: Arc<dyn Connector>) -> TTSResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            connector,
        })
    }

    pub fn config(&self) -> &SeedTtsConfig {
        &self.config
    }

    /// Layout of the PCM stream the server is asked for.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.config.sample_rate,
            channels: PCM_CHANNELS,
            sample_width: PCM_SAMPLE_WIDTH,
        }
    }

    fn prepare(&self, text: &str) -> TTSResult<(SynthesisRequest, Bytes)> {
        let request = SynthesisRequest::new(text, &self.config);
        let frame = encode_request(&request.to_body(&self.config))?;
        info!(
            reqid = %request.reqid,
            emotion = %request.emotion,
            voice = %request.voice_type,
            "SeedTTS request for {} chars",
            request.text.chars().count()
        );
        Ok((request, frame))
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Synthesizes `text` and returns the raw audio stream.
    ///
    /// Every attempt starts from an empty buffer.
    pub async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        self.capture(text).await.map(AudioReassembler::into_bytes)
    }

    /// Synthesizes `text` into a WAV file at `path`.
    ///
    /// Returns `Ok(None)` when the server finished without sending audio;
    /// no file is written in that case.
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        path: impl AsRef<Path>,
    ) -> TTSResult<Option<PathBuf>> {
        let reassembler = self.capture(text).await?;
        reassembler.persist(path, self.audio_format()).await
    }

    async fn capture(&self, text: &str) -> TTSResult<AudioReassembler> {
        let (request, frame) = self.prepare(text)?;
        let connector = self.connector.as_ref();
        let config = self.config.as_ref();
        let frame = &frame;

        let reassembler = run_with_retry(config.max_attempts, move |attempt| async move {
            let mut reassembler = AudioReassembler::new();
            let outcome = run_session(connector, config, frame, &mut reassembler).await?;
            debug!(
                attempt,
                frames = outcome.frames,
                bytes = outcome.audio_bytes,
                "SeedTTS capture complete"
            );
            Ok(reassembler)
        })
        .await?;

        info!(
            reqid = %request.reqid,
            "SeedTTS captured {} bytes in {} chunks",
            reassembler.len(),
            reassembler.chunks()
        );
        Ok(reassembler)
    }

    // =========================================================================
    // Relay
    // =========================================================================

    /// Synthesizes `text` and forwards the audio to `sink` as it arrives.
    ///
    /// The start marker carries the spoken text, with any emotion tag
    /// removed. Each attempt relays its own sentence: a failed attempt that
    /// already sent audio closes it with an end marker before the retry
    /// starts again.
    pub async fn relay<D: DownstreamTransport>(
        &self,
        text: &str,
        sink: &RelaySink<D>,
        sentence: SentenceInfo,
    ) -> TTSResult<SessionOutcome> {
        let (request, frame) = self.prepare(text)?;
        let sentence = SentenceInfo {
            text: request.text.clone(),
            ..sentence
        };
        let first_sentence = sentence.first_sentence;
        let connector = self.connector.as_ref();
        let config = self.config.as_ref();
        let frame = &frame;

        let outcome = run_with_retry(config.max_attempts, move |_| {
            let sentence = sentence.clone();
            async move {
                let mut relay = sink.begin(sentence);
                let result = run_session(connector, config, frame, &mut relay).await;
                let finished = relay.finish().await;
                let outcome = result?;
                finished?;
                Ok(outcome)
            }
        })
        .await?;

        if outcome.audio_bytes == 0 {
            warn!(reqid = %request.reqid, "SeedTTS returned no audio, nothing relayed");
        }
        if first_sentence && let Some(latency) = outcome.first_audio_latency {
            debug!(
                reqid = %request.reqid,
                "First sentence audio after {} ms",
                latency.as_millis()
            );
        }
        Ok(outcome)
    }

    // =========================================================================
    // Streaming
    // =========================================================================

    /// Synthesizes `text` and yields each audio payload as a WAV container.
    ///
    /// The session runs on its own task and is not retried. A failure is
    /// yielded as the last item.
    pub fn synthesize_stream(
        &self,
        text: &str,
    ) -> impl Stream<Item = TTSResult<Bytes>> + Send + 'static {
        let connector = self.connector.clone();
        let config = self.config.clone();
        let format = self.audio_format();
        let prepared = self.prepare(text);

        async_stream::stream! {
            let (_request, frame) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let (tx, mut rx) = mpsc::channel(STREAM_BUFFER_SIZE);
            let task = tokio::spawn(async move {
                let mut sink = ChannelSink(tx);
                run_session(connector.as_ref(), &config, &frame, &mut sink).await
            });

            while let Some(payload) = rx.recv().await {
                yield pcm_to_wav(&payload, format).map(Bytes::from);
            }

            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => yield Err(e),
                Err(e) => yield Err(TTSError::AudioProcessingError(format!(
                    "synthesis task failed: {e}"
                ))),
            }
        }
    }
}

impl Drop for SeedTts {
    fn drop(&mut self) {
        if let Some(config) = Arc::get_mut(&mut self.config) {
            config.token.zeroize();
        }
    }
}

/// Forwards payloads to a stream consumer.
struct ChannelSink(mpsc::Sender<Bytes>);

#[async_trait]
impl AudioSink for ChannelSink {
    async fn on_audio(&mut self, payload: Bytes) -> TTSResult<()> {
        self.0
            .send(payload)
            .await
            .map_err(|_| TTSError::AudioProcessingError("stream consumer dropped".to_string()))
    }
}

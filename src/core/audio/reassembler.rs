use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::wav::{AudioFormat, pcm_to_wav};
use crate::core::tts::TTSResult;
use crate::core::tts::seedtts::AudioSink;

/// Accumulates the audio payloads of one utterance in arrival order.
///
/// Payloads are appended as-is: no reordering by sequence number and no
/// check against the size a frame declared.
#[derive(Debug, Default)]
pub struct AudioReassembler {
    buffer: BytesMut,
    chunks: usize,
}

impl AudioReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, payload: &[u8]) {
        self.buffer.extend_from_slice(payload);
        self.chunks += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of payloads appended so far.
    #[inline]
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the reassembler and returns the raw stream.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Wraps the accumulated samples in a WAV container.
    pub fn finalize(&self, format: AudioFormat) -> TTSResult<Vec<u8>> {
        pcm_to_wav(&self.buffer, format)
    }

    /// Writes the finalized container to `path`.
    ///
    /// An empty buffer writes nothing and returns `Ok(None)`.
    pub async fn persist(
        &self,
        path: impl AsRef<Path>,
        format: AudioFormat,
    ) -> TTSResult<Option<PathBuf>> {
        let path = path.as_ref();
        if self.is_empty() {
            warn!("No audio received, not writing {}", path.display());
            return Ok(None);
        }

        let wav = self.finalize(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &wav).await?;

        info!(
            "Saved {} bytes of audio ({} chunks) to {}",
            self.len(),
            self.chunks,
            path.display()
        );
        Ok(Some(path.to_path_buf()))
    }
}

#[async_trait]
impl AudioSink for AudioReassembler {
    async fn on_audio(&mut self, payload: Bytes) -> TTSResult<()> {
        self.append(&payload);
        Ok(())
    }
}

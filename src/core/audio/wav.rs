use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::core::tts::{TTSError, TTSResult};

/// PCM layout of a raw sample stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample (1, 2, 3 or 4)
    pub sample_width: u16,
}

impl AudioFormat {
    /// 16-bit mono at `sample_rate`.
    pub const fn pcm16_mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            sample_width: 2,
        }
    }

    fn spec(&self) -> TTSResult<WavSpec> {
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(TTSError::AudioProcessingError(format!(
                "invalid audio format: {} Hz, {} channels",
                self.sample_rate, self.channels
            )));
        }
        if !(1..=4).contains(&self.sample_width) {
            return Err(TTSError::AudioProcessingError(format!(
                "unsupported sample width: {} bytes",
                self.sample_width
            )));
        }
        Ok(WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.sample_width * 8,
            sample_format: SampleFormat::Int,
        })
    }
}

/// Wraps little-endian PCM bytes in a WAV container.
///
/// A trailing partial sample is dropped.
pub fn pcm_to_wav(pcm: &[u8], format: AudioFormat) -> TTSResult<Vec<u8>> {
    let spec = format.spec()?;
    let width = format.sample_width as usize;
    let map_err = |e: hound::Error| TTSError::AudioProcessingError(e.to_string());

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(map_err)?;

        for sample in pcm.chunks_exact(width) {
            match width {
                // 8-bit WAV is unsigned on disk; hound takes signed and re-biases
                1 => writer.write_sample(sample[0].wrapping_sub(128) as i8),
                2 => writer.write_sample(i16::from_le_bytes([sample[0], sample[1]])),
                3 => {
                    let value = i32::from_le_bytes([0, sample[0], sample[1], sample[2]]) >> 8;
                    writer.write_sample(value)
                }
                _ => writer.write_sample(i32::from_le_bytes([
                    sample[0], sample[1], sample[2], sample[3],
                ])),
            }
            .map_err(map_err)?;
        }

        writer.finalize().map_err(map_err)?;
    }

    Ok(cursor.into_inner())
}

/// Converts float samples in [-1.0, 1.0] to 16-bit little-endian PCM.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

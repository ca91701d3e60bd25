//! SeedTTS binary frame codec.
//!
//! Every frame starts with a 4-byte header:
//!
//! ```text
//! byte 0: [version:4][header_size:4]     header_size counts 4-byte words
//! byte 1: [kind:4][flags:4]
//! byte 2: [serialization:4][compression:4]
//! byte 3: reserved
//! ```
//!
//! Bytes `4..header_size * 4` are header extensions; the body starts right
//! after them. Body layout depends on the message kind:
//!
//! | Kind | Body |
//! |------|------|
//! | `0x1` full client request | `u32` payload length, gzip(JSON) |
//! | `0xB` audio-only response | `i32` sequence, `u32` declared size, raw audio |
//! | `0xC` frontend response | `u32` length, payload (maybe gzip) |
//! | `0xF` error | `u32` code, `u32` length, UTF-8 message (maybe gzip) |
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use thiserror::Error;

/// Protocol version understood by this client.
pub const PROTOCOL_VERSION: u8 = 0x1;

/// Header of every request this client sends: version 1, one header word,
/// full client request, no flags, JSON serialization, gzip compression.
pub const FULL_CLIENT_REQUEST_HEADER: [u8; 4] = [0x11, 0x10, 0x11, 0x00];

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 4;

/// Serialization nibble for JSON payloads.
pub const SERIALIZATION_JSON: u8 = 0x1;

/// Compression nibble: payload is stored as is.
pub const COMPRESSION_NONE: u8 = 0x0;

/// Compression nibble: payload is gzip-compressed.
pub const COMPRESSION_GZIP: u8 = 0x1;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("invalid header size: {0} words")]
    InvalidHeaderSize(u8),

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("unknown message kind: {0:#x}")]
    UnknownMessageKind(u8),

    #[error("payload decompression failed: {0}")]
    Decompression(String),

    #[error("error message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("payload compression failed: {0}")]
    Compression(String),

    #[error("request serialization failed: {0}")]
    Serialization(String),
}

/// Message kind carried in the high nibble of header byte 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Request sent by the client
    FullClientRequest,
    /// Audio chunk from the server
    AudioOnlyResponse,
    /// Informational frontend data from the server
    FrontendResponse,
    /// Application error from the server
    Error,
}

impl MessageKind {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x1 => Some(Self::FullClientRequest),
            0xB => Some(Self::AudioOnlyResponse),
            0xC => Some(Self::FrontendResponse),
            0xF => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_nibble(self) -> u8 {
        match self {
            Self::FullClientRequest => 0x1,
            Self::AudioOnlyResponse => 0xB,
            Self::FrontendResponse => 0xC,
            Self::Error => 0xF,
        }
    }
}

/// Decoded body of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    /// Audio frame without a sequence number. Carries nothing.
    Ack,
    /// Audio chunk. The declared size is advisory; `payload` holds every
    /// byte that followed it in the frame.
    Audio {
        sequence: i32,
        declared_size: u32,
        payload: Bytes,
    },
    /// Frontend information, already decompressed.
    FrontendInfo { payload: Bytes },
    /// Server-reported error.
    Error { code: u32, message: String },
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: u8,
    pub kind: MessageKind,
    pub flags: u8,
    pub serialization: u8,
    pub compression: u8,
    pub header_extensions: Bytes,
    pub body: FrameBody,
}

impl Frame {
    /// Whether no further frames should be expected after this one.
    pub fn is_terminal(&self) -> bool {
        match &self.body {
            FrameBody::Audio { sequence, .. } => *sequence < 0,
            FrameBody::Error { .. } => true,
            FrameBody::Ack | FrameBody::FrontendInfo { .. } => false,
        }
    }

    /// Audio bytes carried by this frame, if any.
    pub fn audio_payload(&self) -> Option<&Bytes> {
        match &self.body {
            FrameBody::Audio { payload, .. } if !payload.is_empty() => Some(payload),
            _ => None,
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Serialize `request` to JSON and wrap it in a full client request frame.
pub fn encode_request<T: Serialize>(request: &T) -> Result<Bytes, ProtocolError> {
    let json =
        serde_json::to_vec(request).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    encode_full_client_request(&json)
}

/// Gzip `payload` and prefix it with the request header and its length.
pub fn encode_full_client_request(payload: &[u8]) -> Result<Bytes, ProtocolError> {
    let compressed = gzip(payload)?;
    let len = u32::try_from(compressed.len())
        .map_err(|_| ProtocolError::Serialization("payload exceeds u32::MAX".to_string()))?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + 4 + compressed.len());
    buf.put_slice(&FULL_CLIENT_REQUEST_HEADER);
    buf.put_u32(len);
    buf.put_slice(&compressed);
    Ok(buf.freeze())
}

/// Recover the JSON payload of a full client request frame.
///
/// This is the server side of [`encode_request`]; mock peers use it.
pub fn decode_request_payload(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let header = parse_header(data)?;
    if header.kind_nibble != MessageKind::FullClientRequest.as_nibble() {
        return Err(ProtocolError::UnknownMessageKind(header.kind_nibble));
    }
    let body = &data[header.body_offset..];
    let len = read_u32(body, 0)? as usize;
    let payload = slice(body, 4, 4 + len)?;
    if header.compression == COMPRESSION_GZIP {
        gunzip(payload)
    } else {
        Ok(payload.to_vec())
    }
}

// =============================================================================
// Decoding
// =============================================================================

struct Header {
    version: u8,
    kind_nibble: u8,
    flags: u8,
    serialization: u8,
    compression: u8,
    body_offset: usize,
}

fn parse_header(data: &[u8]) -> Result<Header, ProtocolError> {
    if data.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: HEADER_LEN,
            actual: data.len(),
        });
    }

    let version = data[0] >> 4;
    let header_size = data[0] & 0x0f;
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    if header_size == 0 {
        return Err(ProtocolError::InvalidHeaderSize(header_size));
    }

    let body_offset = header_size as usize * 4;
    if data.len() < body_offset {
        return Err(ProtocolError::Truncated {
            needed: body_offset,
            actual: data.len(),
        });
    }

    Ok(Header {
        version,
        kind_nibble: data[1] >> 4,
        flags: data[1] & 0x0f,
        serialization: data[2] >> 4,
        compression: data[2] & 0x0f,
        body_offset,
    })
}

/// Decode one inbound frame.
pub fn decode_frame(data: &[u8]) -> Result<Frame, ProtocolError> {
    let header = parse_header(data)?;
    let header_extensions = Bytes::copy_from_slice(&data[HEADER_LEN..header.body_offset]);
    let body = &data[header.body_offset..];

    let (kind, body) = match MessageKind::from_nibble(header.kind_nibble) {
        Some(MessageKind::AudioOnlyResponse) if header.flags == 0 => {
            (MessageKind::AudioOnlyResponse, FrameBody::Ack)
        }
        Some(MessageKind::AudioOnlyResponse) => {
            let sequence = read_u32(body, 0)? as i32;
            let declared_size = read_u32(body, 4)?;
            let payload = Bytes::copy_from_slice(&body[8..]);
            (
                MessageKind::AudioOnlyResponse,
                FrameBody::Audio {
                    sequence,
                    declared_size,
                    payload,
                },
            )
        }
        Some(MessageKind::FrontendResponse) => {
            read_u32(body, 0)?;
            let payload = maybe_gunzip(&body[4..], header.compression)?;
            (
                MessageKind::FrontendResponse,
                FrameBody::FrontendInfo {
                    payload: Bytes::from(payload),
                },
            )
        }
        Some(MessageKind::Error) => {
            let code = read_u32(body, 0)?;
            read_u32(body, 4)?;
            let raw = maybe_gunzip(&body[8..], header.compression)?;
            (
                MessageKind::Error,
                FrameBody::Error {
                    code,
                    message: String::from_utf8(raw)?,
                },
            )
        }
        // Servers never send requests; treat it like any other unknown kind.
        Some(MessageKind::FullClientRequest) | None => {
            return Err(ProtocolError::UnknownMessageKind(header.kind_nibble));
        }
    };

    Ok(Frame {
        version: header.version,
        kind,
        flags: header.flags,
        serialization: header.serialization,
        compression: header.compression,
        header_extensions,
        body,
    })
}

// =============================================================================
// Helpers
// =============================================================================

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    let bytes = slice(data, offset, offset + 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn slice(data: &[u8], start: usize, end: usize) -> Result<&[u8], ProtocolError> {
    data.get(start..end).ok_or(ProtocolError::Truncated {
        needed: end,
        actual: data.len(),
    })
}

fn maybe_gunzip(data: &[u8], compression: u8) -> Result<Vec<u8>, ProtocolError> {
    if compression == COMPRESSION_GZIP {
        gunzip(data)
    } else {
        Ok(data.to_vec())
    }
}

pub(crate) fn gzip(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), GzLevel::default());
    encoder
        .write_all(data)
        .map_err(|e| ProtocolError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtocolError::Compression(e.to_string()))
}

pub(crate) fn gunzip(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ProtocolError::Decompression(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_frame(flags: u8, sequence: i32, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x11, 0xB0 | flags, 0x10, 0x00];
        frame.extend_from_slice(&sequence.to_be_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    fn error_frame(code: u32, message: &[u8], compression: u8) -> Vec<u8> {
        let body = if compression == COMPRESSION_GZIP {
            gzip(message).unwrap()
        } else {
            message.to_vec()
        };
        let mut frame = vec![0x11, 0xF0, 0x10 | compression, 0x00];
        frame.extend_from_slice(&code.to_be_bytes());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        frame
    }

    #[test]
    fn test_request_header_constant() {
        let frame = encode_full_client_request(b"{}").unwrap();
        assert_eq!(&frame[..4], &[0x11, 0x10, 0x11, 0x00]);
        let len = u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]) as usize;
        assert_eq!(len, frame.len() - 8);
    }

    #[test]
    fn test_request_payload_is_gzip_json() {
        let value = serde_json::json!({"request": {"text": "hello", "operation": "submit"}});
        let frame = encode_request(&value).unwrap();
        let payload = decode_request_payload(&frame).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_audio_frame() {
        let frame = decode_frame(&audio_frame(0x1, 3, b"abcd")).unwrap();
        assert_eq!(frame.kind, MessageKind::AudioOnlyResponse);
        assert_eq!(
            frame.body,
            FrameBody::Audio {
                sequence: 3,
                declared_size: 4,
                payload: Bytes::from_static(b"abcd"),
            }
        );
        assert!(!frame.is_terminal());
    }

    #[test]
    fn test_negative_sequence_is_terminal() {
        let frame = decode_frame(&audio_frame(0x3, -1, b"tail")).unwrap();
        assert!(frame.is_terminal());
        assert_eq!(frame.audio_payload(), Some(&Bytes::from_static(b"tail")));
    }

    #[test]
    fn test_zero_flags_audio_is_ack() {
        let frame = decode_frame(&[0x11, 0xB0, 0x10, 0x00]).unwrap();
        assert_eq!(frame.body, FrameBody::Ack);
        assert!(!frame.is_terminal());
        assert!(frame.audio_payload().is_none());
    }

    #[test]
    fn test_declared_size_is_not_enforced() {
        let mut raw = audio_frame(0x1, 0, b"abcdef");
        // Claim 2 bytes while carrying 6.
        raw[8..12].copy_from_slice(&2u32.to_be_bytes());
        let frame = decode_frame(&raw).unwrap();
        match frame.body {
            FrameBody::Audio {
                declared_size,
                payload,
                ..
            } => {
                assert_eq!(declared_size, 2);
                assert_eq!(payload.len(), 6);
            }
            other => panic!("expected audio body, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_frame_plain_and_gzip() {
        let plain = decode_frame(&error_frame(3001, b"invalid params", COMPRESSION_NONE)).unwrap();
        assert_eq!(
            plain.body,
            FrameBody::Error {
                code: 3001,
                message: "invalid params".to_string()
            }
        );
        assert!(plain.is_terminal());

        let zipped = decode_frame(&error_frame(3030, b"timeout", COMPRESSION_GZIP)).unwrap();
        assert_eq!(
            zipped.body,
            FrameBody::Error {
                code: 3030,
                message: "timeout".to_string()
            }
        );
    }

    #[test]
    fn test_decode_error_frame_invalid_utf8() {
        let result = decode_frame(&error_frame(3001, &[0x66, 0xFF, 0xFE], COMPRESSION_NONE));
        assert!(matches!(result, Err(ProtocolError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decode_frontend_info() {
        let payload = gzip(br#"{"phonemes":[]}"#).unwrap();
        let mut raw = vec![0x11, 0xC0, 0x11, 0x00];
        raw.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        raw.extend_from_slice(&payload);

        let frame = decode_frame(&raw).unwrap();
        assert_eq!(
            frame.body,
            FrameBody::FrontendInfo {
                payload: Bytes::from_static(br#"{"phonemes":[]}"#)
            }
        );
        assert!(!frame.is_terminal());
    }

    #[test]
    fn test_header_extensions_are_skipped() {
        let mut raw = vec![0x12, 0xB1, 0x10, 0x00, 0xAA, 0xBB, 0xCC, 0xDD];
        raw.extend_from_slice(&0i32.to_be_bytes());
        raw.extend_from_slice(&2u32.to_be_bytes());
        raw.extend_from_slice(b"hi");

        let frame = decode_frame(&raw).unwrap();
        assert_eq!(frame.header_extensions.as_ref(), &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(frame.audio_payload(), Some(&Bytes::from_static(b"hi")));
    }

    #[test]
    fn test_truncated_frames() {
        assert_eq!(
            decode_frame(&[0x11, 0xB1]),
            Err(ProtocolError::Truncated {
                needed: 4,
                actual: 2
            })
        );
        // Sequence number present but the size field is cut short.
        assert!(matches!(
            decode_frame(&[0x11, 0xB1, 0x10, 0x00, 0, 0, 0, 1, 0]),
            Err(ProtocolError::Truncated { .. })
        ));
        // Header claims two words but only one is present.
        assert!(matches!(
            decode_frame(&[0x12, 0xB1, 0x10, 0x00]),
            Err(ProtocolError::Truncated {
                needed: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_unknown_kind_and_bad_version() {
        assert_eq!(
            decode_frame(&[0x11, 0x90, 0x10, 0x00]),
            Err(ProtocolError::UnknownMessageKind(0x9))
        );
        assert_eq!(
            decode_frame(&[0x21, 0xB0, 0x10, 0x00]),
            Err(ProtocolError::UnsupportedVersion(2))
        );
        assert_eq!(
            decode_frame(&[0x10, 0xB0, 0x10, 0x00]),
            Err(ProtocolError::InvalidHeaderSize(0))
        );
    }

    #[test]
    fn test_corrupt_gzip_is_decode_failure() {
        let mut raw = vec![0x11, 0xF0, 0x11, 0x00];
        raw.extend_from_slice(&1u32.to_be_bytes());
        raw.extend_from_slice(&3u32.to_be_bytes());
        raw.extend_from_slice(b"not gzip");
        assert!(matches!(
            decode_frame(&raw),
            Err(ProtocolError::Decompression(_))
        ));
    }
}

//! WebSocket Mock Server for the SeedTTS binary protocol
//!
//! Each accepted connection reads the full client request, records it along
//! with the upgrade's `Authorization` header, then replays the next scripted
//! list of frames.

use bytes::{BufMut, BytesMut};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use seedtts_gateway::core::tts::seedtts::protocol::decode_request_payload;

/// One scripted server action
#[derive(Debug, Clone)]
pub enum MockFrame {
    /// Audio frame with the given sequence number
    Audio { sequence: i32, payload: Vec<u8> },
    /// Audio-only acknowledgement (no payload)
    Ack,
    /// Server error frame
    Error { code: u32, message: String },
    /// Orderly close handshake
    Close,
    /// Drop the TCP stream without a close frame
    Drop,
}

impl MockFrame {
    pub fn audio(sequence: i32, payload: &[u8]) -> Self {
        MockFrame::Audio {
            sequence,
            payload: payload.to_vec(),
        }
    }

    pub fn error(code: u32, message: &str) -> Self {
        MockFrame::Error {
            code,
            message: message.to_string(),
        }
    }

    fn encode(&self) -> Option<Vec<u8>> {
        let mut buf = BytesMut::new();
        match self {
            MockFrame::Audio { sequence, payload } => {
                buf.put_slice(&[0x11, 0xB1, 0x10, 0x00]);
                buf.put_i32(*sequence);
                buf.put_u32(payload.len() as u32);
                buf.put_slice(payload);
            }
            MockFrame::Ack => buf.put_slice(&[0x11, 0xB0, 0x10, 0x00]),
            MockFrame::Error { code, message } => {
                buf.put_slice(&[0x11, 0xF0, 0x10, 0x00]);
                buf.put_u32(*code);
                buf.put_u32(message.len() as u32);
                buf.put_slice(message.as_bytes());
            }
            MockFrame::Close | MockFrame::Drop => return None,
        }
        Some(buf.to_vec())
    }
}

/// Four audio frames `AA`, `BB`, `CC`, `DD`, the last one terminal
pub fn abcd_script() -> Vec<MockFrame> {
    vec![
        MockFrame::audio(1, b"AA"),
        MockFrame::audio(2, b"BB"),
        MockFrame::audio(3, b"CC"),
        MockFrame::audio(-4, b"DD"),
    ]
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<VecDeque<Vec<MockFrame>>>,
    connections: AtomicU32,
    requests: Mutex<Vec<Value>>,
    auth_headers: Mutex<Vec<String>>,
}

/// SeedTTS mock server bound to an ephemeral local port
pub struct SeedTtsMockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl SeedTtsMockServer {
    /// Start a server that answers connection `n` with `scripts[n]`.
    ///
    /// Connections beyond the script list are closed right after the request.
    pub async fn start(scripts: Vec<Vec<MockFrame>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let state = Arc::new(MockState {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        });

        let accept_state = state.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, state).await;
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/api/v1/tts/ws_binary", self.addr)
    }

    pub fn connections(&self) -> u32 {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Decompressed JSON of every request received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.state.auth_headers.lock().unwrap().clone()
    }
}

impl Drop for SeedTtsMockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<MockState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let header_state = state.clone();
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let auth = request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        header_state.auth_headers.lock().unwrap().push(auth);
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();
    state.connections.fetch_add(1, Ordering::SeqCst);

    // The client speaks first with exactly one request frame
    let request = loop {
        match read.next().await {
            Some(Ok(Message::Binary(data))) => break data,
            Some(Ok(_)) => continue,
            _ => return Ok(()),
        }
    };
    let payload = decode_request_payload(&request)?;
    let json: Value = serde_json::from_slice(&payload)?;
    state.requests.lock().unwrap().push(json);

    let script = state
        .scripts
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| vec![MockFrame::Close]);
    for frame in script {
        match frame {
            MockFrame::Drop => return Ok(()),
            MockFrame::Close => {
                write.send(Message::Close(None)).await?;
                break;
            }
            other => {
                if let Some(data) = other.encode() {
                    write.send(Message::Binary(data.into())).await?;
                }
            }
        }
    }

    // Hold the socket until the client hangs up
    while let Some(Ok(_)) = read.next().await {}
    Ok(())
}

//! TTS relay WebSocket handler
//!
//! Each `speak` message starts its own SeedTTS session. All sessions of one
//! socket relay through a single [`RelaySink`], so their sentences reach the
//! client one at a time even when synthesis overlaps.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::core::relay::{ChannelDownstream, RelayFrame, RelaySink, SentenceInfo};
use crate::state::AppState;

use super::messages::{TtsIncomingMessage, TtsMessageRoute, TtsOutgoingMessage};

/// Optimized channel buffer size for audio workloads
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

type SocketRelay = RelaySink<ChannelDownstream<TtsMessageRoute>>;

/// TTS relay WebSocket handler
///
/// Upgrades the HTTP connection to a WebSocket that accepts `speak` requests
/// and streams back relay markers and binary audio chunks.
pub async fn tts_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("TTS WebSocket connection upgrade requested");

    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_tts_socket(socket, state))
}

/// Handle the TTS WebSocket connection
async fn handle_tts_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("TTS WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<TtsMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                TtsMessageRoute::Relay(RelayFrame::Audio(data)) => {
                    sender.send(Message::Binary(data)).await
                }
                TtsMessageRoute::Relay(RelayFrame::Control(control)) => {
                    match serde_json::to_string(&control) {
                        Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                        Err(e) => {
                            error!("Failed to serialize relay marker: {}", e);
                            continue;
                        }
                    }
                }
                TtsMessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let relay: Arc<SocketRelay> = Arc::new(RelaySink::new(
        ChannelDownstream::new(message_tx.clone()),
        app_state.config.relay.clone(),
    ));
    let mut sessions = JoinSet::new();

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                debug!("Received text message: {} bytes", text.len());
                handle_text_message(&text, &app_state, &relay, &message_tx, &mut sessions).await;
            }
            Ok(Message::Binary(data)) => {
                warn!("Ignoring binary message from client: {} bytes", data.len());
            }
            Ok(Message::Close(_)) => {
                info!("TTS WebSocket connection closed by client");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("TTS WebSocket error: {}", e);
                break;
            }
        }

        // Reap finished sessions
        while sessions.try_join_next().is_some() {}
    }

    // Cleanup
    sessions.abort_all();
    sender_task.abort();

    info!("TTS WebSocket connection terminated");
}

/// Parse one client message and start its session
async fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    relay: &Arc<SocketRelay>,
    message_tx: &mpsc::Sender<TtsMessageRoute>,
    sessions: &mut JoinSet<()>,
) {
    let incoming: TtsIncomingMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            error!("Failed to parse TTS message: {}", e);
            send_error(message_tx, format!("Invalid message format: {e}"), None).await;
            return;
        }
    };

    if let Err(e) = incoming.validate_size() {
        warn!("Message validation failed: {}", e);
        send_error(message_tx, e, None).await;
        return;
    }

    match incoming {
        TtsIncomingMessage::Speak {
            text,
            sentence_id,
            first_sentence,
        } => {
            let tts = app_state.tts.clone();
            let relay = relay.clone();
            let message_tx = message_tx.clone();

            sessions.spawn(async move {
                let sentence = SentenceInfo::new(sentence_id, text.clone()).first(first_sentence);
                match tts.relay(&text, relay.as_ref(), sentence).await {
                    Ok(outcome) => {
                        debug!(
                            sentence_id,
                            bytes = outcome.audio_bytes,
                            "Sentence relayed"
                        );
                    }
                    Err(e) => {
                        error!(sentence_id, "Sentence synthesis failed: {}", e);
                        send_error(&message_tx, e.to_string(), Some(sentence_id)).await;
                    }
                }
            });
        }
    }
}

async fn send_error(
    message_tx: &mpsc::Sender<TtsMessageRoute>,
    message: String,
    sentence_id: Option<u32>,
) {
    let _ = message_tx
        .send(TtsMessageRoute::Outgoing(TtsOutgoingMessage::Error {
            message,
            sentence_id,
        }))
        .await;
}

//! Audio accumulation channel
//!
//! Binary frames are appended to a per-socket buffer and acknowledged one by
//! one. The buffer is handed back when the socket ends; nothing is transcribed
//! on this path.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension,
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{AUDIO_READY_MESSAGE, ChannelEvent, ChannelFrame, MessageRoute};
use super::{close_socket, spawn_sender};
use crate::middleware::ClientIp;
use crate::state::{AppState, ConnectionSlot};

/// Sent when the accumulated audio would exceed the configured cap
pub const BUFFER_LIMIT_MESSAGE: &str = "Audio buffer limit exceeded";

/// Why an audio stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCloseReason {
    Timeout,
    Disconnect,
    Overflow,
}

/// Audio captured by one stream
#[derive(Debug)]
pub struct AudioStreamOutcome {
    pub buffer: Bytes,
    pub reason: AudioCloseReason,
}

/// Upgrade `GET /ws/audio/{call_id}` to an audio stream.
pub async fn audio_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    info!(call_id = %call_id, "Audio stream upgrade requested");

    let slot = client_ip.map(|Extension(ClientIp(ip))| ConnectionSlot::new(state.clone(), ip));
    let max_message_size = state.config.max_audio_buffer_bytes;

    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| async move {
            let _slot = slot;
            handle_audio_socket(socket, state, call_id).await;
        })
}

async fn handle_audio_socket(socket: WebSocket, state: Arc<AppState>, call_id: String) {
    let (sender, receiver) = socket.split();
    let (message_tx, sender_task) = spawn_sender(sender);

    let inbound = receiver.map(|frame| frame.map(ChannelFrame::from));
    let outcome = run_audio_stream(
        inbound,
        &message_tx,
        &call_id,
        state.config.audio_idle_timeout(),
        state.config.max_audio_buffer_bytes,
    )
    .await;

    info!(
        call_id = %call_id,
        bytes = outcome.buffer.len(),
        reason = ?outcome.reason,
        "Audio stream closed"
    );

    close_socket(message_tx, sender_task).await;
}

/// Accumulate binary frames until the stream ends, goes idle, or overflows.
///
/// Every non-empty chunk is acknowledged with the running buffer size. Text,
/// control and empty binary frames are ignored.
pub async fn run_audio_stream<S, E>(
    mut inbound: S,
    outbound: &mpsc::Sender<MessageRoute>,
    call_id: &str,
    idle_timeout: Duration,
    max_buffer_bytes: usize,
) -> AudioStreamOutcome
where
    S: Stream<Item = Result<ChannelFrame, E>> + Unpin,
    E: Display,
{
    let mut buffer = BytesMut::new();

    let ready = ChannelEvent::AudioStreamReady {
        message: AUDIO_READY_MESSAGE.to_string(),
        call_id: call_id.to_string(),
    };
    if outbound.send(MessageRoute::Outgoing(ready)).await.is_err() {
        return AudioStreamOutcome {
            buffer: buffer.freeze(),
            reason: AudioCloseReason::Disconnect,
        };
    }

    let reason = loop {
        let frame = match tokio::time::timeout(idle_timeout, inbound.next()).await {
            Err(_) => {
                debug!(call_id = %call_id, "Audio stream idle, closing");
                break AudioCloseReason::Timeout;
            }
            Ok(None) | Ok(Some(Ok(ChannelFrame::Close))) => break AudioCloseReason::Disconnect,
            Ok(Some(Err(e))) => {
                warn!(call_id = %call_id, error = %e, "Audio socket error");
                break AudioCloseReason::Disconnect;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        let chunk = match frame {
            ChannelFrame::Binary(chunk) if !chunk.is_empty() => chunk,
            ChannelFrame::Text(_) => {
                debug!(call_id = %call_id, "Ignoring text frame on audio channel");
                continue;
            }
            _ => continue,
        };

        if buffer.len() + chunk.len() > max_buffer_bytes {
            warn!(
                call_id = %call_id,
                buffered = buffer.len(),
                chunk = chunk.len(),
                limit = max_buffer_bytes,
                "Audio buffer limit exceeded"
            );
            let _ = outbound
                .send(MessageRoute::Outgoing(ChannelEvent::error(BUFFER_LIMIT_MESSAGE)))
                .await;
            break AudioCloseReason::Overflow;
        }

        buffer.extend_from_slice(&chunk);
        let ack = ChannelEvent::AudioReceived {
            bytes_received: chunk.len(),
            buffer_size: buffer.len(),
        };
        if outbound.send(MessageRoute::Outgoing(ack)).await.is_err() {
            break AudioCloseReason::Disconnect;
        }
    };

    AudioStreamOutcome {
        buffer: buffer.freeze(),
        reason,
    }
}

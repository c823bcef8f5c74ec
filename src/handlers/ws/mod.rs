//! Streaming WebSocket channels
//!
//! # Conversation channel
//!
//! `GET /ws/calls/{call_id}/{voice_profile}`
//!
//! ## Client → Server
//!
//! - **Text frames**: `{"text": "..."}` or the raw utterance
//! - `exit`, `quit` or `bye` on their own end the conversation
//!
//! ## Server → Client
//!
//! - **greeting**: first event after the upgrade
//! - **response**: one per inbound text frame
//! - **closing**: reply to an exit keyword
//! - **timeout**: idle window elapsed
//! - **error**: unknown voice profile, unsupported frame, or ended call
//!
//! # Audio channel
//!
//! `GET /ws/audio/{call_id}`
//!
//! - **Binary frames**: raw audio chunks, acknowledged with **audio_received**
//! - **audio_stream_ready** is sent once after the upgrade

mod audio;
mod conversation;
pub mod messages;

pub use audio::{AudioCloseReason, AudioStreamOutcome, audio_stream_handler, run_audio_stream};
pub use conversation::{
    CALL_ENDED_MESSAGE, CloseReason, ConversationContext, UNSUPPORTED_FRAME_MESSAGE,
    conversation_handler, run_conversation,
};

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, stream::SplitSink};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error};

use messages::MessageRoute;

/// Outbound queue depth per socket
const CHANNEL_BUFFER_SIZE: usize = 256;

/// How long the sender task gets to flush after the loop ends
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn the task that owns the write half of a socket.
fn spawn_sender(
    mut sender: SplitSink<WebSocket, Message>,
) -> (mpsc::Sender<MessageRoute>, JoinHandle<()>) {
    let (message_tx, mut message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    let task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, MessageRoute::Close);

            let result = match route {
                MessageRoute::Outgoing(event) => match serde_json::to_string(&event) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing event: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close => sender.send(Message::Close(None)).await,
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    (message_tx, task)
}

/// Close the socket and wait for queued events to go out.
async fn close_socket(message_tx: mpsc::Sender<MessageRoute>, sender_task: JoinHandle<()>) {
    let _ = message_tx.send(MessageRoute::Close).await;
    drop(message_tx);

    let abort = sender_task.abort_handle();
    if tokio::time::timeout(SENDER_DRAIN_TIMEOUT, sender_task)
        .await
        .is_err()
    {
        debug!("Sender task did not drain in time, aborting");
        abort.abort();
    }
}

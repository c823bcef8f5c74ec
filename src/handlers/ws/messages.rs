//! Streaming channel message types
//!
//! Outbound events are JSON objects tagged by `type`. Inbound text frames are
//! either `{"text": "..."}` or the raw utterance itself.

use axum::extract::ws::Message;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Maximum accepted size for one inbound text frame (50 KB)
pub const MAX_TEXT_SIZE: usize = 50 * 1024;

/// Utterances that end a conversation when sent on their own
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Sent when no inbound frame arrives within the idle window
pub const TIMEOUT_MESSAGE: &str = "No response received. Connection timeout.";

/// Sent when the audio stream is accepted
pub const AUDIO_READY_MESSAGE: &str = "Audio stream handler ready";

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Events pushed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Greeting {
        message: String,
        call_id: String,
    },
    Response {
        message: String,
        user_input: String,
        call_id: String,
    },
    Closing {
        message: String,
        call_id: String,
    },
    Timeout {
        message: String,
    },
    Error {
        message: String,
    },
    AudioStreamReady {
        message: String,
        call_id: String,
    },
    AudioReceived {
        bytes_received: usize,
        buffer_size: usize,
    },
}

impl ChannelEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::Timeout {
            message: TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// Message routing for the socket sender task
#[derive(Debug)]
pub enum MessageRoute {
    /// JSON event
    Outgoing(ChannelEvent),
    /// Close the socket
    Close,
}

// =============================================================================
// Incoming Frames (Client -> Server)
// =============================================================================

/// Transport-independent view of an inbound socket frame
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    Text(String),
    Binary(Bytes),
    /// Ping or pong; never a turn
    Control,
    Close,
}

impl From<Message> for ChannelFrame {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => Self::Text(text.as_str().to_owned()),
            Message::Binary(data) => Self::Binary(data),
            Message::Ping(_) | Message::Pong(_) => Self::Control,
            Message::Close(_) => Self::Close,
        }
    }
}

#[derive(Deserialize)]
struct TextFrame {
    #[serde(default)]
    text: Option<String>,
}

/// Extract the utterance from a text frame.
///
/// A JSON object yields its `text` field (empty when absent); anything else
/// is taken verbatim.
pub fn decode_utterance(payload: &str) -> String {
    let trimmed = payload.trim_start();
    if trimmed.starts_with('{')
        && let Ok(frame) = serde_json::from_str::<TextFrame>(payload)
    {
        return frame.text.unwrap_or_default();
    }
    payload.to_string()
}

/// True when the whole utterance is an exit keyword, ignoring case and
/// surrounding whitespace.
pub fn is_exit_keyword(utterance: &str) -> bool {
    let normalized = utterance.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

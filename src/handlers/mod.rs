//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `calls` - Call session management and statistics
//! - `speech` - Text-to-speech and speech-to-text REST API
//! - `ws` - Conversation and audio WebSocket channels

pub mod api;
pub mod calls;
pub mod speech;
pub mod ws;

pub use ws::{audio_stream_handler, conversation_handler};

//! Call session lifecycle: creation, turn appends, ending and statistics.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{
    CallStats, CallStatus, CallSummary, Session, SessionDescriptor, SessionSnapshot, Turn,
    TurnRole,
};

use thiserror::Error;

/// Errors raised by session lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No live session with this identifier
    #[error("Call {0} not found")]
    NotFound(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

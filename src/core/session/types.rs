use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::core::dialogue::Persona;

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a call. Only ever moves `Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Completed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// One utterance in a call. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub turn_id: String,
    pub role: TurnRole,
    pub text: String,
    /// Recognition confidence in `[0, 1]`; always 1.0 for assistant turns
    pub confidence: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Turn {
    /// `"role: text"` transcript line
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

/// Live call state held by the session store.
#[derive(Debug, Clone)]
pub struct Session {
    pub call_id: String,
    pub user_id: String,
    pub persona: Persona,
    pub status: CallStatus,
    pub started_at: OffsetDateTime,
    pub turns: Vec<Turn>,
}

impl Session {
    pub fn transcript(&self) -> Vec<String> {
        self.turns.iter().map(Turn::transcript_line).collect()
    }
}

/// Record returned when a call ends; the only thing that outlives the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub call_id: String,
    pub user_id: String,
    pub voice_profile: Persona,
    pub status: CallStatus,
    /// Seconds between creation and end
    pub duration: f64,
    pub turns: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
}

/// Non-destructive view of a live call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub call_id: String,
    pub user_id: String,
    pub voice_profile: Persona,
    pub status: CallStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub turns_count: usize,
    pub transcript: Vec<String>,
}

/// Lightweight listing entry for a live call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDescriptor {
    pub call_id: String,
    pub user_id: String,
    pub voice_profile: Persona,
    pub status: CallStatus,
}

/// Aggregate dashboard numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CallStats {
    pub total_calls: usize,
    pub active_calls: usize,
    pub completed_calls: usize,
    /// Mean completed call length, in minutes
    pub average_duration: f64,
    pub total_conversation_minutes: f64,
}

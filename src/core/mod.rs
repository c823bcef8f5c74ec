pub mod dialogue;
pub mod orchestrator;
pub mod session;
pub mod speech;

pub use dialogue::{DialogueScript, DialogueState, Persona, PersonaParseError};
pub use orchestrator::{BindError, ConversationGuard, Orchestrator};
pub use session::{
    CallStats, CallStatus, CallSummary, SessionDescriptor, SessionError, SessionSnapshot,
    SessionStore, Turn, TurnRole,
};
pub use speech::{
    GoogleSpeechClient, GoogleSpeechConfig, SpeechError, SpeechGateway, SpeechService,
    Transcription,
};

//! Scripted Dutch dialogue personas.
//!
//! Each persona is a small, deterministic-in-category script: the caller supplies
//! the random source, so the text chosen within a category can be pinned down in
//! tests by seeding a `StdRng`.
//!
//! # Personas
//!
//! - `lifestyle` - casual check-in coach ([`LifestyleCoach`])
//! - `business` - structured intake assistant ([`BusinessIntake`])
//!
//! # Example
//!
//! ```rust
//! use dutch_voice_gateway::core::dialogue::{DialogueState, Persona};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let state = DialogueState::new(Persona::Lifestyle);
//! let (reply, state) = state.respond("Ik ben gestrest", &mut rng);
//! assert!(!reply.is_empty());
//! assert_eq!(state.persona(), Persona::Lifestyle);
//! ```

mod business;
mod lifestyle;
mod persona;

pub use business::{
    ASK_NAME, BusinessIntake, CLOSING_ACKNOWLEDGEMENT, FORWARDED_ACKNOWLEDGEMENT, IntakeStep,
};
pub use lifestyle::{LifestyleCoach, Topic};
pub use persona::{Persona, PersonaParseError};

use rand::Rng;
use rand::RngCore;

/// Capability interface shared by every persona script.
///
/// `greeting` and `closing` are associated functions: they never see the
/// per-session state. `respond` is pure and hands back the next state instead of
/// mutating in place.
pub trait DialogueScript: Sized {
    /// Persona this script speaks for
    const PERSONA: Persona;

    /// Opening line of a conversation
    fn greeting(rng: &mut dyn RngCore) -> &'static str;

    /// Next utterance for `user_text`, together with the advanced state
    fn respond(&self, user_text: &str, rng: &mut dyn RngCore) -> (String, Self);

    /// Final line of a conversation
    fn closing(rng: &mut dyn RngCore) -> &'static str;
}

/// Per-session dialogue memory, tagged by persona.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueState {
    Lifestyle(LifestyleCoach),
    Business(BusinessIntake),
}

impl DialogueState {
    /// Fresh state for a persona
    pub fn new(persona: Persona) -> Self {
        match persona {
            Persona::Lifestyle => Self::Lifestyle(LifestyleCoach::default()),
            Persona::Business => Self::Business(BusinessIntake::default()),
        }
    }

    pub fn persona(&self) -> Persona {
        match self {
            Self::Lifestyle(_) => LifestyleCoach::PERSONA,
            Self::Business(_) => BusinessIntake::PERSONA,
        }
    }

    pub fn greeting(&self, rng: &mut dyn RngCore) -> &'static str {
        greeting(self.persona(), rng)
    }

    pub fn closing(&self, rng: &mut dyn RngCore) -> &'static str {
        closing(self.persona(), rng)
    }

    /// Produce the reply to `user_text` and the state to keep for the next turn.
    pub fn respond(&self, user_text: &str, rng: &mut dyn RngCore) -> (String, Self) {
        match self {
            Self::Lifestyle(script) => {
                let (reply, next) = script.respond(user_text, rng);
                (reply, Self::Lifestyle(next))
            }
            Self::Business(script) => {
                let (reply, next) = script.respond(user_text, rng);
                (reply, Self::Business(next))
            }
        }
    }
}

/// Opening line for `persona`
pub fn greeting(persona: Persona, rng: &mut dyn RngCore) -> &'static str {
    match persona {
        Persona::Lifestyle => LifestyleCoach::greeting(rng),
        Persona::Business => BusinessIntake::greeting(rng),
    }
}

/// Final line for `persona`
pub fn closing(persona: Persona, rng: &mut dyn RngCore) -> &'static str {
    match persona {
        Persona::Lifestyle => LifestyleCoach::closing(rng),
        Persona::Business => BusinessIntake::closing(rng),
    }
}

/// Uniform pick from a fixed list of lines.
pub(crate) fn pick(rng: &mut dyn RngCore, options: &[&'static str]) -> &'static str {
    if options.is_empty() {
        return "";
    }
    options[rng.gen_range(0..options.len())]
}

/// True when any cue occurs as a substring of the lowercased text.
pub(crate) fn contains_any(lowered: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| lowered.contains(cue))
}

//! Per-call conversation driver.
//!
//! The orchestrator keeps one [`DialogueState`] per bound call id. A
//! conversation channel binds a call with [`Orchestrator::bind`] and gets back a
//! [`ConversationGuard`]; dropping the guard releases the binding, so the state
//! is discarded on every exit path of the channel (closing, timeout, disconnect
//! or a fault).
//!
//! A call has at most one live binding. Binding a call that is already bound
//! fails with [`BindError::AlreadyBound`] and leaves the existing conversation
//! untouched. Each binding carries a generation number so a guard whose binding
//! was discarded never releases a newer binding for the same call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::dialogue::{DialogueState, Persona};
use crate::core::session::{SessionError, SessionResult};

/// Errors raised when binding a conversation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Another channel already drives this call
    #[error("Call {0} already has an open conversation")]
    AlreadyBound(String),
}

struct Binding {
    generation: u64,
    state: DialogueState,
    rng: StdRng,
}

/// Registry of active dialogue states, keyed by call id
pub struct Orchestrator {
    bindings: DashMap<String, Binding>,
    next_generation: AtomicU64,
    seed: Option<u64>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("bindings", &self.bindings.len())
            .field("seeded", &self.seed.is_some())
            .finish()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
            next_generation: AtomicU64::new(1),
            seed: None,
        }
    }

    /// Orchestrator whose reply picks are reproducible.
    ///
    /// Every binding gets its own `StdRng` seeded from `seed` and the binding
    /// generation.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    /// Bind `call_id` to a fresh dialogue state for `persona`.
    ///
    /// Fails while another guard for the same call is alive.
    pub fn bind(
        self: &Arc<Self>,
        call_id: impl Into<String>,
        persona: Persona,
    ) -> Result<ConversationGuard, BindError> {
        let call_id = call_id.into();

        let generation = match self.bindings.entry(call_id.clone()) {
            Entry::Occupied(_) => {
                warn!(call_id = %call_id, "Call already has an open conversation");
                return Err(BindError::AlreadyBound(call_id));
            }
            Entry::Vacant(slot) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(generation)),
                    None => StdRng::from_entropy(),
                };
                slot.insert(Binding {
                    generation,
                    state: DialogueState::new(persona),
                    rng,
                });
                generation
            }
        };
        debug!(call_id = %call_id, voice_profile = %persona, generation, "Conversation bound");

        Ok(ConversationGuard {
            orchestrator: Arc::clone(self),
            call_id,
            persona,
            generation,
        })
    }

    /// Drop the dialogue state of `call_id`, if any. Returns whether one existed.
    pub fn discard(&self, call_id: &str) -> bool {
        let removed = self.bindings.remove(call_id).is_some();
        if removed {
            debug!(call_id = %call_id, "Conversation binding discarded");
        }
        removed
    }

    pub fn is_bound(&self, call_id: &str) -> bool {
        self.bindings.contains_key(call_id)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn with_binding<T>(
        &self,
        call_id: &str,
        generation: u64,
        f: impl FnOnce(&mut Binding) -> T,
    ) -> SessionResult<T> {
        match self.bindings.get_mut(call_id) {
            Some(mut binding) if binding.generation == generation => Ok(f(&mut *binding)),
            _ => Err(SessionError::NotFound(call_id.to_string())),
        }
    }

    fn release(&self, call_id: &str, generation: u64) {
        let removed = self
            .bindings
            .remove_if(call_id, |_, binding| binding.generation == generation);
        if removed.is_some() {
            debug!(call_id = %call_id, generation, "Conversation binding released");
        }
    }
}

/// Scoped handle on one bound conversation.
///
/// All operations fail with [`SessionError::NotFound`] once the binding has been
/// discarded.
pub struct ConversationGuard {
    orchestrator: Arc<Orchestrator>,
    call_id: String,
    persona: Persona,
    generation: u64,
}

impl std::fmt::Debug for ConversationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationGuard")
            .field("call_id", &self.call_id)
            .field("persona", &self.persona)
            .field("generation", &self.generation)
            .finish()
    }
}

impl ConversationGuard {
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Opening line for the bound persona
    pub fn start(&self) -> SessionResult<String> {
        self.orchestrator
            .with_binding(&self.call_id, self.generation, |binding| {
                binding.state.greeting(&mut binding.rng).to_string()
            })
    }

    /// Advance the dialogue with one user utterance and return the reply.
    pub fn turn(&self, user_text: &str) -> SessionResult<String> {
        self.orchestrator
            .with_binding(&self.call_id, self.generation, |binding| {
                let (reply, next) = binding.state.respond(user_text, &mut binding.rng);
                binding.state = next;
                reply
            })
    }

    /// Closing line for the bound persona
    pub fn finish(&self) -> SessionResult<String> {
        self.orchestrator
            .with_binding(&self.call_id, self.generation, |binding| {
                binding.state.closing(&mut binding.rng).to_string()
            })
    }

    /// Current dialogue state, for inspection
    pub fn state(&self) -> SessionResult<DialogueState> {
        self.orchestrator
            .with_binding(&self.call_id, self.generation, |binding| {
                binding.state.clone()
            })
    }
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.orchestrator.release(&self.call_id, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogue::{IntakeStep, Topic};

    fn orchestrator() -> Arc<Orchestrator> {
        Arc::new(Orchestrator::with_seed(17))
    }

    #[test]
    fn test_guard_drop_releases_binding() {
        let orchestrator = orchestrator();
        {
            let guard = orchestrator.bind("call-1", Persona::Lifestyle).unwrap();
            assert!(orchestrator.is_bound("call-1"));
            assert!(!guard.start().unwrap().is_empty());
        }
        assert!(!orchestrator.is_bound("call-1"));
        assert_eq!(orchestrator.binding_count(), 0);
    }

    #[test]
    fn test_turns_advance_business_state() {
        let orchestrator = orchestrator();
        let guard = orchestrator.bind("call-2", Persona::Business).unwrap();

        guard.turn("Mijn naam is Jansen").unwrap();
        match guard.state().unwrap() {
            DialogueState::Business(intake) => {
                assert_eq!(intake.step, IntakeStep::AwaitingIssue);
                assert_eq!(intake.customer_name.as_deref(), Some("Mijn naam is Jansen"));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_lifestyle_topic_is_remembered() {
        let orchestrator = orchestrator();
        let guard = orchestrator.bind("call-3", Persona::Lifestyle).unwrap();
        guard.turn("Ik ben zo moe").unwrap();
        assert_eq!(
            guard.state().unwrap(),
            DialogueState::Lifestyle(crate::core::dialogue::LifestyleCoach {
                current_topic: Some(Topic::Sleep)
            })
        );
    }

    #[test]
    fn test_discarded_binding_reports_not_found() {
        let orchestrator = orchestrator();
        let guard = orchestrator.bind("call-4", Persona::Lifestyle).unwrap();
        assert!(orchestrator.discard("call-4"));

        assert_eq!(
            guard.turn("hallo").unwrap_err(),
            SessionError::NotFound("call-4".to_string())
        );
        assert!(guard.finish().is_err());
        assert!(!orchestrator.discard("call-4"));
    }

    #[test]
    fn test_second_bind_is_refused_while_first_is_live() {
        let orchestrator = orchestrator();
        let first = orchestrator.bind("call-5", Persona::Lifestyle).unwrap();

        assert_eq!(
            orchestrator.bind("call-5", Persona::Business).unwrap_err(),
            BindError::AlreadyBound("call-5".to_string())
        );

        // The first conversation carries on untouched
        first.turn("Ik ben moe").unwrap();
        assert_eq!(first.state().unwrap().persona(), Persona::Lifestyle);

        drop(first);
        assert!(orchestrator.bind("call-5", Persona::Business).is_ok());
    }

    #[test]
    fn test_stale_guard_does_not_release_newer_binding() {
        let orchestrator = orchestrator();
        let first = orchestrator.bind("call-6", Persona::Lifestyle).unwrap();
        assert!(orchestrator.discard("call-6"));
        let second = orchestrator.bind("call-6", Persona::Business).unwrap();

        assert!(first.start().is_err());
        drop(first);

        assert!(orchestrator.is_bound("call-6"));
        assert_eq!(second.state().unwrap().persona(), Persona::Business);
        drop(second);
        assert!(!orchestrator.is_bound("call-6"));
    }

    #[test]
    fn test_seeded_orchestrators_agree() {
        let a = orchestrator();
        let b = orchestrator();
        let ga = a.bind("x", Persona::Lifestyle).unwrap();
        let gb = b.bind("x", Persona::Lifestyle).unwrap();

        assert_eq!(ga.start().unwrap(), gb.start().unwrap());
        assert_eq!(
            ga.turn("Ik heb stress").unwrap(),
            gb.turn("Ik heb stress").unwrap()
        );
        assert_eq!(ga.finish().unwrap(), gb.finish().unwrap());
    }

    #[test]
    fn test_independent_calls_do_not_share_state() {
        let orchestrator = orchestrator();
        let a = orchestrator.bind("a", Persona::Business).unwrap();
        let b = orchestrator.bind("b", Persona::Business).unwrap();

        a.turn("ik heet Anne").unwrap();
        match b.state().unwrap() {
            DialogueState::Business(intake) => assert_eq!(intake.step, IntakeStep::AwaitingName),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(orchestrator.binding_count(), 2);
    }
}

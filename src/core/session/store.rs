//! In-memory call session store
//!
//! Sessions live in a `DashMap` keyed by call id, so mutations of one call only
//! contend with other mutations of the same shard and never with a global lock.
//! Ending a call evicts it; the store keeps only running totals of completed
//! calls for the dashboard statistics.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{
    CallStats, CallStatus, CallSummary, Session, SessionDescriptor, SessionSnapshot, Turn,
    TurnRole,
};
use super::{SessionError, SessionResult};
use crate::core::dialogue::Persona;

/// Totals over every call that has been ended
#[derive(Debug, Default, Clone, Copy)]
struct CompletedTotals {
    calls: usize,
    duration_seconds: f64,
}

/// Live call registry
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    completed: Mutex<CompletedTotals>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new active call and return its identifier.
    pub fn create(&self, user_id: impl Into<String>, persona: Persona) -> String {
        let user_id = user_id.into();
        let started_at = OffsetDateTime::now_utc();

        loop {
            let call_id = Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = self.sessions.entry(call_id.clone()) {
                slot.insert(Session {
                    call_id: call_id.clone(),
                    user_id: user_id.clone(),
                    persona,
                    status: CallStatus::Active,
                    started_at,
                    turns: Vec::new(),
                });
                info!(
                    call_id = %call_id,
                    user_id = %user_id,
                    voice_profile = %persona,
                    "Call created"
                );
                return call_id;
            }
        }
    }

    /// Append a turn to a live call.
    ///
    /// Assistant turns always carry confidence 1.0; user confidence is clamped
    /// to `[0, 1]`.
    pub fn append_turn(
        &self,
        call_id: &str,
        role: TurnRole,
        text: impl Into<String>,
        confidence: f32,
    ) -> SessionResult<()> {
        let mut session = self
            .sessions
            .get_mut(call_id)
            .ok_or_else(|| SessionError::NotFound(call_id.to_string()))?;

        let confidence = match role {
            TurnRole::Assistant => 1.0,
            TurnRole::User if confidence.is_nan() => 0.0,
            TurnRole::User => confidence.clamp(0.0, 1.0),
        };

        session.turns.push(Turn {
            turn_id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            confidence,
            timestamp: OffsetDateTime::now_utc(),
        });

        debug!(call_id = %call_id, role = %role, turns = session.turns.len(), "Turn added");
        Ok(())
    }

    /// End a call now. See [`SessionStore::end_at`].
    pub fn end(&self, call_id: &str) -> SessionResult<CallSummary> {
        self.end_at(call_id, OffsetDateTime::now_utc())
    }

    /// End a call as of `ended_at`, evicting it from the live map.
    ///
    /// A second `end` for the same id fails with `NotFound`.
    pub fn end_at(&self, call_id: &str, ended_at: OffsetDateTime) -> SessionResult<CallSummary> {
        let (_, session) = self
            .sessions
            .remove(call_id)
            .ok_or_else(|| SessionError::NotFound(call_id.to_string()))?;

        let duration = (ended_at - session.started_at).as_seconds_f64().max(0.0);

        {
            let mut totals = self.completed.lock();
            totals.calls += 1;
            totals.duration_seconds += duration;
        }

        info!(call_id = %call_id, duration_seconds = duration, "Call ended");

        Ok(CallSummary {
            call_id: session.call_id,
            user_id: session.user_id,
            voice_profile: session.persona,
            status: CallStatus::Completed,
            duration,
            turns: session.turns.len(),
            end_time: ended_at,
        })
    }

    /// Snapshot of a live call, or `None` if it is unknown or already ended.
    pub fn summary(&self, call_id: &str) -> Option<SessionSnapshot> {
        self.sessions.get(call_id).map(|session| SessionSnapshot {
            call_id: session.call_id.clone(),
            user_id: session.user_id.clone(),
            voice_profile: session.persona,
            status: session.status,
            start_time: session.started_at,
            turns_count: session.turns.len(),
            transcript: session.transcript(),
        })
    }

    /// Ordered `"role: text"` lines of a live call
    pub fn transcript(&self, call_id: &str) -> Option<Vec<String>> {
        self.sessions.get(call_id).map(|session| session.transcript())
    }

    /// Full turn records of a live call
    pub fn turns(&self, call_id: &str) -> Option<Vec<Turn>> {
        self.sessions.get(call_id).map(|session| session.turns.clone())
    }

    pub fn contains(&self, call_id: &str) -> bool {
        self.sessions.contains_key(call_id)
    }

    /// Voice profile a live call was created with
    pub fn persona(&self, call_id: &str) -> Option<Persona> {
        self.sessions.get(call_id).map(|session| session.persona)
    }

    pub fn list_active(&self) -> Vec<SessionDescriptor> {
        self.sessions
            .iter()
            .map(|entry| SessionDescriptor {
                call_id: entry.call_id.clone(),
                user_id: entry.user_id.clone(),
                voice_profile: entry.persona,
                status: entry.status,
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Dashboard statistics: live calls plus totals of ended calls.
    pub fn stats(&self) -> CallStats {
        let active_calls = self.sessions.len();
        let totals = *self.completed.lock();
        let total_conversation_minutes = totals.duration_seconds / 60.0;
        let average_duration = if totals.calls > 0 {
            total_conversation_minutes / totals.calls as f64
        } else {
            0.0
        };

        CallStats {
            total_calls: active_calls + totals.calls,
            active_calls,
            completed_calls: totals.calls,
            average_duration,
            total_conversation_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use time::Duration;

    #[test]
    fn test_create_initializes_active_session() {
        let store = SessionStore::new();
        let call_id = store.create("user_123", Persona::Lifestyle);

        let snapshot = store.summary(&call_id).unwrap();
        assert_eq!(snapshot.user_id, "user_123");
        assert_eq!(snapshot.voice_profile, Persona::Lifestyle);
        assert_eq!(snapshot.status, CallStatus::Active);
        assert_eq!(snapshot.turns_count, 0);
        assert!(snapshot.transcript.is_empty());
    }

    #[test]
    fn test_identifiers_are_unique() {
        let store = SessionStore::new();
        let mut ids = HashSet::new();
        for i in 0..1000 {
            let id = store.create(format!("user_{i}"), Persona::Business);
            assert!(ids.insert(id));
        }
        // Ended ids are not handed out again either
        for id in ids.iter().take(500) {
            store.end(id).unwrap();
        }
        for _ in 0..500 {
            assert!(ids.insert(store.create("late", Persona::Lifestyle)));
        }
    }

    #[test]
    fn test_append_turn_unknown_call() {
        let store = SessionStore::new();
        let err = store
            .append_turn("missing", TurnRole::User, "Hallo", 0.9)
            .unwrap_err();
        assert_eq!(err, SessionError::NotFound("missing".to_string()));
    }

    #[test]
    fn test_assistant_confidence_forced_to_one() {
        let store = SessionStore::new();
        let call_id = store.create("u", Persona::Business);
        store
            .append_turn(&call_id, TurnRole::Assistant, "Goedemorgen", 0.2)
            .unwrap();
        store
            .append_turn(&call_id, TurnRole::User, "Hoi", 0.42)
            .unwrap();
        store
            .append_turn(&call_id, TurnRole::User, "Hoi?", 7.0)
            .unwrap();

        let turns = store.turns(&call_id).unwrap();
        assert_eq!(turns[0].confidence, 1.0);
        assert_eq!(turns[1].confidence, 0.42);
        assert_eq!(turns[2].confidence, 1.0);
    }

    #[test]
    fn test_transcript_preserves_append_order() {
        let store = SessionStore::new();
        let call_id = store.create("u", Persona::Lifestyle);
        let lines = [
            (TurnRole::Assistant, "Hallo!"),
            (TurnRole::User, "Ik ben moe"),
            (TurnRole::Assistant, "Hoe veel slaap krijg je?"),
            (TurnRole::User, "Vijf uur"),
        ];
        for (role, text) in lines {
            store.append_turn(&call_id, role, text, 1.0).unwrap();
        }

        assert_eq!(
            store.transcript(&call_id).unwrap(),
            vec![
                "assistant: Hallo!",
                "user: Ik ben moe",
                "assistant: Hoe veel slaap krijg je?",
                "user: Vijf uur",
            ]
        );
    }

    #[test]
    fn test_end_to_end_lifestyle_call() {
        let store = SessionStore::new();
        let call_id = store.create("u1", Persona::Lifestyle);
        store
            .append_turn(&call_id, TurnRole::User, "Ik ben gestrest", 1.0)
            .unwrap();

        let summary = store.end(&call_id).unwrap();
        assert_eq!(summary.turns, 1);
        assert_eq!(summary.status, CallStatus::Completed);
        assert_eq!(summary.user_id, "u1");
        assert!(summary.duration >= 0.0);
        assert!(
            !store
                .list_active()
                .iter()
                .any(|entry| entry.call_id == call_id)
        );
    }

    #[test]
    fn test_operations_after_end_fail() {
        let store = SessionStore::new();
        let call_id = store.create("u", Persona::Business);
        store.end(&call_id).unwrap();

        assert!(matches!(
            store.append_turn(&call_id, TurnRole::User, "nog iets", 1.0),
            Err(SessionError::NotFound(_))
        ));
        assert!(matches!(store.end(&call_id), Err(SessionError::NotFound(_))));
        assert!(store.summary(&call_id).is_none());
        assert!(store.transcript(&call_id).is_none());
    }

    #[test]
    fn test_list_active() {
        let store = SessionStore::new();
        let a = store.create("user_1", Persona::Lifestyle);
        let b = store.create("user_2", Persona::Business);

        let calls = store.list_active();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().any(|c| c.call_id == a && c.user_id == "user_1"));
        assert!(
            calls
                .iter()
                .any(|c| c.call_id == b && c.voice_profile == Persona::Business)
        );
        assert!(calls.iter().all(|c| c.status == CallStatus::Active));

        assert_eq!(store.persona(&b), Some(Persona::Business));
        assert_eq!(store.persona("unknown"), None);
    }

    #[test]
    fn test_stats_average_over_completed_only() {
        let store = SessionStore::new();
        let a = store.create("a", Persona::Lifestyle);
        let b = store.create("b", Persona::Business);
        let _live = store.create("c", Persona::Lifestyle);

        let started_a = store.sessions.get(&a).unwrap().started_at;
        let started_b = store.sessions.get(&b).unwrap().started_at;
        store.end_at(&a, started_a + Duration::seconds(120)).unwrap();
        store.end_at(&b, started_b + Duration::seconds(240)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.active_calls, 1);
        assert_eq!(stats.completed_calls, 2);
        assert!((stats.total_conversation_minutes - 6.0).abs() < 1e-9);
        assert!((stats.average_duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_without_completed_calls() {
        let store = SessionStore::new();
        store.create("a", Persona::Lifestyle);
        let stats = store.stats();
        assert_eq!(stats.completed_calls, 0);
        assert_eq!(stats.average_duration, 0.0);
        assert_eq!(stats.total_conversation_minutes, 0.0);
    }

    #[test]
    fn test_end_before_start_clamps_duration() {
        let store = SessionStore::new();
        let id = store.create("a", Persona::Lifestyle);
        let started = store.sessions.get(&id).unwrap().started_at;
        let summary = store.end_at(&id, started - Duration::seconds(5)).unwrap();
        assert_eq!(summary.duration, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_on_distinct_calls() {
        let store = Arc::new(SessionStore::new());
        let ids: Vec<String> = (0..8)
            .map(|i| store.create(format!("u{i}"), Persona::Lifestyle))
            .collect();

        let mut handles = Vec::new();
        for id in ids.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..100 {
                    store
                        .append_turn(&id, TurnRole::User, format!("bericht {n}"), 1.0)
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for id in ids {
            let transcript = store.transcript(&id).unwrap();
            assert_eq!(transcript.len(), 100);
            assert_eq!(transcript[0], "user: bericht 0");
            assert_eq!(transcript[99], "user: bericht 99");
        }
    }
}

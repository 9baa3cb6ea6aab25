//! The dialogue brain: turns (utterance, intent) into a conversation state
//! and a non-repeating suggestion, with bounded caches so repeated
//! utterances (a filler word transcribed twice, a repeated objection) don't
//! pay the full state-machine + suggestion-selection cost twice.

pub mod cache;
pub mod memory;
pub mod state_machine;
pub mod suggestion;

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::eventbus::{Event, EventBus, ResetEvent, Topic};
use crate::model::{ConversationStateKind as State, SuggestionEvent};

use cache::LruCache;
use memory::RollingMemory;
use state_machine::StateMachine;
use suggestion::{SuggestionEngine, SuggestionRules};

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Canonical fallback suggestion when the suggestion engine has nothing
/// configured for the current state. The brain never propagates an error
/// to its caller — this string is the error path made visible instead.
pub const FALLBACK_SUGGESTION: &str = "Let me think...";

/// Result of one [`DialogueBrain::process`] call.
#[derive(Debug, Clone)]
pub struct BrainResult {
    pub state: State,
    pub suggestion: String,
    pub cache_hit: bool,
    pub brain_ms: f64,
}

struct Inner {
    state_machine: StateMachine,
    memory: RollingMemory,
    suggestion_engine: SuggestionEngine,
    intent_cache: LruCache<String, State>,
    suggestion_cache: LruCache<State, String>,
}

/// Owns the state machine, rolling memory, suggestion engine and both LRU
/// caches behind a single lock — simpler than fine-grained locking, and
/// correct because every `process` call needs all of them in sequence
/// anyway (the spec explicitly forbids the caches reaching into each other
/// directly; this lock is the brain's own, not shared with other stages).
pub struct DialogueBrain {
    inner: Mutex<Inner>,
    bus: Option<Arc<EventBus>>,
}

impl DialogueBrain {
    pub fn new(
        confirmations_required: u32,
        inactivity_reset: Duration,
        memory_capacity: usize,
        suggestion_ring_capacity: usize,
        cache_capacity: usize,
        rules: SuggestionRules,
        bus: Option<Arc<EventBus>>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state_machine: StateMachine::new(confirmations_required, inactivity_reset),
                memory: RollingMemory::new(memory_capacity, inactivity_reset),
                suggestion_engine: SuggestionEngine::new(rules, suggestion_ring_capacity),
                intent_cache: LruCache::new(cache_capacity),
                suggestion_cache: LruCache::new(cache_capacity),
            }),
            bus,
        }
    }

    /// Process one (text, intent) observation, returning the current
    /// conversation state and the suggestion to surface.
    pub fn process(&self, text: &str, intent: &str, now: Instant) -> BrainResult {
        let start = Instant::now();
        let mut inner = self.inner.lock();
        let mut reset_occurred = false;

        let key = format!("{intent}::{text}");
        let cache_hit = inner.intent_cache.get(&key).is_some();
        let state = if let Some(state) = inner.intent_cache.get(&key) {
            state
        } else {
            let result = inner.state_machine.transition(intent, text, now);
            reset_occurred |= result.reset;
            inner.intent_cache.put(key, result.state);
            result.state
        };

        let cached_suggestion = inner.suggestion_cache.get(&state);
        let suggestion = match cached_suggestion {
            Some(s) if !inner.memory.recalls_suggestion(&s, now) => s,
            _ => {
                let fresh = inner
                    .suggestion_engine
                    .suggest(state, &mut inner.memory, now)
                    .unwrap_or_else(|| FALLBACK_SUGGESTION.to_string());
                inner.suggestion_cache.put(state, fresh.clone());
                fresh
            }
        };

        reset_occurred |= inner.memory.record(intent, &suggestion, now);
        drop(inner);

        let brain_ms = start.elapsed().as_secs_f64() * 1000.0;

        if let Some(bus) = &self.bus {
            if reset_occurred {
                bus.publish(
                    Topic::Reset,
                    Event::Reset(ResetEvent {
                        at: unix_now(),
                        reason: "inactivity",
                    }),
                );
            }
        }

        if let Some(bus) = &self.bus {
            bus.publish(
                Topic::Suggestion,
                Event::Suggestion(SuggestionEvent {
                    event_id: Uuid::new_v4(),
                    state,
                    suggestion: suggestion.clone(),
                    cache_hit,
                    brain_ms,
                }),
            );
        }

        BrainResult {
            state,
            suggestion,
            cache_hit,
            brain_ms,
        }
    }

    pub fn current_state(&self) -> State {
        self.inner.lock().state_machine.state()
    }
}

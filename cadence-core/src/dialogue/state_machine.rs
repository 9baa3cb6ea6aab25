//! Sticky conversation-stage state machine.
//!
//! A candidate target state must be proposed by [`StateMachine::transition`]
//! for `confirmations_required` consecutive calls before the machine
//! actually moves — a single off-topic utterance must not derail the
//! tracked stage. `close` is a deliberate exception: once it is the
//! confirmed candidate it is allowed regardless of the normal
//! allowed-transition graph (a sales call can legitimately jump straight to
//! closing from any stage), though it still has to accumulate the same
//! number of confirmations as everything else.

use std::time::{Duration, Instant};

use crate::model::ConversationStateKind as State;

fn allowed_transitions(from: State) -> &'static [State] {
    match from {
        State::Opening => &[State::Opening, State::Discovery, State::Objection],
        State::Discovery => &[State::Discovery, State::Pain, State::Objection],
        State::Pain => &[State::Pain, State::Objection],
        State::Objection => &[State::Objection, State::Close],
        State::Close => &[State::Close],
    }
}

/// Maps a normalized intent keyword to its target conversation state. Order
/// matters: the first matching keyword wins.
const INTENT_KEYWORDS: &[(&str, State)] = &[
    ("rapport", State::Opening),
    ("probe", State::Discovery),
    ("question", State::Discovery),
    ("painsignal", State::Pain),
    ("pain", State::Pain),
    ("stallobjection", State::Objection),
    ("objection", State::Objection),
    ("price", State::Objection),
    ("timeline", State::Objection),
    ("decision", State::Discovery),
    ("closingbuyindicator", State::Close),
    ("ready", State::Close),
];

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn intent_to_state(intent: &str, utterance: &str) -> Option<State> {
    let haystack = normalize(&format!("{intent} {utterance}"));
    INTENT_KEYWORDS
        .iter()
        .find(|(kw, _)| haystack.contains(kw))
        .map(|(_, state)| *state)
}

pub struct StateMachine {
    state: State,
    pending: Option<State>,
    pending_count: u32,
    confirmations_required: u32,
    last_update: Instant,
    inactivity_reset: Duration,
}

/// Outcome of one `transition` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionResult {
    pub state: State,
    /// Whether this call actually moved the confirmed state.
    pub moved: bool,
    /// Whether this call found the machine idle past its reset window and
    /// cleared back to `opening` first.
    pub reset: bool,
}

impl StateMachine {
    pub fn new(confirmations_required: u32, inactivity_reset: Duration) -> Self {
        Self {
            state: State::Opening,
            pending: None,
            pending_count: 0,
            confirmations_required,
            last_update: Instant::now(),
            inactivity_reset,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn reset_if_inactive(&mut self, now: Instant) -> bool {
        let idle = now.saturating_duration_since(self.last_update);
        if idle > self.inactivity_reset {
            self.state = State::Opening;
            self.pending = None;
            self.pending_count = 0;
            true
        } else {
            false
        }
    }

    /// Feed one (intent, utterance) observation. An unrecognised intent is
    /// treated as a proposal for the current state — it clears the pending
    /// counter exactly like any other non-matching candidate, so a single
    /// off-topic or unparseable utterance between two consistent proposals
    /// still resets the confirmation streak.
    pub fn transition(&mut self, intent: &str, utterance: &str, now: Instant) -> TransitionResult {
        let reset = self.reset_if_inactive(now);
        self.last_update = now;

        let candidate = intent_to_state(intent, utterance).unwrap_or(self.state);

        if candidate == self.state {
            self.pending = None;
            self.pending_count = 0;
            return TransitionResult {
                state: self.state,
                moved: false,
                reset,
            };
        }

        let permitted = candidate == State::Close || allowed_transitions(self.state).contains(&candidate);
        if !permitted {
            self.pending = None;
            self.pending_count = 0;
            return TransitionResult {
                state: self.state,
                moved: false,
                reset,
            };
        }

        if self.pending == Some(candidate) {
            self.pending_count += 1;
        } else {
            self.pending = Some(candidate);
            self.pending_count = 1;
        }

        if self.pending_count >= self.confirmations_required {
            self.state = candidate;
            self.pending = None;
            self.pending_count = 0;
            return TransitionResult {
                state: self.state,
                moved: true,
                reset,
            };
        }

        TransitionResult {
            state: self.state,
            moved: false,
            reset,
        }
    }
}

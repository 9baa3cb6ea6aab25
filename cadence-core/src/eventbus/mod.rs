//! A small pub/sub bus connecting pipeline stages: bounded, drop-oldest
//! per-topic queues, with subscriber dispatch isolated onto a worker pool so
//! a slow or panicking subscriber never blocks the publisher or another
//! subscriber.
//!
//! Topics are a closed, compile-time-known set (the five pipeline stage
//! boundaries) rather than free-form strings — a Rust-native tightening of
//! the dynamically-keyed bus this was grown from, not a behavior change.

mod event;
mod pool;

pub use event::{Event, MicDeadEvent, ResetEvent};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use pool::DispatchPool;

/// The fixed set of event-bus topics, one per stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    SilenceTrigger,
    WorkerResult,
    Suggestion,
    Reset,
    MicDead,
    Telemetry,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::SilenceTrigger,
        Topic::WorkerResult,
        Topic::Suggestion,
        Topic::Reset,
        Topic::MicDead,
        Topic::Telemetry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::SilenceTrigger => "silence_trigger",
            Topic::WorkerResult => "worker_result",
            Topic::Suggestion => "suggestion",
            Topic::Reset => "reset",
            Topic::MicDead => "mic_dead",
            Topic::Telemetry => "telemetry",
        }
    }
}

pub type Handler = Arc<dyn Fn(Event) + Send + Sync>;

/// Opaque handle returned by [`EventBus::subscribe`], used to
/// [`EventBus::unsubscribe`] later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct TopicState {
    capacity: usize,
    queue: Mutex<VecDeque<Event>>,
    subscribers: Mutex<Vec<(SubscriptionId, usize, Handler)>>,
}

impl TopicState {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Push onto the queue, dropping the oldest entry if already at capacity.
    /// Returns `true` if an entry was dropped to make room.
    fn push(&self, event: Event) -> bool {
        let mut queue = self.queue.lock();
        let dropped = if queue.len() >= self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(event);
        dropped
    }
}

/// The bounded, drop-oldest, worker-pool-dispatched event bus connecting
/// Sentinel, Worker, DialogueBrain and sink subscribers (HUD, telemetry).
pub struct EventBus {
    topics: HashMap<Topic, TopicState>,
    pool: DispatchPool,
    next_subscription: std::sync::atomic::AtomicU64,
}

impl EventBus {
    /// `queue_capacity`: max buffered (not-yet-delivered) events retained
    /// per topic before the oldest is dropped. `dispatch_threads`: size of
    /// the subscriber-dispatch worker pool.
    pub fn new(queue_capacity: usize, dispatch_threads: usize) -> Arc<Self> {
        let mut topics = HashMap::new();
        for topic in Topic::ALL {
            topics.insert(topic, TopicState::new(queue_capacity));
        }
        Arc::new(Self {
            topics,
            pool: DispatchPool::new(dispatch_threads),
            next_subscription: std::sync::atomic::AtomicU64::new(1),
        })
    }

    /// Convenience constructor matching the spec defaults (queue depth 64,
    /// an 8-thread dispatch pool mirroring this bus's Python predecessor).
    pub fn with_defaults() -> Arc<Self> {
        Self::new(64, 8)
    }

    /// Publish `event` on `topic`. The event is queued (drop-oldest on
    /// overflow) and handed to every current subscriber on the dispatch
    /// pool, preserving publish order per-subscriber-per-topic. Returns
    /// whether an older queued event was dropped to make room.
    pub fn publish(&self, topic: Topic, event: Event) -> bool {
        let Some(state) = self.topics.get(&topic) else {
            return false;
        };
        let dropped = state.push(event.clone());
        let subscribers = state.subscribers.lock().clone();
        for (_, lane, handler) in subscribers {
            let event = event.clone();
            self.pool.dispatch_to(lane, move || handler(event));
        }
        dropped
    }

    /// Register `handler` to be invoked (on the dispatch pool) for every
    /// future publish on `topic`. Past events are not replayed. The
    /// subscriber is pinned to one dispatch lane for its lifetime, which is
    /// what guarantees events reach it in publish order even though lanes
    /// are shared across subscribers.
    pub fn subscribe(&self, topic: Topic, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(
            self.next_subscription
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed),
        );
        let lane = (id.0 as usize) % self.pool.lane_count();
        if let Some(state) = self.topics.get(&topic) {
            state.subscribers.lock().push((id, lane, handler));
        }
        id
    }

    /// Remove a previously registered subscriber. No-op if already removed.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) {
        if let Some(state) = self.topics.get(&topic) {
            state.subscribers.lock().retain(|(sid, _, _)| *sid != id);
        }
    }

    /// Snapshot of currently queued (not necessarily yet dispatched) events
    /// for a topic — intended for tests and diagnostics.
    pub fn queue_snapshot(&self, topic: Topic) -> Vec<Event> {
        self.topics
            .get(&topic)
            .map(|s| s.queue.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Block until all dispatches submitted so far have run. Intended for
    /// tests; the live pipeline never needs to wait on the bus.
    pub fn drain(&self) {
        self.pool.drain();
    }

    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationStateKind, SuggestionEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn suggestion_event() -> Event {
        Event::Suggestion(SuggestionEvent {
            event_id: Uuid::new_v4(),
            state: ConversationStateKind::Opening,
            suggestion: "hello".into(),
            cache_hit: false,
            brain_ms: 1.0,
        })
    }

    #[test]
    fn subscriber_receives_published_event() {
        let bus = EventBus::new(8, 2);
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        bus.subscribe(
            Topic::Suggestion,
            Arc::new(move |_| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );
        bus.publish(Topic::Suggestion, suggestion_event());
        bus.drain();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new(8, 2);
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let id = bus.subscribe(
            Topic::Suggestion,
            Arc::new(move |_| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );
        bus.unsubscribe(Topic::Suggestion, id);
        bus.publish(Topic::Suggestion, suggestion_event());
        bus.drain();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn queue_drops_oldest_when_full() {
        let bus = EventBus::new(2, 1);
        for _ in 0..3 {
            bus.publish(Topic::Suggestion, suggestion_event());
        }
        let snapshot = bus.queue_snapshot(Topic::Suggestion);
        assert_eq!(snapshot.len(), 2, "queue capacity must cap at 2");
    }

    #[test]
    fn a_panicking_subscriber_does_not_block_others() {
        let bus = EventBus::new(8, 4);
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        bus.subscribe(Topic::Suggestion, Arc::new(|_| panic!("boom")));
        bus.subscribe(
            Topic::Suggestion,
            Arc::new(move |_| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );
        bus.publish(Topic::Suggestion, suggestion_event());
        bus.drain();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delivery_preserves_publish_order_per_subscriber() {
        let bus = EventBus::new(16, 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        bus.subscribe(
            Topic::Suggestion,
            Arc::new(move |e| {
                if let Event::Suggestion(s) = e {
                    seen2.lock().push(s.suggestion);
                }
            }),
        );
        for i in 0..5 {
            bus.publish(
                Topic::Suggestion,
                Event::Suggestion(SuggestionEvent {
                    event_id: Uuid::new_v4(),
                    state: ConversationStateKind::Opening,
                    suggestion: i.to_string(),
                    cache_hit: false,
                    brain_ms: 0.0,
                }),
            );
        }
        bus.drain();
        let got = seen.lock().clone();
        assert_eq!(got, vec!["0", "1", "2", "3", "4"]);
    }
}

//! Suppresses a worker result that repeats the immediately-recent ones too
//! closely to be worth surfacing again.
//!
//! The `0.1` score-delta tolerance is a pinned constant (tests assert
//! against it directly), not a tunable — treat it as part of this filter's
//! contract, same as its window size.

use std::collections::VecDeque;

struct Recent {
    prompt_id: String,
    score: f32,
}

pub struct AntiRepeatCache {
    window: usize,
    score_delta: f32,
    recent: VecDeque<Recent>,
}

impl AntiRepeatCache {
    pub fn new(window: usize, score_delta: f32) -> Self {
        Self {
            window,
            score_delta,
            recent: VecDeque::with_capacity(window),
        }
    }

    /// `true` if `prompt_id`/`score` should be suppressed as a repeat of
    /// something already surfaced in the last `window` results. Does not
    /// record `prompt_id`/`score` itself — call [`Self::record`] once the
    /// decision to surface or suppress has been made.
    pub fn is_repeat(&self, prompt_id: &str, score: f32) -> bool {
        self.recent
            .iter()
            .any(|r| r.prompt_id == prompt_id && (r.score - score).abs() < self.score_delta)
    }

    pub fn record(&mut self, prompt_id: &str, score: f32) {
        if self.recent.len() >= self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(Recent {
            prompt_id: prompt_id.to_string(),
            score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_prompt_and_close_score_is_a_repeat() {
        let mut cache = AntiRepeatCache::new(5, 0.1);
        cache.record("7", 0.80);
        assert!(cache.is_repeat("7", 0.85));
    }

    #[test]
    fn same_prompt_but_far_score_is_not_a_repeat() {
        let mut cache = AntiRepeatCache::new(5, 0.1);
        cache.record("7", 0.80);
        assert!(!cache.is_repeat("7", 0.50));
    }

    #[test]
    fn different_prompt_is_never_a_repeat() {
        let mut cache = AntiRepeatCache::new(5, 0.1);
        cache.record("7", 0.80);
        assert!(!cache.is_repeat("3", 0.80));
    }

    #[test]
    fn window_forgets_entries_older_than_capacity() {
        let mut cache = AntiRepeatCache::new(2, 0.1);
        cache.record("7", 0.80);
        cache.record("3", 0.50);
        cache.record("9", 0.20);
        assert!(!cache.is_repeat("7", 0.80), "7 should have rolled off the window");
    }
}

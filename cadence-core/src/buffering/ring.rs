//! The bounded, sequence-counted rolling window of recent audio frames
//! that backs every Sentinel trigger snapshot.
//!
//! Distinct from the raw-sample SPSC queue in [`super`]: this buffer holds
//! whole [`AudioFrame`]s, evicts oldest-first once full, and exposes a
//! monotonic `sequence` counter so a Sentinel loop can block waiting for
//! "the next frame after the one I last saw" without polling.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::model::AudioFrame;

struct Inner {
    frames: VecDeque<AudioFrame>,
    capacity: usize,
    sequence: u64,
}

/// Thread-safe bounded window over the most recent `capacity` audio frames.
///
/// One producer (the Sentinel's frame-ingest loop) pushes; any number of
/// readers may call `read_latest` or block in `wait_for_new_data`. All
/// operations take the lock only for the duration of a short, allocation-
/// bounded critical section.
pub struct AudioRingBuffer {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl AudioRingBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity),
                capacity,
                sequence: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Push a frame, evicting the oldest one first if the buffer is full.
    /// Increments `sequence` and wakes any waiters.
    pub fn push(&self, frame: AudioFrame) {
        let mut inner = self.inner.lock();
        if inner.frames.len() == inner.capacity {
            inner.frames.pop_front();
        }
        inner.frames.push_back(frame);
        inner.sequence = inner.sequence.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Current monotonic push counter. Never decreases; wraps only after
    /// 2^64 pushes.
    pub fn sequence(&self) -> u64 {
        self.inner.lock().sequence
    }

    /// Number of frames currently held (≤ capacity).
    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate the most recent `max_frames` frames' samples (or all of
    /// them if `max_frames` is `None` or exceeds the current count) into one
    /// contiguous buffer. Returns `None` if the buffer is empty. The
    /// returned vector is an independent snapshot — later pushes cannot
    /// mutate it.
    pub fn read_latest(&self, max_frames: Option<usize>) -> Option<Vec<f32>> {
        let inner = self.inner.lock();
        if inner.frames.is_empty() {
            return None;
        }
        let take = max_frames.unwrap_or(inner.frames.len()).min(inner.frames.len());
        let skip = inner.frames.len() - take;
        let mut out = Vec::new();
        for frame in inner.frames.iter().skip(skip) {
            out.extend_from_slice(&frame.samples);
        }
        Some(out)
    }

    /// Block until `sequence()` differs from `last_seq`, or `timeout`
    /// elapses. Returns the sequence observed when it returned (which may
    /// still equal `last_seq` on timeout).
    pub fn wait_for_new_data(&self, last_seq: u64, timeout: Duration) -> u64 {
        let mut inner = self.inner.lock();
        if inner.sequence != last_seq {
            return inner.sequence;
        }
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let now = std::time::Instant::now();
            if now >= deadline {
                return inner.sequence;
            }
            let wait_result = self.cond.wait_for(&mut inner, deadline - now);
            if inner.sequence != last_seq {
                return inner.sequence;
            }
            if wait_result.timed_out() {
                return inner.sequence;
            }
        }
    }
}

//! Fixed-size lane pool used to dispatch subscriber callbacks off the
//! publisher's thread.
//!
//! Each lane is a single dedicated thread draining its own unbounded queue
//! of boxed closures, run inside `catch_unwind` so one panicking subscriber
//! never poisons the lane or blocks siblings. Subscribers are pinned to a
//! lane for their lifetime (see `EventBus::subscribe`), which is what gives
//! per-subscriber FIFO delivery even though lanes are shared across
//! subscribers and topics.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

type Task = Box<dyn FnOnce() + Send>;

struct Lane {
    tx: Sender<Task>,
    handle: Option<std::thread::JoinHandle<()>>,
}

pub struct DispatchPool {
    lanes: Vec<Lane>,
}

impl DispatchPool {
    pub fn new(lane_count: usize) -> Self {
        let lane_count = lane_count.max(1);
        let lanes = (0..lane_count)
            .map(|idx| {
                let (tx, rx): (Sender<Task>, Receiver<Task>) = unbounded();
                let handle = std::thread::Builder::new()
                    .name(format!("eventbus-dispatch-{idx}"))
                    .spawn(move || {
                        for task in rx {
                            let _ = panic::catch_unwind(AssertUnwindSafe(task));
                        }
                    })
                    .expect("failed to spawn dispatch thread");
                Lane {
                    tx,
                    handle: Some(handle),
                }
            })
            .collect();
        Self { lanes }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Submit `task` to run on lane `lane % lane_count`.
    pub fn dispatch_to(&self, lane: usize, task: impl FnOnce() + Send + 'static) {
        let idx = lane % self.lanes.len();
        let _ = self.lanes[idx].tx.send(Box::new(task));
    }

    /// Submit to an arbitrary lane (used when no subscriber affinity applies).
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        self.dispatch_to(0, task);
    }

    /// Block until every lane's queue has drained. Test-only convenience —
    /// relies on lanes being otherwise idle.
    pub fn drain(&self) {
        let barriers: Vec<Arc<std::sync::Barrier>> = self
            .lanes
            .iter()
            .map(|_| Arc::new(std::sync::Barrier::new(2)))
            .collect();
        for (lane, barrier) in self.lanes.iter().zip(barriers.iter()) {
            let barrier = barrier.clone();
            let _ = lane.tx.send(Box::new(move || {
                barrier.wait();
            }));
        }
        for barrier in barriers {
            barrier.wait();
        }
    }

    pub fn shutdown(&self) {
        // Dropping senders lets each lane's `for task in rx` loop end.
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        let lanes = std::mem::take(&mut self.lanes);
        let handles: Vec<_> = lanes
            .into_iter()
            .filter_map(|mut lane| lane.handle.take())
            .collect();
        // `lanes`'s Senders are dropped above, closing each channel so the
        // lane threads' receive loops end and can be joined here.
        for handle in handles {
            let _ = handle.join();
        }
    }
}

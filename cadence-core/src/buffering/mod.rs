//! Audio buffering: a lock-free SPSC staging queue for the real-time
//! capture callback, and the frame-level rolling window the Sentinel reads
//! its trigger snapshots from.

pub mod chunk;
pub mod ring;

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Producer};
pub use ring::AudioRingBuffer;

/// Type alias for the producer half — held by the audio callback thread.
pub type AudioProducer = ringbuf::HeapProd<f32>;

/// Type alias for the consumer half — held by the pipeline thread.
pub type AudioConsumer = ringbuf::HeapCons<f32>;

/// Buffer capacity: 2^22 = 4 194 304 f32 samples ≈ 87.4 s at 48 kHz.
/// This protects the Sentinel loop from callback drops while it is busy
/// running VAD inference on the previous frame.
pub const RING_CAPACITY: usize = 1 << 22;

/// Create a matched producer/consumer pair backed by a heap-allocated ring
/// buffer. The audio callback pushes raw samples here; the Sentinel thread
/// drains them, slices them into fixed-size [`crate::model::AudioFrame`]s,
/// and pushes those onto the windowed [`AudioRingBuffer`].
///
/// # Panics
/// Never panics — `HeapRb` construction cannot fail for reasonable capacities.
pub fn create_audio_ring() -> (AudioProducer, AudioConsumer) {
    HeapRb::<f32>::new(RING_CAPACITY).split()
}

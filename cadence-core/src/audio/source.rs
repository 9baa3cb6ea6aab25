//! The `AudioSource` contract (external collaborator per the spec) plus a
//! deterministic synthetic implementation for tests and the dry-run
//! harness, and a `cpal`-backed adapter over [`super::AudioCapture`] for
//! real microphone input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::buffering::{create_audio_ring, Consumer};
use crate::error::Result;
use crate::model::AudioFrame;

/// Produces a continuous stream of fixed-size mono frames at a fixed
/// sample rate until `stop` is called.
pub trait AudioSource: Send {
    /// Begin producing frames, invoking `callback` once per frame of
    /// `frame_size` samples at `sample_rate` Hz. Returns once capture has
    /// started (the callback runs on a background thread).
    fn start(
        &mut self,
        frame_size: usize,
        sample_rate: u32,
        callback: Box<dyn FnMut(AudioFrame) + Send>,
    ) -> Result<()>;

    fn stop(&mut self);
}

/// Bridges the real-time-safe cpal capture callback (which can only push
/// raw samples into a lock-free ring) to the frame-oriented `AudioSource`
/// contract: a background thread drains the ring in fixed-size chunks and
/// invokes the frame callback.
#[cfg(feature = "audio-cpal")]
pub struct CpalAudioSource {
    running: Arc<AtomicBool>,
    preferred_device: Option<String>,
    drain_thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "audio-cpal")]
impl CpalAudioSource {
    pub fn new(preferred_device: Option<String>) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            preferred_device,
            drain_thread: None,
        }
    }
}

#[cfg(feature = "audio-cpal")]
impl AudioSource for CpalAudioSource {
    fn start(
        &mut self,
        frame_size: usize,
        sample_rate: u32,
        mut callback: Box<dyn FnMut(AudioFrame) + Send>,
    ) -> Result<()> {
        let (producer, mut consumer) = create_audio_ring();
        self.running.store(true, Ordering::Release);
        let running = self.running.clone();
        let preferred = self.preferred_device.clone();

        // `cpal::Stream` is `!Send`, so it must be created and dropped on
        // the same thread; we dedicate a thread to own it for the capture
        // session's lifetime rather than moving it across `spawn_blocking`
        // boundaries.
        let capture_running = running.clone();
        std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                match super::AudioCapture::open_with_preference(producer, capture_running.clone(), preferred.as_deref()) {
                    Ok(capture) => {
                        while capture_running.load(Ordering::Acquire) {
                            std::thread::sleep(std::time::Duration::from_millis(50));
                        }
                        capture.stop();
                    }
                    Err(e) => {
                        tracing::error!("audio capture failed to start: {e}");
                        capture_running.store(false, Ordering::Release);
                    }
                }
            })
            .map_err(|e| crate::error::PipelineError::AudioStream(e.to_string()))?;

        let drain_running = running.clone();
        let handle = std::thread::Builder::new()
            .name("audio-drain".into())
            .spawn(move || {
                let mut accum = Vec::with_capacity(frame_size * 2);
                let mut scratch = vec![0f32; frame_size];
                while drain_running.load(Ordering::Acquire) {
                    let n = consumer.pop_slice(&mut scratch);
                    if n == 0 {
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        continue;
                    }
                    accum.extend_from_slice(&scratch[..n]);
                    while accum.len() >= frame_size {
                        let frame_samples: Vec<f32> = accum.drain(..frame_size).collect();
                        callback(AudioFrame::new(frame_samples, sample_rate));
                    }
                }
            })
            .map_err(|e| crate::error::PipelineError::AudioStream(e.to_string()))?;

        self.drain_thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.drain_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Deterministic, allocation-cheap audio source used by tests and the
/// dry-run harness: replays a fixed sequence of frames, then idles.
pub struct SyntheticAudioSource {
    frames: Vec<Vec<f32>>,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SyntheticAudioSource {
    pub fn new(frames: Vec<Vec<f32>>) -> Self {
        Self {
            frames,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl AudioSource for SyntheticAudioSource {
    fn start(
        &mut self,
        _frame_size: usize,
        sample_rate: u32,
        mut callback: Box<dyn FnMut(AudioFrame) + Send>,
    ) -> Result<()> {
        self.running.store(true, Ordering::Release);
        let running = self.running.clone();
        let frames = self.frames.clone();
        let handle = std::thread::spawn(move || {
            for samples in frames {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                callback(AudioFrame::new(samples, sample_rate));
            }
        });
        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

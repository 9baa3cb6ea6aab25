//! Rolling audio+VAD dump for post-incident replay.
//!
//! Keeps the last `duration_sec` of (sample, vad_probability) pairs and, on
//! request, writes them to disk keyed by the triggering event's id. This is
//! a diagnostic aid, not a hot-path component — nothing in the Sentinel or
//! Worker loops blocks on it, and a dump failure is logged, never
//! propagated as a pipeline error.
//!
//! The on-disk format is a small fixed binary record rather than `.npy`:
//! magic `b"CRPD"`, a `u32` format version, the event id as 16 raw bytes,
//! then `u64` sample counts and the two `f32` arrays (audio, then vad) in
//! native little-endian layout. A `.npz`-equivalent parser is outside this
//! crate's dependency budget (see `DESIGN.md`).

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

const MAGIC: &[u8; 4] = b"CRPD";
const FORMAT_VERSION: u32 = 1;

/// Bounded ring of the most recent `sample_rate * duration_sec` (sample,
/// vad_probability) pairs.
pub struct ReplayDump {
    capacity: usize,
    audio: VecDeque<f32>,
    vad: VecDeque<f32>,
}

impl ReplayDump {
    pub fn new(sample_rate: u32, duration_sec: u32) -> Self {
        let capacity = (sample_rate as usize) * (duration_sec as usize);
        Self {
            capacity,
            audio: VecDeque::with_capacity(capacity),
            vad: VecDeque::with_capacity(capacity),
        }
    }

    /// Append one chunk of samples, all stamped with the same `vad_prob`
    /// (the score the Sentinel computed for the chunk they came from).
    /// Oldest samples are evicted once the rolling window is full.
    pub fn add(&mut self, chunk: &[f32], vad_prob: f32) {
        for &sample in chunk {
            if self.audio.len() >= self.capacity {
                self.audio.pop_front();
                self.vad.pop_front();
            }
            self.audio.push_back(sample);
            self.vad.push_back(vad_prob);
        }
    }

    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }

    /// Write the current window to `path`, returning the path written.
    pub fn dump_to_disk(&self, path: impl AsRef<Path>, event_id: Uuid) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(event_id.as_bytes())?;
        writer.write_all(&(self.audio.len() as u64).to_le_bytes())?;
        writer.write_all(&(self.vad.len() as u64).to_le_bytes())?;
        for sample in &self.audio {
            writer.write_all(&sample.to_le_bytes())?;
        }
        for prob in &self.vad {
            writer.write_all(&prob.to_le_bytes())?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), %event_id, "replay dump written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn window_caps_at_sample_rate_times_duration() {
        let mut dump = ReplayDump::new(4, 1);
        dump.add(&[0.1, -0.1, 0.2, -0.2, 0.3], 0.5);
        assert_eq!(dump.len(), 4, "oldest sample must roll off once the window is full");
    }

    #[test]
    fn dump_round_trips_header_and_samples() {
        let mut dump = ReplayDump::new(4, 1);
        dump.add(&[0.1, -0.1, 0.2, -0.2], 0.5);
        let dir = std::env::temp_dir().join(format!("cadence-replay-test-{}", Uuid::new_v4()));
        let path = dir.join("replay.bin");
        let event_id = Uuid::new_v4();
        dump.dump_to_disk(&path, event_id).unwrap();

        let mut bytes = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(&bytes[0..4], MAGIC);
        let audio_len = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
        assert_eq!(audio_len, 4);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_dump_still_writes_a_valid_header() {
        let dump = ReplayDump::new(16_000, 20);
        let dir = std::env::temp_dir().join(format!("cadence-replay-test-{}", Uuid::new_v4()));
        let path = dir.join("empty.bin");
        dump.dump_to_disk(&path, Uuid::new_v4()).unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Mock audio capture for integration tests
//!
//! A rolling buffer the test feeds by hand; the assistant's ticker reads
//! and clears it exactly as it would a real microphone ring buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use voxkit::audio::AudioCapture;
use voxkit::VoxResult;

pub struct MockCapture {
    buffer: Mutex<Vec<f32>>,
    running: AtomicBool,
    sample_rate: u32,
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new(16_000)
    }
}

impl MockCapture {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            sample_rate,
        }
    }

    /// Append samples as if the microphone had captured them
    pub fn feed(&self, samples: &[f32]) {
        self.buffer.lock().unwrap().extend_from_slice(samples);
    }
}

impl AudioCapture for MockCapture {
    fn start(&self) -> VoxResult<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> VoxResult<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn get_audio(&self, duration_ms: Option<u32>) -> Vec<f32> {
        let buffer = self.buffer.lock().unwrap();
        let wanted = match duration_ms {
            Some(ms) => (self.sample_rate as usize * ms as usize / 1000).min(buffer.len()),
            None => buffer.len(),
        };
        buffer[buffer.len() - wanted..].to_vec()
    }

    fn clear_buffer(&self) {
        self.buffer.lock().unwrap().clear();
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn buffer_duration_ms(&self) -> u32 {
        30_000
    }

    fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.clear_buffer();
    }
}

//! Audio capture interface
//!
//! The pipeline reads microphone audio through this trait. Backends keep a
//! rolling ring buffer of recent samples; the ticker reads overlapping
//! windows from it and clears it once an utterance has been queued.

#[cfg(feature = "cpal-capture")]
pub mod cpal;

use crate::error::VoxResult;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cpal-capture")]
pub use self::cpal::CpalCapture;

/// Configuration for audio capture backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioCaptureConfig {
    /// Requested capture sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Length of the rolling buffer (milliseconds)
    pub buffer_duration_ms: u32,

    /// Preferred input device name; None selects the system default
    pub device_name: Option<String>,
}

impl Default for AudioCaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            buffer_duration_ms: 30_000,
            device_name: None,
        }
    }
}

/// Trait for audio capture backends
///
/// Contract: capture runs into an internal ring buffer; `get_audio(d)`
/// returns at most `d` milliseconds of the most recent audio as mono f32
/// samples in `[-1, 1]` without consuming them; `clear_buffer` discards
/// everything buffered so far. Configuration happens at construction.
///
/// Implementations must tolerate `get_audio`/`clear_buffer` calls from the
/// ticker thread concurrent with their internal capture task.
pub trait AudioCapture: Send + Sync {
    /// Begin capturing into the ring buffer
    fn start(&self) -> VoxResult<()>;

    /// Pause capturing; the buffer is retained
    fn stop(&self) -> VoxResult<()>;

    /// Whether capture is currently running
    fn is_running(&self) -> bool;

    /// Up to `duration_ms` of the most recent audio; `None` returns the
    /// whole buffer
    fn get_audio(&self, duration_ms: Option<u32>) -> Vec<f32>;

    /// Discard all buffered samples
    fn clear_buffer(&self);

    /// Actual sample rate of the captured audio (Hz)
    fn sample_rate(&self) -> u32;

    /// Configured rolling buffer length (milliseconds)
    fn buffer_duration_ms(&self) -> u32;

    /// Release the device and all resources
    fn shutdown(&self);
}

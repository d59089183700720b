//! Voice activity detection
//!
//! Energy-ratio end-of-speech detector: an utterance has ended when the
//! trailing window is quiet relative to the whole buffer. An optional
//! first-order high-pass filter suppresses low-frequency rumble before the
//! energy comparison. The detector keeps no state between calls.

use serde::{Deserialize, Serialize};

/// Configuration for [`EnergyVad`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Trailing window compared against the whole buffer (milliseconds)
    pub window_ms: u32,

    /// Ratio threshold: speech has ended when the trailing window's energy
    /// drops to this fraction of the whole-buffer energy (0.0-1.0)
    pub energy_threshold: f32,

    /// High-pass cutoff in Hz; 0 disables the filter
    pub freq_threshold_hz: f32,

    /// Sample rate of the analyzed audio (Hz)
    pub sample_rate_hz: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            energy_threshold: 0.6,
            freq_threshold_hz: 100.0,
            sample_rate_hz: 16_000,
        }
    }
}

/// Result of one detection pass, with energies for diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct VadReport {
    /// True when the utterance appears to have ended
    pub speech_ended: bool,
    /// Mean absolute amplitude over the whole buffer
    pub energy_all: f32,
    /// Mean absolute amplitude over the trailing window
    pub energy_last: f32,
}

/// Stateless energy-ratio voice activity detector
#[derive(Debug, Clone)]
pub struct EnergyVad {
    config: VadConfig,
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new(VadConfig::default())
    }
}

impl EnergyVad {
    pub fn new(config: VadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VadConfig) {
        self.config = config;
    }

    /// Analyze `samples` (mono f32 at the configured rate) and report
    /// whether speech has ended.
    ///
    /// A buffer no longer than the trailing window never reports an end of
    /// speech; there is nothing before the window to compare against.
    pub fn detect(&self, samples: &[f32]) -> VadReport {
        let mut report = VadReport::default();

        let n_samples = samples.len();
        let n_last = (self.config.sample_rate_hz as usize * self.config.window_ms as usize) / 1000;

        if n_last >= n_samples {
            return report;
        }

        // Filter on a copy; the caller's buffer is never mutated.
        let filtered: Vec<f32> = if self.config.freq_threshold_hz > 0.0 {
            high_pass(
                samples,
                self.config.freq_threshold_hz,
                self.config.sample_rate_hz as f32,
            )
        } else {
            samples.to_vec()
        };

        let mut energy_all = 0.0f32;
        let mut energy_last = 0.0f32;
        for (i, sample) in filtered.iter().enumerate() {
            let abs = sample.abs();
            energy_all += abs;
            if i >= n_samples - n_last {
                energy_last += abs;
            }
        }
        energy_all /= n_samples as f32;
        energy_last /= n_last as f32;

        report.energy_all = energy_all;
        report.energy_last = energy_last;
        report.speech_ended = energy_last <= self.config.energy_threshold * energy_all;
        report
    }
}

/// First-order high-pass IIR: alpha = dt / (RC + dt), RC = 1 / (2*pi*cutoff)
fn high_pass(samples: &[f32], cutoff_hz: f32, sample_rate_hz: f32) -> Vec<f32> {
    let mut out = samples.to_vec();
    if out.is_empty() {
        return out;
    }

    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let dt = 1.0 / sample_rate_hz;
    let alpha = dt / (rc + dt);

    let mut y = out[0];
    for i in 1..out.len() {
        y = alpha * (y + samples[i] - samples[i - 1]);
        out[i] = y;
    }
    out
}

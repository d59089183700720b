//! Configuration management

use crate::audio::AudioCaptureConfig;
use crate::error::{VoxError, VoxResult};
use crate::vad::VadConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the assistant decides when to capture an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningMode {
    /// VAD-based, always listening (default)
    Continuous,
    /// Listen for a wake phrase, then capture one command
    WakeWord,
    /// Only capture between `start_capture()` and `stop_capture()`
    PushToTalk,
}

/// Main configuration for [`VoiceAssistant`](crate::VoiceAssistant)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Audio capture configuration
    pub capture: AudioCaptureConfig,

    /// Voice activity detector configuration
    pub vad: VadConfig,

    /// Duration of audio to read for each VAD check (milliseconds)
    pub vad_check_duration_ms: u32,

    /// Duration of audio to read for command processing (milliseconds)
    pub command_capture_duration_ms: u32,

    /// Poll interval of the capture-side ticker (milliseconds)
    pub poll_interval_ms: u64,

    /// Maximum audio queue depth; overflowing buffers are dropped
    pub max_queue_depth: usize,

    /// Auto-select strategy: NLU when any parameterized command is registered
    pub auto_select_strategy: bool,

    /// Force the NLU strategy even for simple commands
    pub force_nlu_strategy: bool,

    /// Listening mode (continuous / wake-word / push-to-talk)
    pub listening_mode: ListeningMode,

    /// Wake word phrase (required when `listening_mode` is `WakeWord`)
    pub wake_word: String,

    /// How long to wait for a command after the wake word (milliseconds)
    pub wake_word_timeout_ms: u64,

    /// Minimum confidence for wake word detection (0.0-1.0)
    pub wake_word_confidence: f32,

    /// Minimum confidence for a guided match (0.0-1.0)
    pub min_guided_confidence: f32,

    /// Minimum NLU confidence for accepting an intent (0.0-1.0)
    pub min_nlu_confidence: f32,

    /// Minimum transcription confidence, as `exp(logprob_min)` (0.0-1.0)
    pub min_transcription_confidence: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            capture: AudioCaptureConfig::default(),
            vad: VadConfig::default(),
            vad_check_duration_ms: 2000,
            command_capture_duration_ms: 8000,
            poll_interval_ms: 100,
            max_queue_depth: 10,
            auto_select_strategy: true,
            force_nlu_strategy: false,
            listening_mode: ListeningMode::Continuous,
            wake_word: String::new(),
            wake_word_timeout_ms: 5000,
            wake_word_confidence: 0.5,
            min_guided_confidence: 0.3,
            min_nlu_confidence: 0.3,
            min_transcription_confidence: 0.0,
        }
    }
}

impl AssistantConfig {
    /// Load config from the default path, or return defaults if absent
    pub fn load() -> VoxResult<Self> {
        Self::load_from(config_path()?)
    }

    /// Load config from an explicit path, or return defaults if absent
    pub fn load_from(path: PathBuf) -> VoxResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> VoxResult<()> {
        self.save_to(config_path()?)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: PathBuf) -> VoxResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

fn config_path() -> VoxResult<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| VoxError::Config("no user config directory available".into()))?;
    Ok(base.join("voxkit").join("config.json"))
}

//! # voxkit
//!
//! Embeddable voice command pipeline: a continuous microphone stream in,
//! typed command invocations out.
//!
//! ## Architecture
//!
//! ```text
//! AudioCapture ── ticker thread ── VAD / wake word / push-to-talk
//!                      │
//!               bounded audio queue
//!                      │
//!              consumer thread ── RecognitionStrategy (guided | NLU)
//!                      │
//!               CommandDispatcher ── validate + defaults ── handler
//! ```
//!
//! Hosts declare commands as [`CommandDescriptor`]s with typed parameter
//! schemas, register a [`CommandHandler`] for each, and receive
//! [`AssistantEvent`]s as utterances resolve. Audio capture, speech-to-text
//! and LLM NLU backends are injected behind the [`AudioCapture`],
//! [`AsrEngine`] and [`NluEngine`] traits; the built-in
//! [`RuleBasedNluEngine`] covers parameter extraction without a model.

pub mod asr;
pub mod assistant;
pub mod audio;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod nlu;
pub mod strategy;
pub mod testing;
pub mod utils;
pub mod vad;

// Convenience re-exports for downstream crates
pub use asr::{AsrEngine, GuidedMatch, Transcription, ASR_SAMPLE_RATE};
pub use assistant::VoiceAssistant;
pub use audio::{AudioCapture, AudioCaptureConfig};
pub use command::{
    CommandContext, CommandDescriptor, CommandDispatcher, CommandHandler, CommandRegistry,
    CommandResult, ParamDescriptor, ParamType, ParamValue,
};
pub use config::{AssistantConfig, ListeningMode};
pub use error::{VoxError, VoxResult};
pub use events::{AssistantEvent, ListeningState};
pub use nlu::{IntentMatch, NluEngine, RuleBasedNluEngine};
pub use vad::{EnergyVad, VadConfig, VadReport};

#[cfg(feature = "cpal-capture")]
pub use audio::CpalCapture;

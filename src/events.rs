//! Assistant events
//!
//! Everything observable about the pipeline is surfaced through one typed
//! event stream delivered to the host's registered callback.

use crate::command::{CommandContext, CommandResult};
use std::sync::Arc;

/// Internal state of the listening state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    /// Push-to-talk: waiting for `start_capture()`
    Idle,
    /// Continuous/WakeWord: listening for speech
    Listening,
    /// WakeWord: wake phrase heard, waiting for the command
    WakeWordActive,
    /// Push-to-talk: actively capturing
    Capturing,
}

/// Events emitted by the assistant.
///
/// Delivered on the thread where they occur (ticker or consumer), never
/// while an internal lock is held. Handlers may call back into the
/// assistant.
#[derive(Debug, Clone)]
pub enum AssistantEvent {
    /// End of an utterance detected; audio was queued for recognition
    SpeechDetected,
    /// The wake phrase was recognized (WakeWord mode)
    WakeWordDetected,
    /// Push-to-talk capture began
    CaptureStarted,
    /// Push-to-talk capture ended
    CaptureEnded,
    /// The listening state machine moved
    ListeningStateChanged {
        old: ListeningState,
        new: ListeningState,
    },
    /// A command was dispatched; `result` is the dispatch outcome
    CommandExecuted {
        name: String,
        result: CommandResult,
        context: CommandContext,
    },
    /// Speech was transcribed but matched no command
    Unrecognized { transcript: String },
    /// A recognition attempt failed without producing a transcript
    Error { message: String },
}

/// Host callback receiving every [`AssistantEvent`]
pub type EventCallback = Arc<dyn Fn(&AssistantEvent) + Send + Sync>;

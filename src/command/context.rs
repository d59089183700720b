//! Command execution context
//!
//! Carries extracted parameters and recognition metadata to a handler's
//! `execute`. Handlers receive `&CommandContext`, so the view is immutable;
//! the dispatcher and strategy adapter use the mutators while building it.

use super::param::ParamValue;
use std::collections::HashMap;

/// Context passed to a command handler
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    params: HashMap<String, ParamValue>,
    raw_transcript: String,
    confidence: f32,
}

impl CommandContext {
    pub fn new(raw_transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            params: HashMap::new(),
            raw_transcript: raw_transcript.into(),
            confidence,
        }
    }

    /// Access a parameter by name
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Check whether a parameter is present
    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// All extracted parameters
    pub fn all_params(&self) -> &HashMap<String, ParamValue> {
        &self.params
    }

    /// The raw transcribed text this command was recognized from
    pub fn raw_transcript(&self) -> &str {
        &self.raw_transcript
    }

    /// Recognition confidence (0.0-1.0)
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: ParamValue) {
        self.params.insert(name.into(), value);
    }

    pub fn set_raw_transcript(&mut self, transcript: impl Into<String>) {
        self.raw_transcript = transcript.into();
    }

    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = confidence;
    }
}

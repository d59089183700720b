//! NLU (Natural Language Understanding) interface
//!
//! Maps a free-form transcript onto one of the registered command schemas
//! and extracts raw string parameters. The default implementation is the
//! [`RuleBasedNluEngine`]; LLM-backed engines plug in through the same
//! trait.

pub mod rule_based;

pub use rule_based::RuleBasedNluEngine;

use crate::command::CommandDescriptor;
use crate::error::VoxResult;
use std::collections::HashMap;

/// A recognized intent with its extracted parameters
#[derive(Debug, Clone, Default)]
pub struct IntentMatch {
    /// Name of the matched command schema
    pub command_name: String,
    /// Match confidence (0.0-1.0)
    pub confidence: f32,
    /// Extracted parameters as raw strings; typing happens at dispatch
    pub params: HashMap<String, String>,
}

/// Trait for NLU engines
pub trait NluEngine: Send + Sync {
    /// Resolve `transcript` against the command schemas.
    ///
    /// Errors carry an explanatory message (no matching schema, empty
    /// transcript, backend failure); they feed the pipeline's
    /// unrecognized/error reporting and never abort it.
    fn process(
        &self,
        transcript: &str,
        schemas: &[CommandDescriptor],
    ) -> VoxResult<IntentMatch>;
}

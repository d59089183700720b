//! Command schema
//!
//! The declarative contract a host registers for each command — the voice
//! analogue of a function-calling tool definition.

use super::param::ParamDescriptor;
use serde::{Deserialize, Serialize};

/// Full schema for a command, registered alongside its handler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDescriptor {
    /// Unique identifier, used as the registry key, e.g. "zoom_to"
    pub name: String,

    /// Natural-language description, used by NLU engines for intent context
    pub description: String,

    /// Phrases that trigger this command. Guided recognition matches them
    /// directly; the NLU uses them for intent classification. A command
    /// needs at least one phrase to be recognizable.
    pub trigger_phrases: Vec<String>,

    /// Parameter schema. Empty means a simple command.
    pub parameters: Vec<ParamDescriptor>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_phrases = triggers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameter(mut self, param: ParamDescriptor) -> Self {
        self.parameters.push(param);
        self
    }

    /// True when the command has parameters and therefore needs NLU
    pub fn is_parameterized(&self) -> bool {
        !self.parameters.is_empty()
    }
}

//! Command testing harness
//!
//! Drives the NLU and dispatch pipeline from plain text, bypassing audio
//! entirely. Useful for unit-testing command schemas and extraction rules
//! exactly as the live pipeline would run them:
//!
//! ```
//! use std::sync::Arc;
//! use voxkit::command::{CommandContext, CommandDescriptor, CommandResult, ParamDescriptor, ParamType};
//! use voxkit::testing::CommandTester;
//!
//! let tester = CommandTester::new();
//! tester.registry().register(
//!     CommandDescriptor::new("zoom_to")
//!         .with_triggers(["zoom to"])
//!         .with_parameter(ParamDescriptor::new("level", ParamType::Integer).required()),
//!     Arc::new(|_: &CommandContext| CommandResult::Success),
//! );
//!
//! let result = tester.process_text("zoom to 15");
//! assert!(result.recognized);
//! assert_eq!(result.command_name, "zoom_to");
//! assert_eq!(result.params.get("level").unwrap(), "15");
//! assert_eq!(result.execution_result, Some(CommandResult::Success));
//! ```

use crate::command::{
    CommandContext, CommandDispatcher, CommandRegistry, CommandResult, ParamValue,
};
use crate::nlu::{NluEngine, RuleBasedNluEngine};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything observed while pushing one transcript through the pipeline
#[derive(Debug, Clone, Default)]
pub struct TestResult {
    /// Whether a command was recognized
    pub recognized: bool,
    /// Matched command name (empty when not recognized)
    pub command_name: String,
    /// NLU confidence (0.0-1.0)
    pub confidence: f32,
    /// Extracted raw string parameters
    pub params: HashMap<String, String>,
    /// Dispatch outcome; None when recognition failed
    pub execution_result: Option<CommandResult>,
    /// The input transcript
    pub raw_transcript: String,
    /// Error message when recognition failed
    pub error: String,
}

/// Text-driven test harness over registry + NLU + dispatcher
pub struct CommandTester {
    registry: Arc<CommandRegistry>,
    dispatcher: CommandDispatcher,
    nlu: Arc<dyn NluEngine>,
    min_confidence: f32,
}

impl Default for CommandTester {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTester {
    /// Tester with the default rule-based NLU
    pub fn new() -> Self {
        Self::with_nlu(Arc::new(RuleBasedNluEngine::new()))
    }

    /// Tester with a custom NLU engine
    pub fn with_nlu(nlu: Arc<dyn NluEngine>) -> Self {
        let registry = Arc::new(CommandRegistry::new());
        Self {
            dispatcher: CommandDispatcher::new(Arc::clone(&registry)),
            registry,
            nlu,
            min_confidence: 0.5,
        }
    }

    /// The registry; register commands here before processing text
    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.registry)
    }

    /// Commands below this NLU confidence are not recognized
    pub fn set_min_confidence(&mut self, threshold: f32) {
        self.min_confidence = threshold;
    }

    /// Run a transcript through NLU and dispatch, as if ASR had produced it
    pub fn process_text(&self, transcript: &str) -> TestResult {
        let mut result = TestResult {
            raw_transcript: transcript.to_string(),
            ..TestResult::default()
        };

        let schemas = self.registry.all_descriptors();
        let intent = match self.nlu.process(transcript, &schemas) {
            Ok(intent) => intent,
            Err(e) => {
                result.error = e.to_string();
                return result;
            }
        };

        if intent.confidence < self.min_confidence {
            result.error = format!(
                "confidence {:.2} below threshold {:.2}",
                intent.confidence, self.min_confidence
            );
            return result;
        }

        result.recognized = true;
        result.command_name = intent.command_name.clone();
        result.confidence = intent.confidence;
        result.params = intent.params.clone();

        let mut context = CommandContext::new(transcript, intent.confidence);
        for (name, value) in intent.params {
            context.set_param(name, ParamValue::new(value));
        }

        result.execution_result = Some(self.dispatcher.dispatch(&intent.command_name, &mut context));
        result
    }

    /// Process several transcripts, one result each
    pub fn process_batch<I, S>(&self, transcripts: I) -> Vec<TestResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        transcripts
            .into_iter()
            .map(|t| self.process_text(t.as_ref()))
            .collect()
    }
}

//! Recognition strategies
//!
//! Two ways to turn an utterance into a command: guided matching scores the
//! audio directly against the registered trigger phrases (fast, no
//! parameters), while the NLU path transcribes first and runs intent and
//! parameter extraction over the text. The orchestrator picks one at start
//! and swaps it when configuration changes.

use crate::asr::AsrEngine;
use crate::command::CommandRegistry;
use crate::error::VoxError;
use crate::nlu::NluEngine;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Where the milliseconds went during one recognition
#[derive(Debug, Clone, Copy, Default)]
pub struct RecognitionTiming {
    pub asr_ms: u64,
    pub nlu_ms: u64,
    pub total_ms: u64,
}

/// A successfully recognized command
#[derive(Debug, Clone)]
pub struct RecognizedCommand {
    pub command_name: String,
    pub confidence: f32,
    /// Raw string parameters; typed at dispatch
    pub params: HashMap<String, String>,
    pub raw_transcript: String,
    pub timing: RecognitionTiming,
}

/// A failed recognition attempt
#[derive(Debug, Clone)]
pub struct RecognitionFailure {
    pub message: String,
    /// Present when ASR produced text before the attempt failed; drives the
    /// unrecognized-vs-error event split
    pub raw_transcript: Option<String>,
    pub timing: RecognitionTiming,
}

pub type RecognitionOutcome = Result<RecognizedCommand, RecognitionFailure>;

/// The strategy in use, chosen once per `start()`
#[derive(Clone)]
pub enum RecognitionStrategy {
    Guided(GuidedRecognition),
    Nlu(NluRecognition),
}

impl RecognitionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RecognitionStrategy::Guided(_) => "guided",
            RecognitionStrategy::Nlu(_) => "nlu",
        }
    }

    pub fn recognize(&self, samples: &[f32]) -> RecognitionOutcome {
        match self {
            RecognitionStrategy::Guided(s) => s.recognize(samples),
            RecognitionStrategy::Nlu(s) => s.recognize(samples),
        }
    }
}

/// Guided recognition: score audio against the registered trigger phrases
/// and map the winner back to its command.
#[derive(Clone)]
pub struct GuidedRecognition {
    asr: Arc<dyn AsrEngine>,
    registry: Arc<CommandRegistry>,
    min_confidence: f32,
}

impl GuidedRecognition {
    pub fn new(asr: Arc<dyn AsrEngine>, registry: Arc<CommandRegistry>) -> Self {
        Self {
            asr,
            registry,
            min_confidence: 0.3,
        }
    }

    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    pub fn recognize(&self, samples: &[f32]) -> RecognitionOutcome {
        let total_start = Instant::now();
        let mut timing = RecognitionTiming::default();

        if !self.asr.is_initialized() {
            return Err(failure("ASR engine not initialized", None, timing, total_start));
        }

        // Refresh the phrase map every pass; the registry may have changed
        let descriptors = self.registry.all_descriptors();
        let mut phrase_to_command: HashMap<String, String> = HashMap::new();
        let mut phrases: Vec<String> = Vec::new();
        for desc in &descriptors {
            for phrase in &desc.trigger_phrases {
                let lower = phrase.to_lowercase();
                phrase_to_command.insert(lower.clone(), desc.name.clone());
                phrases.push(lower);
            }
        }

        if phrases.is_empty() {
            return Err(failure("no trigger phrases registered", None, timing, total_start));
        }

        let asr_start = Instant::now();
        let matched = self.asr.guided_match(samples, &phrases);
        timing.asr_ms = asr_start.elapsed().as_millis() as u64;
        timing.nlu_ms = 0;

        let matched = match matched {
            Ok(m) => m,
            Err(e) => return Err(failure(&e.to_string(), None, timing, total_start)),
        };

        if matched.best_score < self.min_confidence {
            return Err(failure(
                &format!(
                    "confidence below threshold ({:.2} < {:.2})",
                    matched.best_score, self.min_confidence
                ),
                None,
                timing,
                total_start,
            ));
        }

        let Some(command_name) = phrase_to_command.get(&matched.best_phrase.to_lowercase()) else {
            // Shouldn't happen: the backend answered outside the list
            return Err(failure("matched phrase not found in mapping", None, timing, total_start));
        };

        timing.total_ms = total_start.elapsed().as_millis() as u64;
        debug!(
            command = %command_name,
            score = matched.best_score,
            asr_ms = timing.asr_ms,
            "guided recognition matched"
        );

        Ok(RecognizedCommand {
            command_name: command_name.clone(),
            confidence: matched.best_score,
            params: HashMap::new(),
            raw_transcript: matched.best_phrase,
            timing,
        })
    }
}

/// NLU recognition: transcribe, then resolve intent and parameters
#[derive(Clone)]
pub struct NluRecognition {
    asr: Arc<dyn AsrEngine>,
    nlu: Arc<dyn NluEngine>,
    registry: Arc<CommandRegistry>,
    min_transcription_confidence: f32,
    min_nlu_confidence: f32,
}

impl NluRecognition {
    pub fn new(
        asr: Arc<dyn AsrEngine>,
        nlu: Arc<dyn NluEngine>,
        registry: Arc<CommandRegistry>,
    ) -> Self {
        Self {
            asr,
            nlu,
            registry,
            min_transcription_confidence: 0.0,
            min_nlu_confidence: 0.3,
        }
    }

    pub fn with_min_transcription_confidence(mut self, threshold: f32) -> Self {
        self.min_transcription_confidence = threshold;
        self
    }

    pub fn with_min_nlu_confidence(mut self, threshold: f32) -> Self {
        self.min_nlu_confidence = threshold;
        self
    }

    pub fn recognize(&self, samples: &[f32]) -> RecognitionOutcome {
        let total_start = Instant::now();
        let mut timing = RecognitionTiming::default();

        if !self.asr.is_initialized() {
            return Err(failure("ASR engine not initialized", None, timing, total_start));
        }

        let asr_start = Instant::now();
        let transcription = self.asr.transcribe(samples);
        timing.asr_ms = asr_start.elapsed().as_millis() as u64;

        let transcription = match transcription {
            Ok(t) => t,
            Err(e) => {
                return Err(failure(
                    &format!("transcription failed: {e}"),
                    None,
                    timing,
                    total_start,
                ))
            }
        };

        if transcription.text.is_empty() {
            return Err(failure("empty transcription", None, timing, total_start));
        }

        if transcription.confidence() < self.min_transcription_confidence {
            return Err(failure(
                "transcription confidence below threshold",
                None,
                timing,
                total_start,
            ));
        }

        let transcript = transcription.text;

        let descriptors = self.registry.all_descriptors();
        if descriptors.is_empty() {
            return Err(failure(
                "no commands registered",
                Some(transcript),
                timing,
                total_start,
            ));
        }

        let nlu_start = Instant::now();
        let intent = self.nlu.process(&transcript, &descriptors);
        timing.nlu_ms = nlu_start.elapsed().as_millis() as u64;

        let intent = match intent {
            Ok(i) => i,
            Err(e) => {
                let message = match &e {
                    VoxError::NoMatch(m) | VoxError::LowConfidence(m) => {
                        format!("NLU found no command: {m}")
                    }
                    other => format!("NLU processing failed: {other}"),
                };
                return Err(failure(&message, Some(transcript), timing, total_start));
            }
        };

        if intent.confidence < self.min_nlu_confidence {
            return Err(failure(
                &format!(
                    "NLU confidence below threshold ({:.2} < {:.2})",
                    intent.confidence, self.min_nlu_confidence
                ),
                Some(transcript),
                timing,
                total_start,
            ));
        }

        timing.total_ms = total_start.elapsed().as_millis() as u64;
        debug!(
            command = %intent.command_name,
            confidence = intent.confidence,
            asr_ms = timing.asr_ms,
            nlu_ms = timing.nlu_ms,
            "nlu recognition matched"
        );

        Ok(RecognizedCommand {
            command_name: intent.command_name,
            confidence: intent.confidence,
            params: intent.params,
            raw_transcript: transcript,
            timing,
        })
    }
}

fn failure(
    message: &str,
    raw_transcript: Option<String>,
    mut timing: RecognitionTiming,
    total_start: Instant,
) -> RecognitionFailure {
    timing.total_ms = total_start.elapsed().as_millis() as u64;
    RecognitionFailure {
        message: message.to_string(),
        raw_transcript,
        timing,
    }
}

//! ASR (Automatic Speech Recognition) interface
//!
//! The pipeline consumes speech-to-text through this trait; concrete
//! backends (local neural models, remote HTTP services) live outside the
//! crate and are injected at initialization.

use crate::error::VoxResult;
use crate::utils::fuzzy;

/// Sample rate every ASR backend receives: 16 kHz mono f32 PCM
pub const ASR_SAMPLE_RATE: u32 = 16_000;

/// Result of a transcription
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    /// Transcribed text, trimmed
    pub text: String,
    /// Minimum log probability across tokens (confidence floor)
    pub logprob_min: f32,
    /// Sum of log probabilities
    pub logprob_sum: f32,
    /// Number of tokens produced
    pub num_tokens: usize,
    /// Backend processing time in milliseconds
    pub processing_time_ms: u64,
}

impl Transcription {
    /// Transcription confidence as `exp(logprob_min)`, 0 when no tokens
    pub fn confidence(&self) -> f32 {
        if self.num_tokens > 0 {
            self.logprob_min.exp()
        } else {
            0.0
        }
    }
}

/// Result of scoring audio against a fixed set of phrases
#[derive(Debug, Clone, Default)]
pub struct GuidedMatch {
    /// Index of the best matching phrase in the input list
    pub best_index: usize,
    /// The best matching phrase text
    pub best_phrase: String,
    /// Score of the best match (0.0-1.0)
    pub best_score: f32,
    /// Scores for all phrases, same order as the input
    pub all_scores: Vec<f32>,
    /// Backend processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Trait for ASR engines
///
/// Implementations are shared across the ticker and consumer threads, so
/// they must be `Send + Sync`; engines needing mutable state lock
/// internally. A single inference is not expected to be reentrant.
pub trait AsrEngine: Send + Sync {
    /// Whether the backend is ready for inference
    fn is_initialized(&self) -> bool {
        true
    }

    /// General speech-to-text over 16 kHz mono f32 samples
    fn transcribe(&self, samples: &[f32]) -> VoxResult<Transcription>;

    /// Score the audio against each candidate phrase.
    ///
    /// Backends without a native guided mode should transcribe and then
    /// call [`score_phrases`] on the text.
    fn guided_match(&self, samples: &[f32], phrases: &[String]) -> VoxResult<GuidedMatch>;
}

/// Score a transcript against candidate phrases with the same edit-distance
/// similarity the NLU uses. This is the synthesized guided match for
/// backends that can only transcribe.
pub fn score_phrases(transcript: &str, phrases: &[String]) -> GuidedMatch {
    let normalized = fuzzy::normalize(transcript);

    let mut result = GuidedMatch::default();
    result.all_scores.reserve(phrases.len());

    for (i, phrase) in phrases.iter().enumerate() {
        let score = fuzzy::similarity(&normalized, &fuzzy::normalize(phrase));
        result.all_scores.push(score);
        if score > result.best_score || i == 0 {
            result.best_index = i;
            result.best_phrase = phrase.clone();
            result.best_score = score;
        }
    }

    result
}

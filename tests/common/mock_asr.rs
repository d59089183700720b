//! Mock ASR engine for integration tests
//!
//! Replays scripted transcripts and guided matches in order, and records
//! the sizes of the audio buffers it receives.

use std::collections::VecDeque;
use std::sync::Mutex;
use voxkit::asr::{score_phrases, AsrEngine, GuidedMatch, Transcription};
use voxkit::{VoxError, VoxResult};

#[derive(Default)]
pub struct MockAsr {
    transcripts: Mutex<VecDeque<String>>,
    guided: Mutex<VecDeque<GuidedMatch>>,
    pub received_sample_counts: Mutex<Vec<usize>>,
}

impl MockAsr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transcript for the next `transcribe` call (also used by
    /// `guided_match` when no explicit guided result is queued)
    pub fn push_transcript(&self, text: &str) {
        self.transcripts
            .lock()
            .unwrap()
            .push_back(text.to_string());
    }

    /// Queue an explicit result for the next `guided_match` call
    pub fn push_guided(&self, phrase: &str, score: f32) {
        self.guided.lock().unwrap().push_back(GuidedMatch {
            best_index: 0,
            best_phrase: phrase.to_string(),
            best_score: score,
            all_scores: vec![score],
            processing_time_ms: 1,
        });
    }
}

impl AsrEngine for MockAsr {
    fn transcribe(&self, samples: &[f32]) -> VoxResult<Transcription> {
        self.received_sample_counts.lock().unwrap().push(samples.len());

        match self.transcripts.lock().unwrap().pop_front() {
            Some(text) => Ok(Transcription {
                text,
                logprob_min: -0.05,
                logprob_sum: -0.2,
                num_tokens: 4,
                processing_time_ms: 1,
            }),
            None => Err(VoxError::TranscriptionFailed(
                "no scripted transcript".into(),
            )),
        }
    }

    fn guided_match(&self, samples: &[f32], phrases: &[String]) -> VoxResult<GuidedMatch> {
        self.received_sample_counts.lock().unwrap().push(samples.len());

        if let Some(scripted) = self.guided.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        // Fall back to scoring the next scripted transcript, like a backend
        // without native guided mode would
        match self.transcripts.lock().unwrap().pop_front() {
            Some(text) => Ok(score_phrases(&text, phrases)),
            None => Err(VoxError::TranscriptionFailed(
                "no scripted transcript".into(),
            )),
        }
    }
}

//! Rule-based NLU engine
//!
//! Deterministic intent matching and parameter extraction with no model
//! behind it:
//!
//! 1. Score the transcript against every schema's trigger phrases by
//!    normalized edit distance; containment boosts the score. The schema
//!    name (underscores as spaces) acts as a fallback trigger.
//! 2. Strip the winning trigger from the transcript to isolate the
//!    argument region.
//! 3. Extract each schema parameter from the region with per-type rules.

use super::{IntentMatch, NluEngine};
use crate::command::{CommandDescriptor, ParamDescriptor, ParamType};
use crate::error::{VoxError, VoxResult};
use crate::utils::fuzzy;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]+\b").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]+\.?[0-9]*\b").unwrap());

/// Containment of a trigger inside the transcript scores at least this much
const CONTAINMENT_BOOST: f32 = 0.8;

/// A trigger word sequence must overlap this fraction of transcript words
/// to be stripped when it is not a plain substring
const WORD_OVERLAP_THRESHOLD: f32 = 0.5;

const PREPOSITIONS: [&str; 5] = ["to", "at", "near", "called", "named"];
const TRUE_WORDS: [&str; 4] = ["yes", "true", "enable", "on"];
const FALSE_WORDS: [&str; 4] = ["no", "false", "disable", "off"];

/// Default rule-based NLU engine
#[derive(Debug, Clone)]
pub struct RuleBasedNluEngine {
    min_confidence: f32,
}

impl Default for RuleBasedNluEngine {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
        }
    }
}

impl RuleBasedNluEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum intent confidence; matches below it are rejected
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    pub fn set_min_confidence(&mut self, threshold: f32) {
        self.min_confidence = threshold;
    }
}

impl NluEngine for RuleBasedNluEngine {
    fn process(
        &self,
        transcript: &str,
        schemas: &[CommandDescriptor],
    ) -> VoxResult<IntentMatch> {
        if transcript.trim().is_empty() {
            return Err(VoxError::NoMatch("empty transcript".into()));
        }
        if schemas.is_empty() {
            return Err(VoxError::NoMatch("no command schemas provided".into()));
        }

        let normalized = fuzzy::normalize(transcript);

        let Some(best) = match_intent(&normalized, schemas) else {
            return Err(VoxError::NoMatch(format!(
                "no command matched '{transcript}'"
            )));
        };

        if best.score < self.min_confidence {
            return Err(VoxError::LowConfidence(format!(
                "no command matched '{}' (best score {:.2} below {:.2})",
                transcript, best.score, self.min_confidence
            )));
        }

        let descriptor = &schemas[best.schema_index];
        let region = argument_region(&normalized, &best.matched_trigger);
        debug!(
            command = %descriptor.name,
            score = best.score,
            region = %region,
            "intent matched"
        );

        let params = extract_params(&region, descriptor);

        Ok(IntentMatch {
            command_name: descriptor.name.clone(),
            confidence: best.score,
            params,
        })
    }
}

struct IntentCandidate {
    schema_index: usize,
    score: f32,
    matched_trigger: String,
}

/// Best (schema, trigger) across all schemas. Strict comparison, so on a
/// tie the first candidate in iteration order wins; callers pass schemas in
/// registry iteration order, which keeps the result stable per snapshot.
fn match_intent(normalized_transcript: &str, schemas: &[CommandDescriptor]) -> Option<IntentCandidate> {
    let mut best: Option<IntentCandidate> = None;

    let mut consider = |candidate: IntentCandidate| {
        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    };

    for (i, schema) in schemas.iter().enumerate() {
        for trigger in &schema.trigger_phrases {
            let normalized_trigger = fuzzy::normalize(trigger);
            let mut score = fuzzy::similarity(normalized_transcript, &normalized_trigger);
            if !normalized_trigger.is_empty()
                && normalized_transcript.contains(&normalized_trigger)
            {
                score = score.max(CONTAINMENT_BOOST);
            }
            consider(IntentCandidate {
                schema_index: i,
                score,
                matched_trigger: normalized_trigger,
            });
        }

        // The command name itself is a fallback trigger
        let name_phrase = fuzzy::normalize(&schema.name).replace('_', " ");
        let name_score = fuzzy::similarity(normalized_transcript, &name_phrase);
        consider(IntentCandidate {
            schema_index: i,
            score: name_score,
            matched_trigger: name_phrase,
        });
    }

    best
}

/// The part of the transcript left after the matched trigger: parameters
/// are extracted from here, never from the trigger words themselves.
fn argument_region(normalized_transcript: &str, matched_trigger: &str) -> String {
    // Plain substring: take everything after it
    if !matched_trigger.is_empty() {
        if let Some(pos) = normalized_transcript.find(matched_trigger) {
            return normalized_transcript[pos + matched_trigger.len()..]
                .trim_start()
                .to_string();
        }
    }

    // Fuzzy case: slide the trigger's word sequence over the transcript and
    // drop through the best-overlapping position
    let words: Vec<&str> = normalized_transcript.split_whitespace().collect();
    let trigger_words: Vec<&str> = matched_trigger.split_whitespace().collect();

    if !trigger_words.is_empty() && words.len() >= trigger_words.len() {
        let mut best_fraction = 0.0f32;
        let mut best_end = 0usize;

        for start in 0..=(words.len() - trigger_words.len()) {
            let matches = trigger_words
                .iter()
                .enumerate()
                .filter(|(j, tw)| words[start + j] == **tw)
                .count();
            let fraction = matches as f32 / trigger_words.len() as f32;
            if fraction > best_fraction {
                best_fraction = fraction;
                best_end = start + trigger_words.len();
            }
        }

        if best_fraction >= WORD_OVERLAP_THRESHOLD {
            return words[best_end..].join(" ");
        }
    }

    normalized_transcript.to_string()
}

fn extract_params(region: &str, descriptor: &CommandDescriptor) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for param in &descriptor.parameters {
        let value = extract_param_value(region, param);
        if !value.is_empty() {
            params.insert(param.name.clone(), value);
        }
    }
    params
}

/// Parameter keyword as it would be spoken: lowercase, underscores as spaces
fn spoken_keyword(name: &str) -> String {
    name.to_lowercase().replace('_', " ")
}

fn extract_param_value(region: &str, param: &ParamDescriptor) -> String {
    match param.param_type {
        ParamType::Integer => extract_number(region, &param.name, &INTEGER_RE),
        ParamType::Double => extract_number(region, &param.name, &NUMBER_RE),
        ParamType::Bool => extract_bool(region),
        ParamType::Enum => extract_enum(region, &param.enum_values),
        ParamType::String => extract_string(region, &param.name),
    }
}

/// One match: take it. Several: prefer the one closest to the parameter's
/// spoken keyword, falling back to the first in the region.
fn extract_number(region: &str, param_name: &str, pattern: &Regex) -> String {
    let found: Vec<(usize, &str)> = pattern
        .find_iter(region)
        .map(|m| (m.start(), m.as_str()))
        .collect();

    match found.as_slice() {
        [] => String::new(),
        [(_, only)] => (*only).to_string(),
        many => {
            let keyword = spoken_keyword(param_name);
            if let Some(keyword_pos) = region.find(&keyword) {
                let (_, closest) = many
                    .iter()
                    .min_by_key(|(pos, _)| pos.abs_diff(keyword_pos))
                    .expect("non-empty match list");
                (*closest).to_string()
            } else {
                many[0].1.to_string()
            }
        }
    }
}

fn extract_bool(region: &str) -> String {
    if TRUE_WORDS.iter().any(|w| region.contains(w)) {
        return "true".to_string();
    }
    if FALSE_WORDS.iter().any(|w| region.contains(w)) {
        return "false".to_string();
    }
    String::new()
}

/// First declared enum value contained in the region, case-insensitively.
/// Returns the declared spelling, not the spoken one.
fn extract_enum(region: &str, enum_values: &[String]) -> String {
    enum_values
        .iter()
        .find(|value| region.contains(&value.to_lowercase()))
        .cloned()
        .unwrap_or_default()
}

/// Three-tier string extraction, stopping at the first hit:
/// words after the parameter's spoken keyword, words after a preposition,
/// then the whole region.
fn extract_string(region: &str, param_name: &str) -> String {
    let words: Vec<&str> = region.split_whitespace().collect();

    let keyword = spoken_keyword(param_name);
    let kw_words: Vec<&str> = keyword.split_whitespace().collect();
    if let Some(end) = find_word_sequence(&words, &kw_words) {
        let value = fuzzy::take_words(&words, end, 3);
        if !value.is_empty() {
            return value;
        }
    }

    for prep in PREPOSITIONS {
        if let Some(pos) = words.iter().position(|w| *w == prep) {
            let value = fuzzy::take_words(&words, pos + 1, 4);
            if !value.is_empty() {
                return value;
            }
        }
    }

    fuzzy::strip_trailing_punctuation(region.trim()).to_string()
}

/// Index just past the first occurrence of `needle` as a word sequence
fn find_word_sequence(words: &[&str], needle: &[&str]) -> Option<usize> {
    if needle.is_empty() || words.len() < needle.len() {
        return None;
    }
    (0..=(words.len() - needle.len()))
        .find(|&i| needle.iter().enumerate().all(|(j, w)| words[i + j] == *w))
        .map(|i| i + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParamDescriptor;

    fn zoom_schema() -> CommandDescriptor {
        CommandDescriptor::new("zoom_to")
            .with_triggers(["zoom to", "zoom in to", "set zoom"])
            .with_parameter(
                ParamDescriptor::new("level", ParamType::Integer)
                    .required()
                    .with_range(1.0, 20.0),
            )
    }

    fn color_schema() -> CommandDescriptor {
        CommandDescriptor::new("change_color")
            .with_triggers(["change color to", "set color to"])
            .with_parameter(ParamDescriptor::new("color", ParamType::String).required())
    }

    fn help_schema() -> CommandDescriptor {
        CommandDescriptor::new("show_help").with_triggers(["show help", "help", "what can I say"])
    }

    #[test]
    fn exact_trigger_scores_one() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [help_schema(), zoom_schema()];
        let result = engine.process("show help", &schemas).unwrap();
        assert_eq!(result.command_name, "show_help");
        assert!((result.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn containment_boosts_to_at_least_point_eight() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [zoom_schema()];
        let result = engine
            .process("please zoom to fifteen right now", &schemas)
            .unwrap();
        assert_eq!(result.command_name, "zoom_to");
        assert!(result.confidence >= 0.8);
    }

    #[test]
    fn command_name_acts_as_fallback_trigger() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [CommandDescriptor::new("open_settings").with_triggers(["preferences"])];
        let result = engine.process("open settings", &schemas).unwrap();
        assert_eq!(result.command_name, "open_settings");
    }

    #[test]
    fn low_confidence_is_rejected_with_message() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [help_schema()];
        let err = engine.process("completely unrelated words", &schemas);
        assert!(err.is_err());
    }

    #[test]
    fn empty_transcript_and_empty_schemas_fail() {
        let engine = RuleBasedNluEngine::new();
        assert!(engine.process("", &[help_schema()]).is_err());
        assert!(engine.process("   ", &[help_schema()]).is_err());
        assert!(engine.process("show help", &[]).is_err());
    }

    #[test]
    fn integer_extracted_from_argument_region() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [zoom_schema()];
        let result = engine.process("zoom to 15", &schemas).unwrap();
        assert_eq!(result.params.get("level").unwrap(), "15");
    }

    #[test]
    fn multiple_integers_prefer_keyword_neighbor() {
        let region = "width 800 and height 600";
        assert_eq!(extract_number(region, "width", &INTEGER_RE), "800");
        assert_eq!(extract_number(region, "height", &INTEGER_RE), "600");
    }

    #[test]
    fn multiple_integers_without_keyword_take_first() {
        assert_eq!(extract_number("12 then 34", "missing", &INTEGER_RE), "12");
    }

    #[test]
    fn no_integer_extracts_empty() {
        assert_eq!(extract_number("no digits here", "level", &INTEGER_RE), "");
    }

    #[test]
    fn double_accepts_decimal_point() {
        assert_eq!(extract_number("speed 2.5 please", "speed", &NUMBER_RE), "2.5");
    }

    #[test]
    fn bool_token_sets() {
        assert_eq!(extract_bool("turn it on"), "true");
        assert_eq!(extract_bool("yes please"), "true");
        assert_eq!(extract_bool("disable that"), "false");
        assert_eq!(extract_bool("nothing relevant here"), "false"); // "no" inside "nothing"
        assert_eq!(extract_bool("maybe later"), "");
    }

    #[test]
    fn enum_first_declared_value_wins() {
        let values = vec!["red".to_string(), "green".to_string(), "blue".to_string()];
        assert_eq!(extract_enum("make it green", &values), "green");
        assert_eq!(extract_enum("red or blue", &values), "red");
        assert_eq!(extract_enum("purple", &values), "");
    }

    #[test]
    fn string_tier_one_keyword() {
        assert_eq!(extract_string("name the big red barn now", "name"), "the big red");
    }

    #[test]
    fn string_tier_two_preposition() {
        assert_eq!(extract_string("fly me near the old lighthouse", "target"), "the old lighthouse");
    }

    #[test]
    fn string_tier_three_whole_region() {
        assert_eq!(extract_string("green.", "color"), "green");
    }

    #[test]
    fn trigger_stripping_isolates_argument_region() {
        assert_eq!(argument_region("change color to green.", "change color to"), "green.");
        assert_eq!(argument_region("zoom to 15", "zoom to"), "15");
    }

    #[test]
    fn word_overlap_strips_misheard_trigger() {
        // "soon to" vs trigger "zoom to": one of two words matches = 0.5
        let region = argument_region("soon to 15", "zoom to");
        assert_eq!(region, "15");
    }

    #[test]
    fn no_overlap_keeps_whole_transcript() {
        let region = argument_region("fifteen please", "zoom to");
        assert_eq!(region, "fifteen please");
    }

    #[test]
    fn enum_with_trigger_stripping_scenario() {
        // End-to-end shape of the change-color scenario
        let engine = RuleBasedNluEngine::new();
        let schemas = [color_schema()];
        let result = engine.process("change color to green.", &schemas).unwrap();
        assert_eq!(result.command_name, "change_color");
        assert_eq!(result.params.get("color").unwrap(), "green");
    }

    #[test]
    fn intent_without_number_extracts_no_param() {
        let engine = RuleBasedNluEngine::new();
        let schemas = [CommandDescriptor::new("set_brightness")
            .with_triggers(["set brightness"])
            .with_parameter(
                ParamDescriptor::new("value", ParamType::Integer).with_default("50"),
            )];
        let result = engine.process("set brightness", &schemas).unwrap();
        assert!(result.params.is_empty());
    }

    #[test]
    fn tie_goes_to_first_schema_in_iteration_order() {
        let first = CommandDescriptor::new("cmd_a").with_triggers(["run it"]);
        let second = CommandDescriptor::new("cmd_b").with_triggers(["run it"]);
        let engine = RuleBasedNluEngine::new();
        let result = engine.process("run it", &[first, second]).unwrap();
        assert_eq!(result.command_name, "cmd_a");
    }
}

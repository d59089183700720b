//! Shared test fixtures

pub mod mock_asr;
pub mod mock_capture;

pub use mock_asr::MockAsr;
pub use mock_capture::MockCapture;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use voxkit::events::AssistantEvent;
use voxkit::{AssistantConfig, VadConfig, VoiceAssistant};

/// Collects every event the assistant emits, for ordered assertions
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<AssistantEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, assistant: &VoiceAssistant) {
        let events = Arc::clone(&self.events);
        assistant.on_event(move |event| {
            events.lock().unwrap().push(event.clone());
        });
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll until an event satisfies `pred`, or time out
    pub fn wait_for<F>(&self, pred: F, timeout: Duration) -> Option<AssistantEvent>
    where
        F: Fn(&AssistantEvent) -> bool,
    {
        let start = Instant::now();
        loop {
            if let Some(found) = self.events.lock().unwrap().iter().find(|e| pred(e)) {
                return Some(found.clone());
            }
            if start.elapsed() >= timeout {
                return None;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&AssistantEvent) -> bool,
    {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

/// Fast-polling config with a VAD tuned for the synthetic utterances below
pub fn test_config() -> AssistantConfig {
    AssistantConfig {
        vad: VadConfig {
            window_ms: 100,
            energy_threshold: 0.5,
            freq_threshold_hz: 0.0,
            sample_rate_hz: 16_000,
        },
        poll_interval_ms: 10,
        ..AssistantConfig::default()
    }
}

/// 300 ms of speech-level samples followed by a quiet 100 ms tail: the VAD
/// sees this as a finished utterance
pub fn finished_utterance() -> Vec<f32> {
    let mut samples = vec![0.5f32; 4800];
    samples.extend(std::iter::repeat(0.0f32).take(1600));
    samples
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("voxkit=debug")
        .try_init();
}

//! Voice assistant orchestrator
//!
//! Couples the capture side to the recognition side:
//!
//! - A ticker thread polls the audio buffer every `poll_interval_ms`, runs
//!   the listening state machine for the configured mode, and enqueues
//!   finished utterances.
//! - A consumer thread blocks on the queue, runs the selected recognition
//!   strategy, and dispatches the result.
//!
//! The queue is bounded: when full, the newest buffer is dropped with a
//! warning and the ticker never blocks. `stop()` wakes and joins both
//! threads; utterances still queued at that point are discarded without
//! dispatching.
//!
//! All public methods are callable from any thread. Events and command
//! handlers are invoked with no internal lock held, so they may re-enter
//! the assistant (e.g. register another command).

use crate::asr::AsrEngine;
use crate::audio::AudioCapture;
use crate::command::{CommandContext, CommandDispatcher, CommandRegistry, ParamValue};
use crate::config::{AssistantConfig, ListeningMode};
use crate::error::{VoxError, VoxResult};
use crate::events::{AssistantEvent, EventCallback, ListeningState};
use crate::nlu::NluEngine;
use crate::strategy::{GuidedRecognition, NluRecognition, RecognitionStrategy};
use crate::vad::EnergyVad;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const STATE_IDLE: u8 = 0;
const STATE_LISTENING: u8 = 1;
const STATE_WAKE_WORD_ACTIVE: u8 = 2;
const STATE_CAPTURING: u8 = 3;

fn state_to_u8(state: ListeningState) -> u8 {
    match state {
        ListeningState::Idle => STATE_IDLE,
        ListeningState::Listening => STATE_LISTENING,
        ListeningState::WakeWordActive => STATE_WAKE_WORD_ACTIVE,
        ListeningState::Capturing => STATE_CAPTURING,
    }
}

fn state_from_u8(raw: u8) -> ListeningState {
    match raw {
        STATE_LISTENING => ListeningState::Listening,
        STATE_WAKE_WORD_ACTIVE => ListeningState::WakeWordActive,
        STATE_CAPTURING => ListeningState::Capturing,
        _ => ListeningState::Idle,
    }
}

struct Inner {
    config: AssistantConfig,
    force_nlu: AtomicBool,
    registry: Arc<CommandRegistry>,
    dispatcher: CommandDispatcher,
    capture: Arc<dyn AudioCapture>,
    asr: Arc<dyn AsrEngine>,
    nlu: Option<Arc<dyn NluEngine>>,
    vad: EnergyVad,

    strategy: RwLock<Option<RecognitionStrategy>>,

    queue: Mutex<VecDeque<Vec<f32>>>,
    queue_cv: Condvar,
    running: AtomicBool,
    state: AtomicU8,

    /// Push-to-talk: when the current capture began
    capture_start: Mutex<Option<Instant>>,
    /// Wake word: when `WakeWordActive` was entered
    wake_timeout_start: Mutex<Option<Instant>>,

    callback: Mutex<Option<EventCallback>>,
}

impl Inner {
    fn emit(&self, event: AssistantEvent) {
        // Clone the callback out so user code runs without the lock
        let callback = {
            let guard = self.callback.lock().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        if let Some(callback) = callback {
            callback(&event);
        }
    }

    fn listening_state(&self) -> ListeningState {
        state_from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, new: ListeningState) {
        let old = state_from_u8(self.state.swap(state_to_u8(new), Ordering::AcqRel));
        if old != new {
            debug!(?old, ?new, "listening state changed");
            self.emit(AssistantEvent::ListeningStateChanged { old, new });
        }
    }

    /// Compare-and-swap on the listening state; false when `from` no longer
    /// holds, leaving everything untouched
    fn transition(&self, from: ListeningState, to: ListeningState) -> bool {
        let swapped = self
            .state
            .compare_exchange(
                state_to_u8(from),
                state_to_u8(to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if swapped {
            debug!(old = ?from, new = ?to, "listening state changed");
            self.emit(AssistantEvent::ListeningStateChanged { old: from, new: to });
        }
        swapped
    }

    fn select_strategy(&self) {
        let use_nlu = if self.force_nlu.load(Ordering::Acquire) {
            true
        } else if self.config.auto_select_strategy {
            self.registry.has_parameterized_commands()
        } else {
            false
        };

        let strategy = match (&self.nlu, use_nlu) {
            (Some(nlu), true) => RecognitionStrategy::Nlu(
                NluRecognition::new(
                    Arc::clone(&self.asr),
                    Arc::clone(nlu),
                    Arc::clone(&self.registry),
                )
                .with_min_transcription_confidence(self.config.min_transcription_confidence)
                .with_min_nlu_confidence(self.config.min_nlu_confidence),
            ),
            // No NLU engine: guided recognition is the only option
            _ => RecognitionStrategy::Guided(
                GuidedRecognition::new(Arc::clone(&self.asr), Arc::clone(&self.registry))
                    .with_min_confidence(self.config.min_guided_confidence),
            ),
        };

        info!(strategy = strategy.name(), "recognition strategy selected");
        *self.strategy.write().unwrap_or_else(|e| e.into_inner()) = Some(strategy);
    }

    /// Bounded enqueue. Drops the newest buffer on overflow; never blocks.
    fn enqueue(&self, samples: Vec<f32>) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= self.config.max_queue_depth {
            warn!(
                depth = queue.len(),
                "audio queue full, dropping utterance"
            );
            return;
        }
        queue.push_back(samples);
        self.queue_cv.notify_one();
    }

    // ── Ticker side ──────────────────────────────────────────────────────

    fn tick(&self) {
        match self.config.listening_mode {
            ListeningMode::Continuous => self.tick_continuous(),
            ListeningMode::WakeWord => self.tick_wake_word(),
            // Push-to-talk is driven entirely by the host
            ListeningMode::PushToTalk => {}
        }
    }

    fn tick_continuous(&self) {
        let samples = self
            .capture
            .get_audio(Some(self.config.vad_check_duration_ms));
        let report = self.vad.detect(&samples);
        if !report.speech_ended {
            return;
        }

        debug!(
            energy_all = report.energy_all,
            energy_last = report.energy_last,
            "speech ended"
        );
        self.emit(AssistantEvent::SpeechDetected);

        let command_audio = self
            .capture
            .get_audio(Some(self.config.command_capture_duration_ms));
        self.enqueue(command_audio);
        self.capture.clear_buffer();
    }

    fn tick_wake_word(&self) {
        match self.listening_state() {
            ListeningState::Listening => {
                let samples = self
                    .capture
                    .get_audio(Some(self.config.vad_check_duration_ms));
                if !self.vad.detect(&samples).speech_ended {
                    return;
                }

                // Something was said: check it against the wake word
                let wake_phrase = vec![self.config.wake_word.to_lowercase()];
                let matched = self.capture_wake_score(&samples, &wake_phrase);
                self.capture.clear_buffer();

                if matched {
                    info!(wake_word = %self.config.wake_word, "wake word detected");
                    *self
                        .wake_timeout_start
                        .lock()
                        .unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
                    self.set_state(ListeningState::WakeWordActive);
                    self.emit(AssistantEvent::WakeWordDetected);
                }
            }

            ListeningState::WakeWordActive => {
                let deadline_passed = {
                    let started = self
                        .wake_timeout_start
                        .lock()
                        .unwrap_or_else(|e| e.into_inner());
                    started.map_or(true, |t| {
                        t.elapsed() > Duration::from_millis(self.config.wake_word_timeout_ms)
                    })
                };
                if deadline_passed {
                    debug!("wake word window timed out");
                    self.set_state(ListeningState::Listening);
                    return;
                }

                let samples = self
                    .capture
                    .get_audio(Some(self.config.vad_check_duration_ms));
                if !self.vad.detect(&samples).speech_ended {
                    return;
                }

                self.emit(AssistantEvent::SpeechDetected);
                let command_audio = self
                    .capture
                    .get_audio(Some(self.config.command_capture_duration_ms));
                self.enqueue(command_audio);
                self.capture.clear_buffer();
                self.set_state(ListeningState::Listening);
            }

            // Idle/Capturing don't occur in wake-word mode
            _ => {}
        }
    }

    fn capture_wake_score(&self, samples: &[f32], wake_phrase: &[String]) -> bool {
        match self.asr.guided_match(samples, wake_phrase) {
            Ok(matched) => matched.best_score >= self.config.wake_word_confidence,
            Err(e) => {
                warn!("wake word match failed: {e}");
                false
            }
        }
    }

    // ── Consumer side ────────────────────────────────────────────────────

    fn consumer_loop(&self) {
        loop {
            let samples = {
                let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
                loop {
                    if !self.running.load(Ordering::Acquire) {
                        // Remaining queued utterances are discarded
                        return;
                    }
                    if let Some(samples) = queue.pop_front() {
                        break samples;
                    }
                    queue = self
                        .queue_cv
                        .wait(queue)
                        .unwrap_or_else(|e| e.into_inner());
                }
            };

            self.process_utterance(&samples);
        }
    }

    /// Exactly one of `CommandExecuted`, `Unrecognized`, `Error` is emitted
    /// per buffer taken off the queue.
    fn process_utterance(&self, samples: &[f32]) {
        let strategy = {
            let guard = self.strategy.read().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        let Some(strategy) = strategy else {
            self.emit(AssistantEvent::Error {
                message: "no recognition strategy selected".into(),
            });
            return;
        };

        match strategy.recognize(samples) {
            Err(failure) => {
                warn!(
                    strategy = strategy.name(),
                    message = %failure.message,
                    total_ms = failure.timing.total_ms,
                    "recognition failed"
                );
                match failure.raw_transcript {
                    Some(transcript) if !transcript.is_empty() => {
                        self.emit(AssistantEvent::Unrecognized { transcript });
                    }
                    _ => {
                        self.emit(AssistantEvent::Error {
                            message: failure.message,
                        });
                    }
                }
            }

            Ok(recognized) => {
                info!(
                    command = %recognized.command_name,
                    confidence = recognized.confidence,
                    transcript = %recognized.raw_transcript,
                    asr_ms = recognized.timing.asr_ms,
                    nlu_ms = recognized.timing.nlu_ms,
                    "command recognized"
                );

                let mut context =
                    CommandContext::new(recognized.raw_transcript, recognized.confidence);
                for (name, value) in recognized.params {
                    context.set_param(name, ParamValue::new(value));
                }

                let result = self
                    .dispatcher
                    .dispatch(&recognized.command_name, &mut context);

                self.emit(AssistantEvent::CommandExecuted {
                    name: recognized.command_name,
                    result,
                    context,
                });
            }
        }
    }
}

/// Orchestrator for the full voice command pipeline.
///
/// Owns the registry, dispatcher, VAD, and selected strategy; the audio
/// capture, ASR, and NLU backends are injected and shared.
pub struct VoiceAssistant {
    inner: Arc<Inner>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceAssistant {
    /// Create an assistant over the injected backends.
    ///
    /// Commands are registered through [`registry()`](Self::registry) after
    /// this and before [`start()`](Self::start); unregistration is allowed
    /// while running.
    pub fn new(
        config: AssistantConfig,
        asr: Arc<dyn AsrEngine>,
        nlu: Option<Arc<dyn NluEngine>>,
        capture: Arc<dyn AudioCapture>,
    ) -> VoxResult<Self> {
        if !asr.is_initialized() {
            return Err(VoxError::BackendUnavailable(
                "ASR engine is not initialized".into(),
            ));
        }

        let registry = Arc::new(CommandRegistry::new());
        let vad = EnergyVad::new(config.vad);
        let force_nlu = AtomicBool::new(config.force_nlu_strategy);

        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher: CommandDispatcher::new(Arc::clone(&registry)),
                registry,
                capture,
                asr,
                nlu,
                vad,
                force_nlu,
                config,
                strategy: RwLock::new(None),
                queue: Mutex::new(VecDeque::new()),
                queue_cv: Condvar::new(),
                running: AtomicBool::new(false),
                state: AtomicU8::new(STATE_IDLE),
                capture_start: Mutex::new(None),
                wake_timeout_start: Mutex::new(None),
                callback: Mutex::new(None),
            }),
            ticker: Mutex::new(None),
            consumer: Mutex::new(None),
        })
    }

    /// The command registry, for registering and unregistering commands
    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.inner.registry)
    }

    /// Register the host callback receiving all [`AssistantEvent`]s
    pub fn on_event<F>(&self, callback: F)
    where
        F: Fn(&AssistantEvent) + Send + Sync + 'static,
    {
        *self
            .inner
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(callback));
    }

    /// Start listening: selects the strategy, starts capture, and spawns
    /// the ticker and consumer threads.
    pub fn start(&self) -> VoxResult<()> {
        if self.inner.running.load(Ordering::Acquire) {
            return Err(VoxError::AlreadyRunning);
        }
        if self.inner.config.listening_mode == ListeningMode::WakeWord
            && self.inner.config.wake_word.trim().is_empty()
        {
            return Err(VoxError::MissingWakeWord);
        }

        self.inner.select_strategy();
        self.inner.capture.start()?;
        self.inner.running.store(true, Ordering::Release);

        let initial = match self.inner.config.listening_mode {
            ListeningMode::PushToTalk => ListeningState::Idle,
            _ => ListeningState::Listening,
        };
        self.inner.set_state(initial);

        let poll = Duration::from_millis(self.inner.config.poll_interval_ms);
        let ticker_inner = Arc::clone(&self.inner);
        let ticker = std::thread::Builder::new()
            .name("voxkit-ticker".into())
            .spawn(move || {
                while ticker_inner.running.load(Ordering::Acquire) {
                    ticker_inner.tick();
                    std::thread::sleep(poll);
                }
            })
            .map_err(|e| VoxError::Other(anyhow::anyhow!("ticker spawn failed: {e}")))?;

        let consumer_inner = Arc::clone(&self.inner);
        let consumer = std::thread::Builder::new()
            .name("voxkit-consumer".into())
            .spawn(move || consumer_inner.consumer_loop())
            .map_err(|e| VoxError::Other(anyhow::anyhow!("consumer spawn failed: {e}")))?;

        *self.ticker.lock().unwrap_or_else(|e| e.into_inner()) = Some(ticker);
        *self.consumer.lock().unwrap_or_else(|e| e.into_inner()) = Some(consumer);

        info!(
            mode = ?self.inner.config.listening_mode,
            "voice assistant started"
        );
        Ok(())
    }

    /// Stop listening. Joins both threads, stops capture, and discards any
    /// utterances still queued; no events are emitted after this returns.
    pub fn stop(&self) {
        if !self.inner.running.load(Ordering::Acquire) {
            return;
        }

        // Flip the flag under the queue lock so the consumer cannot miss
        // the wakeup between its check and its wait.
        {
            let _queue = self.inner.queue.lock().unwrap_or_else(|e| e.into_inner());
            self.inner.running.store(false, Ordering::Release);
            self.inner.queue_cv.notify_all();
        }

        if let Some(handle) = self.ticker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = handle.join();
        }
        if let Some(handle) = self
            .consumer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            let _ = handle.join();
        }

        if let Err(e) = self.inner.capture.stop() {
            warn!("audio capture stop failed: {e}");
        }

        let discarded = {
            let mut queue = self.inner.queue.lock().unwrap_or_else(|e| e.into_inner());
            let n = queue.len();
            queue.clear();
            n
        };
        if discarded > 0 {
            debug!(discarded, "discarded queued utterances on stop");
        }

        info!("voice assistant stopped");
    }

    /// Stop and release the capture device
    pub fn shutdown(&self) {
        self.stop();
        self.inner.capture.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn listening_state(&self) -> ListeningState {
        self.inner.listening_state()
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.inner.config
    }

    /// Force (or unforce) the NLU strategy; reselects immediately when
    /// running
    pub fn set_force_nlu(&self, use_nlu: bool) {
        self.inner.force_nlu.store(use_nlu, Ordering::Release);
        if self.is_running() {
            self.inner.select_strategy();
        }
    }

    /// Begin push-to-talk capture. Only valid while running in
    /// `PushToTalk` mode from the `Idle` state; returns false otherwise
    /// with no side effects.
    pub fn start_capture(&self) -> bool {
        if !self.is_running()
            || self.inner.config.listening_mode != ListeningMode::PushToTalk
        {
            return false;
        }
        if !self
            .inner
            .transition(ListeningState::Idle, ListeningState::Capturing)
        {
            return false;
        }

        self.inner.capture.clear_buffer();
        *self
            .inner
            .capture_start
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        self.inner.emit(AssistantEvent::CaptureStarted);
        true
    }

    /// End push-to-talk capture and queue the captured audio. Only valid
    /// from the `Capturing` state; returns false otherwise with no side
    /// effects.
    pub fn stop_capture(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        if !self
            .inner
            .transition(ListeningState::Capturing, ListeningState::Idle)
        {
            return false;
        }

        let elapsed_ms = {
            let mut started = self
                .inner
                .capture_start
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            started
                .take()
                .map(|t| t.elapsed().as_millis() as u32)
                .unwrap_or(0)
        };

        let samples = self.inner.capture.get_audio(Some(elapsed_ms.max(1)));
        self.inner.enqueue(samples);
        self.inner.capture.clear_buffer();
        self.inner.emit(AssistantEvent::CaptureEnded);
        true
    }
}

impl Drop for VoiceAssistant {
    fn drop(&mut self) {
        self.stop();
    }
}

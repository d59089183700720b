//! cpal microphone capture
//!
//! Feeds a mutex-protected rolling buffer from the cpal input callback,
//! mono-mixing whatever channel count and sample format the device offers.
//!
//! `cpal::Stream` is not `Send` on most platforms, so a dedicated worker
//! thread owns the stream for its whole lifetime; [`CpalCapture`] itself
//! only holds shared state and stays `Send + Sync` for the pipeline.

use super::{AudioCapture, AudioCaptureConfig};
use crate::error::{VoxError, VoxResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

struct Shared {
    buffer: Mutex<VecDeque<f32>>,
    running: AtomicBool,
    sample_rate: AtomicU32,
}

struct Worker {
    exit_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Microphone capture backed by cpal
pub struct CpalCapture {
    config: AudioCaptureConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl CpalCapture {
    /// Create a capture for the configured device. The device is opened
    /// lazily on the first `start()`.
    pub fn new(config: AudioCaptureConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer: Mutex::new(VecDeque::new()),
                running: AtomicBool::new(false),
                sample_rate: AtomicU32::new(config.sample_rate_hz),
            }),
            config,
            worker: Mutex::new(None),
        }
    }

    fn spawn_worker(&self) -> VoxResult<()> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<VoxResult<u32>>(1);
        let (exit_tx, exit_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();

        let handle = std::thread::Builder::new()
            .name("voxkit-capture".into())
            .spawn(move || {
                let stream = match open_stream(&config, &shared) {
                    Ok((stream, rate)) => {
                        shared.sample_rate.store(rate, Ordering::Relaxed);
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Park until shutdown; the stream must be dropped on this
                // thread.
                let _ = exit_rx.recv();
                drop(stream);
            })
            .map_err(|e| VoxError::Capture(format!("capture thread spawn failed: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(rate)) => {
                info!(sample_rate = rate, "audio capture stream opened");
                *self.worker.lock().unwrap_or_else(|e| e.into_inner()) =
                    Some(Worker { exit_tx, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(VoxError::Capture("capture thread exited during init".into()))
            }
        }
    }
}

impl AudioCapture for CpalCapture {
    fn start(&self) -> VoxResult<()> {
        {
            let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
            if worker.is_some() {
                // Device already open: just resume the callback
                self.shared.running.store(true, Ordering::Relaxed);
                return Ok(());
            }
        }

        self.spawn_worker()?;
        self.shared.running.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&self) -> VoxResult<()> {
        self.shared.running.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Relaxed)
    }

    fn get_audio(&self, duration_ms: Option<u32>) -> Vec<f32> {
        let buffer = self.shared.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let wanted = match duration_ms {
            Some(ms) => {
                let rate = self.shared.sample_rate.load(Ordering::Relaxed) as usize;
                (rate * ms as usize / 1000).min(buffer.len())
            }
            None => buffer.len(),
        };
        buffer.iter().skip(buffer.len() - wanted).copied().collect()
    }

    fn clear_buffer(&self) {
        self.shared
            .buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn sample_rate(&self) -> u32 {
        self.shared.sample_rate.load(Ordering::Relaxed)
    }

    fn buffer_duration_ms(&self) -> u32 {
        self.config.buffer_duration_ms
    }

    fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Relaxed);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(worker) = worker {
            let _ = worker.exit_tx.send(());
            if worker.handle.join().is_err() {
                warn!("capture worker thread panicked during shutdown");
            }
        }
        self.clear_buffer();
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn open_stream(
    config: &AudioCaptureConfig,
    shared: &Arc<Shared>,
) -> VoxResult<(cpal::Stream, u32)> {
    let host = cpal::default_host();

    let mut selected = None;
    if let Some(preferred) = &config.device_name {
        match host.input_devices() {
            Ok(mut devices) => {
                selected = devices.find(|d| d.name().map(|n| &n == preferred).unwrap_or(false));
                if selected.is_none() {
                    warn!(device = %preferred, "preferred input device not found, falling back");
                }
            }
            Err(e) => warn!("failed to enumerate input devices: {e}"),
        }
    }

    let device = match selected.or_else(|| host.default_input_device()) {
        Some(d) => d,
        None => return Err(VoxError::Capture("no input device available".into())),
    };

    info!(
        device = device.name().unwrap_or_default().as_str(),
        "opening input device"
    );

    let supported = device
        .default_input_config()
        .map_err(|e| VoxError::Capture(e.to_string()))?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let capacity = sample_rate as usize * config.buffer_duration_ms as usize / 1000;

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => {
            build_input::<f32>(&device, &stream_config, Arc::clone(shared), capacity)
        }
        cpal::SampleFormat::I16 => {
            build_input::<i16>(&device, &stream_config, Arc::clone(shared), capacity)
        }
        cpal::SampleFormat::U16 => {
            build_input::<u16>(&device, &stream_config, Arc::clone(shared), capacity)
        }
        fmt => {
            return Err(VoxError::Capture(format!(
                "unsupported sample format: {fmt:?}"
            )))
        }
    }
    .map_err(|e| VoxError::Capture(e.to_string()))?;

    stream
        .play()
        .map_err(|e| VoxError::Capture(e.to_string()))?;

    Ok((stream, sample_rate))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: Arc<Shared>,
    capacity: usize,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut mix_buf: Vec<f32> = Vec::new();

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if !shared.running.load(Ordering::Relaxed) {
                return;
            }

            mix_buf.clear();
            for frame in data.chunks(channels.max(1)) {
                let sum: f32 = frame.iter().map(|s| f32::from_sample(*s)).sum();
                mix_buf.push(sum / frame.len() as f32);
            }

            let mut buffer = shared.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.extend(mix_buf.iter().copied());
            let excess = buffer.len().saturating_sub(capacity);
            if excess > 0 {
                buffer.drain(..excess);
            }
        },
        |err| error!("audio stream error: {err}"),
        None,
    )
}

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::{CaptureConfiguration, MAX_GAIN_SHIFT};
use crate::models::diagnostics::CaptureDiagnostics;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::clip::Clip;
use crate::processing::clip_queue::ClipQueue;
use crate::processing::gain;
use crate::recording::sound::Sound;
use crate::traits::sample_source::SampleSource;

/// Stack reserved for the capture thread.
pub const CAPTURE_STACK_SIZE: usize = 256 * 1024;

/// Body handed to the thread spawner. Yields the source back when it exits.
type CaptureBody<S> = Box<dyn FnOnce() -> Option<S> + Send + 'static>;

/// Real-time capture orchestrator.
///
/// Runs the capture loop on a dedicated thread and hands completed clips to
/// the caller through a bounded `ClipQueue`:
/// ```text
/// [SampleSource] → gain → [current Clip] → full? → [ClipQueue] → receive_clip / drain_into
///                                                      ↓ full past timeout
///                                                    dropped
/// ```
/// The source is moved into the capture thread while running and handed back
/// when the thread is joined, so a stopped session can be started again.
pub struct CaptureSession<S: SampleSource + 'static> {
    config: CaptureConfiguration,
    source: Option<S>,
    queue: ClipQueue,
    state: CaptureState,

    // Shared with the capture thread
    running: Arc<AtomicBool>,
    gain_shift: Arc<AtomicU32>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,

    capture_handle: Option<thread::JoinHandle<Option<S>>>,
}

impl<S: SampleSource + 'static> CaptureSession<S> {
    pub fn new(config: CaptureConfiguration, source: S) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self {
            queue: ClipQueue::new(config.queue_depth),
            gain_shift: Arc::new(AtomicU32::new(config.gain_shift)),
            config,
            source: Some(source),
            state: CaptureState::Stopped,
            running: Arc::new(AtomicBool::new(false)),
            diagnostics: Arc::new(Mutex::new(CaptureDiagnostics::default())),
            capture_handle: None,
        })
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn gain_shift(&self) -> u32 {
        self.gain_shift.load(Ordering::Relaxed)
    }

    /// Change the gain; a running capture picks it up on its next read.
    pub fn set_gain_shift(&self, shift: u32) -> Result<(), CaptureError> {
        if shift > MAX_GAIN_SHIFT {
            return Err(CaptureError::InvalidArgument(format!(
                "gain shift {} exceeds {}",
                shift, MAX_GAIN_SHIFT
            )));
        }
        self.gain_shift.store(shift, Ordering::Relaxed);
        Ok(())
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.diagnostics.lock().clone()
    }

    /// Consumer handle onto the clip queue.
    pub fn queue(&self) -> &ClipQueue {
        &self.queue
    }

    /// An empty sound sharing this session's rate and clip size.
    pub fn new_sound(&self) -> Sound {
        Sound::with_config(&self.config)
    }

    /// Configure the source and start the capture thread. Transitions: stopped → running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.start_with(|body| {
            thread::Builder::new()
                .name("clip-capture".into())
                .stack_size(CAPTURE_STACK_SIZE)
                .spawn(body)
        })
    }

    fn start_with<F>(&mut self, spawn: F) -> Result<(), CaptureError>
    where
        F: FnOnce(CaptureBody<S>) -> io::Result<thread::JoinHandle<Option<S>>>,
    {
        if self.state.is_running() {
            return Err(CaptureError::AlreadyRunning);
        }

        let mut source = self
            .source
            .take()
            .ok_or_else(|| CaptureError::DriverError("sample source was lost by a previous capture".into()))?;

        if let Err(e) = source.configure(self.config.sample_rate) {
            self.source = Some(source);
            return Err(match e {
                CaptureError::DriverError(_) => e,
                other => CaptureError::DriverError(other.to_string()),
            });
        }

        self.running.store(true, Ordering::SeqCst);

        let worker = CaptureWorker {
            config: self.config.clone(),
            queue: self.queue.clone(),
            running: Arc::clone(&self.running),
            gain_shift: Arc::clone(&self.gain_shift),
            diagnostics: Arc::clone(&self.diagnostics),
        };

        // The thread takes the source out of the slot; a failed spawn leaves it here.
        let slot = Arc::new(Mutex::new(Some(source)));
        let handoff = Arc::clone(&slot);
        let body: CaptureBody<S> = Box::new(move || {
            let source = handoff.lock().take()?;
            Some(worker.run(source))
        });

        let handle = match spawn(body) {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.source = slot.lock().take();
                return Err(CaptureError::DriverError(format!(
                    "failed to spawn capture thread: {}",
                    e
                )));
            }
        };

        self.capture_handle = Some(handle);
        self.state = CaptureState::Running;
        log::info!(
            "Capture started at {} Hz, {} samples per clip",
            self.config.sample_rate,
            self.config.clip_size
        );
        Ok(())
    }

    /// Signal the capture thread and wait for it to exit. Transitions: running → stopped.
    ///
    /// The clip under construction is discarded. Returns the diagnostics as
    /// of the stop; stopping a stopped session does nothing else.
    pub fn stop(&mut self) -> CaptureDiagnostics {
        if self.state.is_stopped() {
            return self.diagnostics();
        }

        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            match handle.join() {
                Ok(source) => self.source = source,
                Err(_) => log::error!("Capture thread panicked, sample source lost"),
            }
        }
        self.state = CaptureState::Stopped;

        let diagnostics = self.diagnostics();
        log::info!(
            "Capture stopped: {} clips dispatched, {} dropped, {} read errors",
            diagnostics.clips_dispatched,
            diagnostics.clips_dropped,
            diagnostics.read_errors
        );
        diagnostics
    }

    /// Take the next completed clip without blocking.
    pub fn receive_clip(&self) -> Option<Clip> {
        self.queue.try_receive(Duration::ZERO)
    }

    pub fn receive_clip_timeout(&self, timeout: Duration) -> Option<Clip> {
        self.queue.try_receive(timeout)
    }

    /// Move every clip that is ready into `sound`. Returns how many were moved.
    pub fn drain_into(&self, sound: &mut Sound) -> Result<usize, CaptureError> {
        let mut moved = 0;
        while let Some(clip) = self.receive_clip() {
            sound.append_clip(clip)?;
            moved += 1;
        }
        Ok(moved)
    }

    /// Stop if needed and give back the sample source.
    pub fn into_source(mut self) -> Option<S> {
        self.stop();
        self.source.take()
    }
}

impl<S: SampleSource + 'static> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if self.state.is_running() {
            self.stop();
        }
    }
}

/// State owned by the capture thread.
struct CaptureWorker {
    config: CaptureConfiguration,
    queue: ClipQueue,
    running: Arc<AtomicBool>,
    gain_shift: Arc<AtomicU32>,
    diagnostics: Arc<Mutex<CaptureDiagnostics>>,
}

impl CaptureWorker {
    /// Capture loop. The stop flag is checked once per iteration, so stopping
    /// takes at most one read timeout plus one send timeout.
    fn run<S: SampleSource>(self, mut source: S) -> S {
        let mut raw = vec![0i16; self.config.chunk_size];
        let mut clip = Clip::new(self.config.clip_size);
        let read_timeout = self.config.read_timeout();
        let tick = self.config.tick();

        while self.running.load(Ordering::SeqCst) {
            match source.read_samples(&mut raw, read_timeout) {
                Ok(0) => self.record_read_error("no samples within timeout"),
                Err(e) => self.record_read_error(&e.to_string()),
                Ok(read) => {
                    let read = read.min(raw.len());
                    let partial = read < raw.len();
                    if partial {
                        log::debug!("Partial read: {} of {} samples", read, raw.len());
                    }
                    {
                        let mut d = self.diagnostics.lock();
                        d.samples_captured += read as u64;
                        if partial {
                            d.partial_reads += 1;
                        }
                    }

                    let chunk = &mut raw[..read];
                    gain::apply_gain(chunk, self.gain_shift.load(Ordering::Relaxed));
                    if let Err(e) = self.buffer_chunk(&mut clip, chunk) {
                        log::error!("Failed to buffer samples: {}", e);
                    }
                }
            }

            if !tick.is_zero() {
                thread::sleep(tick);
            }
        }

        if !clip.is_empty() {
            log::info!("Discarding partial clip of {} samples", clip.len());
            self.diagnostics.lock().samples_discarded += clip.len() as u64;
        }
        source
    }

    /// Spread `chunk` over the current clip and as many fresh clips as it
    /// takes, dispatching each one as it fills.
    fn buffer_chunk(&self, clip: &mut Clip, mut chunk: &[i16]) -> Result<(), CaptureError> {
        while !chunk.is_empty() {
            let count = clip.remaining().min(chunk.len());
            if count > 0 {
                clip.append(&chunk[..count])?;
                chunk = &chunk[count..];
            }
            if clip.is_full() {
                let full = std::mem::replace(clip, Clip::new(self.config.clip_size));
                self.dispatch(full);
            }
        }
        Ok(())
    }

    fn dispatch(&self, clip: Clip) {
        let len = clip.len();
        let sent = self.queue.try_send(clip, self.config.send_timeout());

        let mut d = self.diagnostics.lock();
        if sent {
            d.clips_dispatched += 1;
            d.queue_high_water = d.queue_high_water.max(self.queue.len());
            log::debug!("Queued clip of {} samples", len);
        } else {
            d.clips_dropped += 1;
        }
    }

    fn record_read_error(&self, detail: &str) {
        log::error!("Error in sample read: {}", detail);
        self.diagnostics.lock().read_errors += 1;
    }
}

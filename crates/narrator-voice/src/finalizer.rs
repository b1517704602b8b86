//! Utterance finalisation on top of a streaming recogniser.
//!
//! Two modes share one [`RecognitionPort`]:
//!
//! - **Single capture** waits for the first non-empty final result, bounded by
//!   a timeout. Voice commands use this.
//! - **Continuous dictation** keeps listening, commits finals (and interims
//!   after a silence window) into a running transcript and restarts the engine
//!   when it stops on its own.
//!
//! Only one capture is active at a time; starting another supersedes it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use narrator_core::{
    NarrationSettings, RecognitionEvent, RecognitionOptions, RecognitionPort, RecognitionStream,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::VoiceError;
use crate::transcript::TranscriptBuffer;

/// Timing and language for recognition runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizerConfig {
    pub language: String,
    /// Upper bound on a single capture.
    pub capture_timeout: Duration,
    /// Silence after which dictation commits pending interim text.
    pub silence_window: Duration,
    /// Consecutive restarts without a result before dictation gives up.
    pub max_restarts: u32,
    /// Back-off unit between restarts after an engine error.
    pub restart_backoff: Duration,
    /// Wall time after which the dictation transcript is reset.
    pub max_session: Duration,
}

impl Default for FinalizerConfig {
    fn default() -> Self {
        Self::from(&NarrationSettings::default())
    }
}

impl From<&NarrationSettings> for FinalizerConfig {
    fn from(settings: &NarrationSettings) -> Self {
        Self {
            language: settings.language.clone(),
            capture_timeout: settings.capture_timeout(),
            silence_window: settings.silence_window(),
            max_restarts: settings.max_dictation_restarts,
            restart_backoff: Duration::from_millis(300),
            max_session: settings.max_dictation_session(),
        }
    }
}

/// How a single capture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A non-empty final transcript.
    Utterance(String),
    /// Nothing final arrived before the timeout.
    TimedOut,
    /// The engine stopped without a final result.
    Ended,
    /// The capture was stopped or superseded.
    Cancelled,
}

/// A running single capture.
#[derive(Debug)]
pub struct PendingCapture {
    rx: oneshot::Receiver<Result<CaptureOutcome, VoiceError>>,
}

impl PendingCapture {
    /// Wait for the capture to finish.
    pub async fn wait(self) -> Result<CaptureOutcome, VoiceError> {
        self.rx.await.unwrap_or(Ok(CaptureOutcome::Cancelled))
    }
}

/// Events produced by continuous dictation.
#[derive(Debug, Clone, PartialEq)]
pub enum DictationEvent {
    /// Preview of the transcript including the current interim text.
    Interim { text: String },
    /// A committed utterance and the transcript so far.
    Final { utterance: String, transcript: String },
    /// Dictation stopped because of an unrecoverable error.
    Failed(VoiceError),
}

/// Receiver for a dictation session. Ends when dictation stops.
#[derive(Debug)]
pub struct DictationStream {
    rx: mpsc::UnboundedReceiver<DictationEvent>,
}

impl DictationStream {
    pub async fn next(&mut self) -> Option<DictationEvent> {
        self.rx.recv().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureMode {
    Single,
    Dictation,
}

impl CaptureMode {
    /// `(interim_results, continuous)` for the engine.
    const fn flags(self) -> (bool, bool) {
        match self {
            Self::Single => (false, false),
            Self::Dictation => (true, true),
        }
    }
}

#[derive(Debug)]
struct ActiveCapture {
    id: u64,
    mode: CaptureMode,
    listener: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct FinalizerState {
    next_id: u64,
    active: Option<ActiveCapture>,
}

/// Turns a raw recognition stream into finished utterances.
#[derive(Clone)]
pub struct UtteranceFinalizer {
    port: Arc<dyn RecognitionPort>,
    config: FinalizerConfig,
    state: Arc<Mutex<FinalizerState>>,
}

impl UtteranceFinalizer {
    pub fn new(port: Arc<dyn RecognitionPort>, config: FinalizerConfig) -> Self {
        Self {
            port,
            config,
            state: Arc::new(Mutex::new(FinalizerState::default())),
        }
    }

    pub const fn config(&self) -> &FinalizerConfig {
        &self.config
    }

    /// Whether a capture or dictation session is running.
    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Start listening for one utterance.
    ///
    /// Returns once the engine is running; await [`PendingCapture::wait`] for
    /// the result. Resolves to [`CaptureOutcome::TimedOut`] if no final
    /// result arrives within the capture timeout.
    pub async fn start_single_capture(&self) -> Result<PendingCapture, VoiceError> {
        let (id, stream) = self.open(CaptureMode::Single).await?;
        let (tx, rx) = oneshot::channel();
        let this = self.clone();
        let timeout = self.config.capture_timeout;

        let listener = tokio::spawn(async move {
            let outcome = await_final(stream, timeout).await;
            if this.finish(id) {
                this.port.stop();
            }
            if let Ok(CaptureOutcome::Utterance(ref text)) = outcome {
                debug!(utterance = %text, "Capture finalised");
            }
            let _ = tx.send(outcome);
        });
        self.attach(id, listener);
        Ok(PendingCapture { rx })
    }

    /// Start continuous dictation.
    ///
    /// The engine is restarted whenever it ends on its own; after
    /// `max_restarts` consecutive restarts without a result, or an engine that
    /// refuses to start, a [`DictationEvent::Failed`] is sent and the stream
    /// closes.
    pub async fn start_continuous_dictation(&self) -> Result<DictationStream, VoiceError> {
        let (id, stream) = self.open(CaptureMode::Dictation).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let this = self.clone();

        let listener = tokio::spawn(async move {
            this.run_dictation(id, stream, tx).await;
            if this.finish(id) {
                this.port.stop();
            }
        });
        self.attach(id, listener);
        info!(language = %self.config.language, "Dictation started");
        Ok(DictationStream { rx })
    }

    /// Stop the active session, finalising what the engine heard.
    pub fn stop(&self) {
        if self.take_active() {
            self.port.stop();
        }
    }

    /// Stop the active session and discard what the engine heard.
    pub fn abort(&self) {
        if self.take_active() {
            self.port.abort();
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, FinalizerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn options(&self, mode: CaptureMode) -> RecognitionOptions {
        let (interim_results, continuous) = mode.flags();
        RecognitionOptions {
            language: self.config.language.clone(),
            interim_results,
            continuous,
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.lock().active.as_ref().is_some_and(|a| a.id == id)
    }

    /// Supersede any active session, then ask for permission and start.
    async fn open(&self, mode: CaptureMode) -> Result<(u64, RecognitionStream), VoiceError> {
        let id = {
            let mut state = self.lock();
            if let Some(previous) = state.active.take() {
                debug!(id = previous.id, mode = ?previous.mode, "Superseding active capture");
                if let Some(listener) = previous.listener {
                    listener.abort();
                }
                self.port.abort();
            }
            state.next_id += 1;
            let id = state.next_id;
            state.active = Some(ActiveCapture {
                id,
                mode,
                listener: None,
            });
            id
        };

        let granted = match self.port.request_permission().await {
            Ok(granted) => granted,
            Err(err) => {
                self.finish(id);
                return Err(err.into());
            }
        };
        if !granted {
            self.finish(id);
            warn!("Recognition permission denied");
            return Err(VoiceError::PermissionDenied);
        }
        if !self.is_current(id) {
            return Err(VoiceError::Cancelled);
        }

        let stream = match self.port.start(self.options(mode)).await {
            Ok(stream) => stream,
            Err(err) => {
                self.finish(id);
                warn!(error = %err, "Recognition failed to start");
                return Err(err.into());
            }
        };
        if !self.is_current(id) {
            // Stopped while the engine was starting. A newer capture owns
            // the port if it holds the slot.
            if self.lock().active.is_none() {
                debug!(id, "Capture stopped during engine start, aborting run");
                self.port.abort();
            }
            return Err(VoiceError::Cancelled);
        }
        debug!(id, mode = ?mode, "Recognition started");
        Ok((id, stream))
    }

    fn attach(&self, id: u64, listener: JoinHandle<()>) {
        let mut state = self.lock();
        match state.active.as_mut() {
            Some(active) if active.id == id => active.listener = Some(listener),
            _ => listener.abort(),
        }
    }

    /// Clear the active slot if it still belongs to `id`.
    fn finish(&self, id: u64) -> bool {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|a| a.id == id) {
            state.active = None;
            true
        } else {
            false
        }
    }

    fn take_active(&self) -> bool {
        let Some(active) = self.lock().active.take() else {
            return false;
        };
        debug!(id = active.id, "Stopping capture");
        if let Some(listener) = active.listener {
            listener.abort();
        }
        true
    }

    async fn run_dictation(
        &self,
        id: u64,
        mut stream: RecognitionStream,
        tx: mpsc::UnboundedSender<DictationEvent>,
    ) {
        let mut buffer = TranscriptBuffer::new();
        let mut session_start = Instant::now();
        let mut restarts = 0_u32;

        loop {
            let silence = tokio::time::sleep(self.config.silence_window);
            let event = tokio::select! {
                () = silence, if buffer.has_interim() => {
                    trace!("Silence window elapsed, committing interim text");
                    if let Some(committed) = buffer.commit_interim() {
                        let _ = tx.send(DictationEvent::Final {
                            utterance: committed.utterance,
                            transcript: committed.transcript,
                        });
                    }
                    continue;
                }
                event = stream.recv() => event,
            };

            let after_error = match event {
                Some(RecognitionEvent::Result {
                    transcript,
                    is_final,
                }) => {
                    restarts = 0;
                    let sent = if is_final {
                        buffer.commit(&transcript).map_or(Ok(()), |committed| {
                            tx.send(DictationEvent::Final {
                                utterance: committed.utterance,
                                transcript: committed.transcript,
                            })
                        })
                    } else {
                        tx.send(DictationEvent::Interim {
                            text: buffer.set_interim(&transcript),
                        })
                    };
                    if sent.is_err() {
                        debug!("Dictation consumer dropped");
                        return;
                    }
                    continue;
                }
                Some(RecognitionEvent::Error(message)) => {
                    warn!(error = %message, "Recognition error during dictation");
                    self.port.abort();
                    true
                }
                Some(RecognitionEvent::End) | None => {
                    if let Some(committed) = buffer.commit_interim() {
                        let _ = tx.send(DictationEvent::Final {
                            utterance: committed.utterance,
                            transcript: committed.transcript,
                        });
                    }
                    false
                }
            };

            if session_start.elapsed() >= self.config.max_session {
                info!("Dictation session reached its maximum length, resetting transcript");
                buffer.reset();
                session_start = Instant::now();
            }

            match self.restart(id, &mut restarts, after_error).await {
                Ok(next) => stream = next,
                Err(VoiceError::Cancelled) => return,
                Err(err) => {
                    warn!(error = %err, "Dictation stopped");
                    let _ = tx.send(DictationEvent::Failed(err));
                    return;
                }
            }
        }
    }

    async fn restart(
        &self,
        id: u64,
        restarts: &mut u32,
        after_error: bool,
    ) -> Result<RecognitionStream, VoiceError> {
        if *restarts >= self.config.max_restarts {
            return Err(VoiceError::RecognitionFailure(format!(
                "engine stopped {restarts} times in a row without a result"
            )));
        }
        *restarts += 1;
        if after_error {
            tokio::time::sleep(self.config.restart_backoff * *restarts).await;
        }
        if !self.is_current(id) {
            return Err(VoiceError::Cancelled);
        }
        debug!(attempt = *restarts, "Restarting recognition");
        Ok(self.port.start(self.options(CaptureMode::Dictation)).await?)
    }
}

async fn await_final(
    mut stream: RecognitionStream,
    timeout: Duration,
) -> Result<CaptureOutcome, VoiceError> {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => {
                debug!(timeout_ms = timeout.as_millis(), "Capture timed out");
                return Ok(CaptureOutcome::TimedOut);
            }
            event = stream.recv() => match event {
                Some(RecognitionEvent::Result { transcript, is_final: true }) => {
                    let text = transcript.trim();
                    if !text.is_empty() {
                        return Ok(CaptureOutcome::Utterance(text.to_string()));
                    }
                }
                Some(RecognitionEvent::Result { .. }) => {}
                Some(RecognitionEvent::Error(message)) => {
                    warn!(error = %message, "Recognition error during capture");
                    return Err(VoiceError::RecognitionFailure(message));
                }
                Some(RecognitionEvent::End) | None => return Ok(CaptureOutcome::Ended),
            }
        }
    }
}

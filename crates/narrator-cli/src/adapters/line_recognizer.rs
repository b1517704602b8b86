//! A recogniser that treats each line typed on the terminal as one final
//! utterance.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use narrator_core::{
    RecognitionError, RecognitionEvent, RecognitionOptions, RecognitionPort, RecognitionStream,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[derive(Default)]
struct LineState {
    active: Option<mpsc::UnboundedSender<RecognitionEvent>>,
    buffered: VecDeque<String>,
}

/// Line-oriented stand-in for a speech recognition engine.
///
/// Lines that arrive while no run is active are buffered and delivered to
/// the next run; the wake channel returned by [`spawn`](Self::spawn) fires
/// for each of them so the caller can start one.
#[derive(Default)]
pub struct LineRecognizer {
    state: Mutex<LineState>,
}

impl LineRecognizer {
    /// Start reading lines from `input` in a background task.
    ///
    /// The wake channel closes once `input` reaches end of file.
    pub fn spawn<R>(input: R) -> (Arc<Self>, mpsc::UnboundedReceiver<()>)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let recognizer = Arc::new(Self::default());
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();

        let reader = Arc::clone(&recognizer);
        tokio::spawn(async move {
            let mut lines = input.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if !reader.deliver(line) && wake_tx.send(()).is_err() {
                    break;
                }
            }
            debug!("Command input closed");
        });

        (recognizer, wake_rx)
    }

    /// Hand `line` to the active run, or buffer it. Returns whether a run took it.
    fn deliver(&self, line: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = &state.active {
            if tx.send(RecognitionEvent::final_result(line)).is_ok() {
                trace!(line, "Delivered to active run");
                return true;
            }
            state.active = None;
        }
        state.buffered.push_back(line.to_string());
        false
    }

    fn end_run(&self, discard: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active = None;
        if discard {
            state.buffered.clear();
        }
    }
}

#[async_trait]
impl RecognitionPort for LineRecognizer {
    async fn request_permission(&self) -> Result<bool, RecognitionError> {
        Ok(true)
    }

    async fn start(&self, options: RecognitionOptions) -> Result<RecognitionStream, RecognitionError> {
        debug!(language = %options.language, continuous = options.continuous, "Listening for typed commands");
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A single capture only takes one line; leave the rest for later runs.
        let pending = state.buffered.len();
        let take = if options.continuous { pending } else { pending.min(1) };
        for line in state.buffered.drain(..take) {
            // The receiver is still in hand, so this cannot fail.
            let _ = tx.send(RecognitionEvent::final_result(line));
        }
        state.active = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.end_run(false);
    }

    fn abort(&self) {
        self.end_run(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RecognitionOptions {
        RecognitionOptions {
            language: "ko-KR".into(),
            interim_results: false,
            continuous: false,
        }
    }

    #[tokio::test]
    async fn buffered_lines_reach_the_next_run() {
        let (recognizer, mut wake) = LineRecognizer::spawn(&b"  \n next \n"[..]);
        assert_eq!(wake.recv().await, Some(()));
        assert_eq!(wake.recv().await, None);

        let mut stream = recognizer.start(options()).await.unwrap();
        assert_eq!(stream.recv().await, Some(RecognitionEvent::final_result("next")));

        recognizer.stop();
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn abort_discards_buffered_lines() {
        let recognizer = LineRecognizer::default();
        assert!(!recognizer.deliver("다음"));
        recognizer.abort();

        let mut stream = recognizer.start(options()).await.unwrap();
        recognizer.stop();
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn single_capture_takes_one_buffered_line() {
        let recognizer = LineRecognizer::default();
        recognizer.deliver("다음");
        recognizer.deliver("이전");

        let mut first = recognizer.start(options()).await.unwrap();
        recognizer.stop();
        assert_eq!(first.recv().await, Some(RecognitionEvent::final_result("다음")));
        assert_eq!(first.recv().await, None);

        let mut second = recognizer.start(options()).await.unwrap();
        assert_eq!(second.recv().await, Some(RecognitionEvent::final_result("이전")));
    }

    #[tokio::test]
    async fn active_run_receives_lines_directly() {
        let recognizer = LineRecognizer::default();
        let mut stream = recognizer.start(options()).await.unwrap();
        assert!(recognizer.deliver("이전"));
        assert_eq!(stream.recv().await, Some(RecognitionEvent::final_result("이전")));
    }
}

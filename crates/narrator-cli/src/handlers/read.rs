//! Read command handler.
//!
//! Narrates a chapter file while typed lines on stdin act as voice commands
//! for the player screen.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use narrator_core::{Chapter, Intent};
use narrator_voice::{
    CommandRouter, FinalizerConfig, KeywordClassifier, ListenOutcome, PlaybackOptions,
    UtteranceFinalizer, VoiceError, player_handlers, spawn_event_bridge,
};
use tokio::io::BufReader;
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::adapters::{ConsoleEmitter, LineRecognizer};
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{describe_listen, print_separator};

const PLAYER_SCREEN: &str = "player";

/// Load and check a chapter file.
///
/// # Errors
///
/// `CliError::Io` if the file cannot be read, `CliError::Content` if it is
/// not a chapter or has no sections.
pub async fn load_chapter(path: &Path) -> Result<Chapter, CliError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    let chapter = Chapter::from_json(&raw)
        .map_err(|e| CliError::Content(format!("{}: {e}", path.display())))?;
    if chapter.is_empty() {
        return Err(CliError::Content(format!(
            "{}: chapter has no sections",
            path.display()
        )));
    }
    Ok(chapter)
}

/// Execute the read command.
///
/// Runs until the chapter finishes, narration fails, the student says
/// "go back", or Ctrl-C is pressed.
pub async fn execute(ctx: &CliContext, chapter_path: &Path, start: usize) -> Result<()> {
    let chapter = load_chapter(chapter_path).await?;
    let settings = ctx.settings();

    let (player, events) = ctx.player();
    let emitter = Arc::new(ConsoleEmitter::new());
    let bridge = spawn_event_bridge(events, emitter.clone());
    player.initialize(chapter.sections.clone(), start, PlaybackOptions::from(settings));

    let (recognizer, wake) = LineRecognizer::spawn(BufReader::new(tokio::io::stdin()));
    let finalizer = UtteranceFinalizer::new(recognizer, FinalizerConfig::from(settings));
    let classifier = Arc::new(KeywordClassifier::for_language(&settings.language));
    let router = CommandRouter::new(finalizer, classifier).with_emitter(emitter.clone());
    router.register_handlers(PLAYER_SCREEN, player_handlers(&player));
    router.set_active_screen(PLAYER_SCREEN);

    let quit = Arc::new(Notify::new());
    let leave = Arc::clone(&quit);
    router.set_global_handler(Intent::GoBack, move || leave.notify_one());

    let title = if chapter.title.is_empty() {
        chapter_path.display().to_string()
    } else {
        chapter.title.clone()
    };
    println!("{title} ({} sections, {} mode)", chapter.sections.len(), settings.play_mode);
    println!("Type a command and press Enter. Ctrl-C to quit.");
    print_separator(60);

    player.play().map_err(CliError::from)?;

    let end = drive(&router, &emitter, &quit, wake, tokio::signal::ctrl_c()).await;
    match end {
        Ok(SessionEnd::Quit) => println!("Leaving chapter."),
        Ok(SessionEnd::Interrupted) => println!(),
        Ok(SessionEnd::Finished) | Err(_) => {}
    }

    player.cleanup();
    bridge.abort();
    end?;
    Ok(())
}

/// Why a read session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Narration reached the end or failed.
    Finished,
    /// The student said "go back".
    Quit,
    /// `interrupt` resolved.
    Interrupted,
}

type ListenResult = Result<ListenOutcome, VoiceError>;

/// Route typed commands until the session ends.
///
/// Each wake-up starts a capture on its own task, so a pending capture never
/// holds up the other exits. Wake-ups that arrive mid-capture are queued.
/// Any capture still running on return is stopped.
///
/// # Errors
///
/// Returns the error `interrupt` resolved with.
pub async fn drive<F>(
    router: &CommandRouter,
    emitter: &ConsoleEmitter,
    quit: &Notify,
    mut wake: UnboundedReceiver<()>,
    interrupt: F,
) -> std::io::Result<SessionEnd>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(interrupt);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ListenResult>();
    let mut input_open = true;
    let mut capturing = false;
    let mut queued = 0_usize;

    let end = loop {
        tokio::select! {
            () = emitter.finished() => break Ok(SessionEnd::Finished),
            () = quit.notified() => break Ok(SessionEnd::Quit),
            signal = &mut interrupt => break signal.map(|()| SessionEnd::Interrupted),
            woke = wake.recv(), if input_open => {
                if woke.is_none() {
                    debug!("No more commands; narrating to the end");
                    input_open = false;
                } else if capturing {
                    queued += 1;
                } else {
                    spawn_listen(router, &done_tx);
                    capturing = true;
                }
            }
            Some(result) = done_rx.recv() => {
                report(result);
                if queued > 0 {
                    queued -= 1;
                    spawn_listen(router, &done_tx);
                } else {
                    capturing = false;
                }
            }
        }
    };

    router.stop_listening();
    end
}

fn spawn_listen(router: &CommandRouter, done: &UnboundedSender<ListenResult>) {
    let router = router.clone();
    let done = done.clone();
    tokio::spawn(async move {
        let _ = done.send(router.listen().await);
    });
}

fn report(result: ListenResult) {
    match result {
        Ok(outcome) => {
            if let Some(line) = describe_listen(&outcome) {
                println!("{line}");
            }
        }
        Err(VoiceError::AlreadyActive) => {}
        Err(e) => warn!(error = %e, "Voice command failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    fn router_for(recognizer: Arc<LineRecognizer>) -> CommandRouter {
        let finalizer = UtteranceFinalizer::new(recognizer, FinalizerConfig::default());
        CommandRouter::new(finalizer, Arc::new(KeywordClassifier::for_language("ko-KR")))
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_ends_the_session_during_a_capture() {
        let recognizer = Arc::new(LineRecognizer::default());
        let router = router_for(recognizer);
        let emitter = ConsoleEmitter::new();
        let quit = Notify::new();
        let (wake_tx, wake) = mpsc::unbounded_channel();
        wake_tx.send(()).unwrap();

        let started = Instant::now();
        let interrupt = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        };
        let end = drive(&router, &emitter, &quit, wake, interrupt).await;

        assert_eq!(tokio_test::assert_ok!(end), SessionEnd::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!router.is_listening());
    }

    #[tokio::test(start_paused = true)]
    async fn go_back_leaves_the_session() {
        let (recognizer, wake) = LineRecognizer::spawn(&"뒤로\n".as_bytes()[..]);
        let router = router_for(recognizer);
        let emitter = ConsoleEmitter::new();
        let quit = Arc::new(Notify::new());
        let leave = Arc::clone(&quit);
        router.set_global_handler(Intent::GoBack, move || leave.notify_one());

        let end = drive(&router, &emitter, &quit, wake, std::future::pending()).await;

        assert_eq!(tokio_test::assert_ok!(end), SessionEnd::Quit);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = load_chapter(Path::new("/nonexistent/chapter.json"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 74);
    }

    #[tokio::test]
    async fn empty_chapter_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "chapterId": 1, "title": "빈 장", "sections": [] }}"#).unwrap();

        let err = load_chapter(file.path()).await.unwrap_err();
        assert!(matches!(err, CliError::Content(_)));
    }

    #[tokio::test]
    async fn sections_are_loaded_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "title": "세포", "sections": [
                {{ "id": 1, "text": "세포의 구조", "type": "heading" }},
                {{ "id": 2, "text": "세포막은 얇다.", "type": "paragraph" }}
            ] }}"#
        )
        .unwrap();

        let chapter = tokio_test::assert_ok!(load_chapter(file.path()).await);
        assert_eq!(chapter.sections.len(), 2);
        assert_eq!(chapter.sections[1].text, "세포막은 얇다.");
    }
}

//! Screen-scoped voice-command routing.
//!
//! Screens register a [`ScreenHandlers`] set under their id and mark
//! themselves active while focused. A finalised utterance is resolved in
//! order: the active screen's raw-text handler, then the classified intent on
//! the active screen, then the global fallbacks. Handlers are looked up when
//! the utterance is dispatched, never when listening starts, so a screen that
//! unregisters mid-capture does not receive the result.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use narrator_core::{Intent, NarratorEvent, NarratorEventEmitter};
use tracing::{debug, info};

use crate::classifier::IntentClassifier;
use crate::error::VoiceError;
use crate::finalizer::{CaptureOutcome, UtteranceFinalizer};

pub type IntentHandler = Arc<dyn Fn() + Send + Sync>;
pub type RawTextHandler = Arc<dyn Fn(&str) -> RawTextOutcome + Send + Sync>;
pub type ListenHook = Arc<dyn Fn() + Send + Sync>;

/// Whether a raw-text handler consumed the utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTextOutcome {
    Handled,
    NotHandled,
}

/// Handlers one screen exposes to voice commands.
#[derive(Clone, Default)]
pub struct ScreenHandlers {
    intents: HashMap<Intent, IntentHandler>,
    raw_text: Option<RawTextHandler>,
    before_listen: Option<ListenHook>,
}

impl ScreenHandlers {
    /// An empty set. Registering it unregisters the screen.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(mut self, intent: Intent, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.intents.insert(intent, Arc::new(handler));
        self
    }

    /// Receive every utterance before classification.
    #[must_use]
    pub fn on_raw_text(
        mut self,
        handler: impl Fn(&str) -> RawTextOutcome + Send + Sync + 'static,
    ) -> Self {
        self.raw_text = Some(Arc::new(handler));
        self
    }

    /// Run just before a capture starts on this screen.
    #[must_use]
    pub fn before_listen(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_listen = Some(Arc::new(hook));
        self
    }

    pub fn handles(&self, intent: Intent) -> bool {
        self.intents.contains_key(&intent)
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty() && self.raw_text.is_none() && self.before_listen.is_none()
    }
}

impl fmt::Debug for ScreenHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut intents: Vec<_> = self.intents.keys().map(|i| i.as_str()).collect();
        intents.sort_unstable();
        f.debug_struct("ScreenHandlers")
            .field("intents", &intents)
            .field("raw_text", &self.raw_text.is_some())
            .field("before_listen", &self.before_listen.is_some())
            .finish()
    }
}

/// Where a dispatched intent was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerScope {
    Screen,
    Global,
}

/// Result of resolving one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The active screen's raw-text handler consumed it.
    RawText,
    /// An intent handler ran.
    Intent { intent: Intent, scope: HandlerScope },
    /// Nothing handled it. `intent` is set when it classified but no handler
    /// was registered.
    NotUnderstood { intent: Option<Intent> },
}

impl DispatchOutcome {
    pub const fn is_handled(&self) -> bool {
        !matches!(self, Self::NotUnderstood { .. })
    }
}

/// Result of [`CommandRouter::listen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Dispatched {
        utterance: String,
        outcome: DispatchOutcome,
    },
    /// The capture ended without an utterance.
    NothingHeard(CaptureOutcome),
}

#[derive(Default)]
struct Registry {
    screens: HashMap<String, ScreenHandlers>,
    active: Option<String>,
    global: HashMap<Intent, IntentHandler>,
}

impl Registry {
    fn active_handlers(&self) -> Option<&ScreenHandlers> {
        self.active.as_ref().and_then(|id| self.screens.get(id))
    }
}

/// Clears the listening flag even if the `listen` future is dropped.
struct ListeningGuard(Arc<AtomicBool>);

impl Drop for ListeningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Resolves utterances to screen handlers.
#[derive(Clone)]
pub struct CommandRouter {
    registry: Arc<RwLock<Registry>>,
    classifier: Arc<dyn IntentClassifier>,
    finalizer: UtteranceFinalizer,
    emitter: Option<Arc<dyn NarratorEventEmitter>>,
    listening: Arc<AtomicBool>,
}

impl CommandRouter {
    pub fn new(finalizer: UtteranceFinalizer, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            classifier,
            finalizer,
            emitter: None,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report dispatch results as [`NarratorEvent`]s.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn NarratorEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Store the handlers for `screen_id`, replacing any previous set.
    ///
    /// Registering [`ScreenHandlers::new`] removes the screen.
    pub fn register_handlers(&self, screen_id: impl Into<String>, handlers: ScreenHandlers) {
        let screen_id = screen_id.into();
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.is_empty() {
            debug!(screen = %screen_id, "Unregistering voice handlers");
            registry.screens.remove(&screen_id);
        } else {
            debug!(screen = %screen_id, ?handlers, "Registering voice handlers");
            registry.screens.insert(screen_id, handlers);
        }
    }

    pub fn set_active_screen(&self, screen_id: impl Into<String>) {
        let screen_id = screen_id.into();
        debug!(screen = %screen_id, "Active screen changed");
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = Some(screen_id);
    }

    pub fn active_screen(&self) -> Option<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
    }

    /// Install a handler consulted when the active screen does not handle `intent`.
    pub fn set_global_handler(&self, intent: Intent, handler: impl Fn() + Send + Sync + 'static) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .global
            .insert(intent, Arc::new(handler));
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Resolve `text` against the current registry and run the matching handler.
    pub fn dispatch(&self, text: &str) -> DispatchOutcome {
        let outcome = self.resolve(text);
        match &outcome {
            DispatchOutcome::NotUnderstood { intent } => {
                info!(utterance = %text, ?intent, "Voice command not understood");
                self.emit(NarratorEvent::CommandNotUnderstood {
                    utterance: text.to_string(),
                });
            }
            handled => {
                let intent = match handled {
                    DispatchOutcome::Intent { intent, .. } => Some(*intent),
                    _ => None,
                };
                debug!(utterance = %text, ?outcome, "Voice command dispatched");
                self.emit(NarratorEvent::CommandDispatched {
                    utterance: text.to_string(),
                    intent,
                });
            }
        }
        outcome
    }

    /// Capture one utterance and dispatch it.
    ///
    /// Runs the active screen's `before_listen` hook first. Only one capture
    /// runs at a time.
    pub async fn listen(&self) -> Result<ListenOutcome, VoiceError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            debug!("listen ignored: already capturing");
            return Err(VoiceError::AlreadyActive);
        }
        let _guard = ListeningGuard(Arc::clone(&self.listening));
        self.capture_and_dispatch().await
    }

    /// Stop an in-flight capture. Its [`listen`](Self::listen) resolves with
    /// [`CaptureOutcome::Cancelled`].
    pub fn stop_listening(&self) {
        self.finalizer.stop();
    }

    async fn capture_and_dispatch(&self) -> Result<ListenOutcome, VoiceError> {
        let hook = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry
                .active_handlers()
                .and_then(|h| h.before_listen.clone())
        };
        if let Some(hook) = hook {
            hook();
        }

        let capture = self.finalizer.start_single_capture().await?;
        match capture.wait().await? {
            CaptureOutcome::Utterance(utterance) => {
                let outcome = self.dispatch(&utterance);
                Ok(ListenOutcome::Dispatched { utterance, outcome })
            }
            other => {
                debug!(outcome = ?other, "Capture ended without an utterance");
                Ok(ListenOutcome::NothingHeard(other))
            }
        }
    }

    fn resolve(&self, text: &str) -> DispatchOutcome {
        // Clone the handlers out so none of them runs under the lock.
        let (raw_text, screen) = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            let handlers = registry.active_handlers();
            (
                handlers.and_then(|h| h.raw_text.clone()),
                handlers.map(|h| h.intents.clone()),
            )
        };

        if let Some(raw_text) = raw_text {
            if raw_text(text) == RawTextOutcome::Handled {
                return DispatchOutcome::RawText;
            }
        }

        let Some(intent) = self.classifier.classify(text) else {
            return DispatchOutcome::NotUnderstood { intent: None };
        };

        if let Some(handler) = screen.as_ref().and_then(|s| s.get(&intent)) {
            handler();
            return DispatchOutcome::Intent {
                intent,
                scope: HandlerScope::Screen,
            };
        }

        let global = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .global
            .get(&intent)
            .cloned();
        if let Some(handler) = global {
            handler();
            return DispatchOutcome::Intent {
                intent,
                scope: HandlerScope::Global,
            };
        }

        DispatchOutcome::NotUnderstood {
            intent: Some(intent),
        }
    }

    fn emit(&self, event: NarratorEvent) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(event);
        }
    }
}

//! Recording session controller
//!
//! Owns every piece of mutable session state and is driven by a single event
//! queue. Recognizer deliveries are tagged with their pass id by a forwarder
//! task and pushed onto the same queue, so transcript handling, record presses
//! and reconciliation never run concurrently. The queue closes, and `run`
//! returns, once every [`SessionHandle`] is gone.
//!
//! ```text
//!          press                 press / stop word                final / error
//!   Idle ────────▶ Recording ─────────────────────▶ Draining ─────────────────▶ Idle
//!                   │  ▲  │      (reconcile, end audio)  │ ▲
//!                   └──┘  │                              └─┘ trailing results,
//!       partial result    │ final / error                    stop words ignored
//!                         └──────────────────────────────────────────────────▶ Idle
//!                                  (reconcile + teardown)
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::classifier::{SessionLists, TranscriptClassifier};
use crate::display::{Notice, Presenter, TriggerState};
use crate::reconciler::{ProductList, ReconcilePolicy};
use crate::voice::{AudioSink, AudioSource, Recognizer, TranscriptEvent, TranscriptStream};
use crate::{Error, Result};

/// Capacity of the controller's event queue
const QUEUE_CAPACITY: usize = 64;

/// Identifier of one recognition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(u64);

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass-{}", self.0)
    }
}

/// Input to the session controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The record toggle was pressed
    RecordPressed,
    /// The recognizer delivered an update for a pass
    Transcript {
        /// Pass the update belongs to
        pass: PassId,
        /// The update
        event: TranscriptEvent,
    },
    /// The recognizer became available or unavailable
    AvailabilityChanged(bool),
    /// Stop processing events
    Shutdown,
}

/// Where the recorder is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No pass in progress
    Idle,
    /// A pass is in progress
    Recording(PassId),
    /// The pass was stopped and reconciled; the recognizer is still
    /// delivering its trailing results
    Draining(PassId),
}

/// Why a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassEnd {
    /// The record toggle was pressed
    Stopped,
    /// A stop word was recognized
    StopWord,
    /// The recognizer delivered its final result
    Finalized,
    /// The recognizer failed
    Errored(String),
    /// The controller is shutting down
    Shutdown,
}

/// Session behavior settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Reconciliation policy for the product list
    pub policy: ReconcilePolicy,
    /// Classify partial results as they arrive
    pub partial_results: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::default(),
            partial_results: true,
        }
    }
}

/// Cloneable handle for driving a running [`SessionController`]
///
/// The controller's event queue stays open for as long as any handle exists.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    products: watch::Receiver<Vec<String>>,
}

impl SessionHandle {
    /// Press the record toggle
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the controller has stopped
    pub async fn press_record(&self) -> Result<()> {
        self.send(SessionEvent::RecordPressed).await
    }

    /// Report recognizer availability
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the controller has stopped
    pub async fn set_available(&self, available: bool) -> Result<()> {
        self.send(SessionEvent::AvailabilityChanged(available)).await
    }

    /// Ask the controller to finish
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the controller has already stopped
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown).await
    }

    /// Queue an arbitrary event
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionClosed` if the controller has stopped
    pub async fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// The products currently added
    #[must_use]
    pub fn current_added_products(&self) -> Vec<String> {
        self.products.borrow().clone()
    }

    /// Receiver notified whenever the product list changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.products.clone()
    }
}

/// Drives recording passes and keeps the product list
pub struct SessionController {
    classifier: TranscriptClassifier,
    recognizer: Box<dyn Recognizer>,
    audio: Box<dyn AudioSource>,
    presenter: Box<dyn Presenter>,
    config: SessionConfig,

    products: ProductList,
    session: SessionLists,
    state: RecorderState,
    /// One-shot stop guard: set once a pass has been stopped, re-armed when
    /// the next pass starts
    cancel_called: bool,
    authorized: bool,
    available: bool,
    next_pass: u64,
    forwarder: Option<JoinHandle<()>>,

    /// Forwarders hold only weak senders so they never keep the queue open
    events_tx: mpsc::WeakSender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    products_tx: watch::Sender<Vec<String>>,
}

impl SessionController {
    /// Create a controller and the first handle to it, checking recognition
    /// permissions
    ///
    /// An unauthorized recognizer produces a permission notice and leaves the
    /// record toggle disabled.
    #[must_use]
    pub fn new(
        classifier: TranscriptClassifier,
        recognizer: Box<dyn Recognizer>,
        audio: Box<dyn AudioSource>,
        presenter: Box<dyn Presenter>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (events, events_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (products_tx, products) = watch::channel(Vec::new());
        let events_tx = events.downgrade();

        let mut controller = Self {
            classifier,
            recognizer,
            audio,
            presenter,
            config,
            products: ProductList::new(config.policy),
            session: SessionLists::default(),
            state: RecorderState::Idle,
            cancel_called: false,
            authorized: false,
            available: true,
            next_pass: 0,
            forwarder: None,
            events_tx,
            events_rx,
            products_tx,
        };
        controller.check_permissions();
        (controller, SessionHandle { events, products })
    }

    /// Process queued events until shutdown or until every handle is dropped,
    /// returning the final product list
    #[allow(clippy::future_not_send)]
    pub async fn run(mut self) -> Vec<String> {
        tracing::info!(
            recognizer = self.recognizer.name(),
            products = self.classifier.vocabulary().len(),
            "session controller running"
        );

        while let Some(event) = self.events_rx.recv().await {
            if !self.dispatch(event).await {
                break;
            }
        }

        if self.state != RecorderState::Idle {
            self.stop_recording(PassEnd::Shutdown);
        }

        tracing::info!(products = self.products.len(), "session controller stopped");
        self.products.products().to_vec()
    }

    /// Apply one event; returns `false` once shutdown was requested
    #[allow(clippy::future_not_send)]
    pub async fn dispatch(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::RecordPressed => self.toggle_recording().await,
            SessionEvent::Transcript { pass, event } => self.handle_transcript(pass, event),
            SessionEvent::AvailabilityChanged(available) => {
                tracing::info!(available, "recognizer availability changed");
                self.available = available;
                self.notify_trigger();
            }
            SessionEvent::Shutdown => {
                tracing::info!("shutdown requested");
                return false;
            }
        }
        true
    }

    /// Current recorder state
    #[must_use]
    pub const fn state(&self) -> RecorderState {
        self.state
    }

    /// The pass still accepting recognizer events, if any
    #[must_use]
    pub const fn current_pass(&self) -> Option<PassId> {
        match self.state {
            RecorderState::Recording(pass) | RecorderState::Draining(pass) => Some(pass),
            RecorderState::Idle => None,
        }
    }

    /// Whether a pass is capturing audio
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording(_))
    }

    /// Products currently added
    #[must_use]
    pub fn products(&self) -> &[String] {
        self.products.products()
    }

    /// Pending additions and deletions of the active pass
    #[must_use]
    pub const fn session_lists(&self) -> &SessionLists {
        &self.session
    }

    /// Whether the record toggle accepts presses
    #[must_use]
    pub const fn trigger_enabled(&self) -> bool {
        self.authorized && self.available
    }

    fn check_permissions(&mut self) {
        let authorization = self.recognizer.authorization();
        self.authorized = authorization.is_authorized();

        if let Some(message) = authorization.message() {
            tracing::warn!(?authorization, "speech recognition not authorized");
            self.presenter
                .notice(&Notice::Permission(message.to_string()));
        }
        self.notify_trigger();
    }

    #[allow(clippy::future_not_send)]
    async fn toggle_recording(&mut self) {
        match self.state {
            RecorderState::Idle | RecorderState::Draining(_) => self.start_recording().await,
            RecorderState::Recording(_) => self.stop_recording(PassEnd::Stopped),
        }
    }

    #[allow(clippy::future_not_send)]
    async fn start_recording(&mut self) {
        if !self.trigger_enabled() {
            tracing::debug!(
                authorized = self.authorized,
                available = self.available,
                "record toggle disabled, ignoring press"
            );
            return;
        }

        self.cancel_lingering_pass();
        self.state = RecorderState::Idle;
        self.cancel_called = false;
        self.session.clear();

        let stream = match self.recognizer.start_pass().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "failed to start recognition");
                self.presenter
                    .notice(&Notice::RecognitionUnavailable(e.to_string()));
                return;
            }
        };

        self.next_pass += 1;
        let pass = PassId(self.next_pass);
        self.forwarder = Some(self.spawn_forwarder(pass, stream));

        let sink: AudioSink = self
            .recognizer
            .audio_sink()
            .unwrap_or_else(|| Arc::new(|_: &[f32]| {}));
        if let Err(e) = self.audio.start(sink) {
            tracing::error!(error = %e, %pass, "audio engine failed to start");
            self.presenter.notice(&Notice::AudioUnavailable);
            self.cancel_lingering_pass();
            return;
        }

        self.state = RecorderState::Recording(pass);
        self.presenter.transcript("");
        self.notify_trigger();
        tracing::info!(%pass, locale = self.recognizer.locale(), "recording started");
    }

    /// End the active pass
    ///
    /// A recording pass is reconciled exactly once. Stopping by press or stop
    /// word only ends the audio and leaves the pass draining; the recognizer
    /// is cancelled once it reports a final result or an error.
    fn stop_recording(&mut self, end: PassEnd) {
        let pass = match self.state {
            RecorderState::Idle => return,
            RecorderState::Draining(pass) => {
                if !matches!(end, PassEnd::Stopped | PassEnd::StopWord) {
                    tracing::debug!(%pass, ?end, "drained pass finished");
                    self.teardown();
                }
                return;
            }
            RecorderState::Recording(pass) => pass,
        };

        match &end {
            PassEnd::Errored(error) => {
                tracing::warn!(%pass, error = %error, "recognition failed, ending pass");
            }
            _ => tracing::info!(%pass, ?end, "recording finished"),
        }

        if matches!(end, PassEnd::Stopped | PassEnd::StopWord) {
            self.presenter.transcript("");
        }

        if self.products.apply(&mut self.session) {
            self.products_tx
                .send_replace(self.products.products().to_vec());
        }

        self.audio.stop();
        self.recognizer.end_audio();

        if matches!(end, PassEnd::Stopped | PassEnd::StopWord) {
            self.cancel_called = true;
            self.state = RecorderState::Draining(pass);
            self.notify_trigger();
        } else {
            self.teardown();
        }
    }

    /// Cancel the recognizer and return to idle
    fn teardown(&mut self) {
        self.recognizer.cancel();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }

        self.state = RecorderState::Idle;
        self.notify_trigger();
    }

    fn handle_transcript(&mut self, pass: PassId, event: TranscriptEvent) {
        if self.current_pass() != Some(pass) {
            tracing::debug!(%pass, "dropping transcript from inactive pass");
            return;
        }

        let partial = !event.is_final && event.error.is_none();
        if partial && !self.config.partial_results {
            tracing::trace!(%pass, "skipping partial result");
            return;
        }

        // An error without a transcript keeps the lists from the last update
        if event.error.is_none() || !event.segments.is_empty() {
            let result = self
                .classifier
                .classify(&event.segments, !self.cancel_called);
            self.session = result.lists;
            self.presenter.transcript(&event.text());

            if result.stop_requested {
                self.stop_recording(PassEnd::StopWord);
                return;
            }
        }

        if let Some(error) = event.error {
            self.stop_recording(PassEnd::Errored(error));
        } else if event.is_final {
            self.stop_recording(PassEnd::Finalized);
        }
    }

    /// Drop a recognition task left over from an earlier pass
    fn cancel_lingering_pass(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            tracing::debug!("cancelling previous recognition task");
            forwarder.abort();
            self.recognizer.cancel();
        }
    }

    fn spawn_forwarder(&self, pass: PassId, mut stream: TranscriptStream) -> JoinHandle<()> {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let Some(tx) = events.upgrade() else {
                    break;
                };
                if tx
                    .send(SessionEvent::Transcript { pass, event })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            tracing::trace!(%pass, "transcript stream closed");
        })
    }

    fn notify_trigger(&self) {
        self.presenter.trigger_changed(TriggerState {
            enabled: self.trigger_enabled(),
            recording: self.is_recording(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_id_display() {
        assert_eq!(PassId(7).to_string(), "pass-7");
        assert!(PassId(1) < PassId(2));
    }

    #[test]
    fn test_default_session_config() {
        let config = SessionConfig::default();
        assert!(config.partial_results);
        assert!(!config.policy.dedupe);
    }
}

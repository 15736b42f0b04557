//! Shared test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use voice_cart::voice::{
    AudioSink, AudioSource, Authorization, Recognizer, TranscriptEvent, TranscriptStream,
};
use voice_cart::{
    Error, Notice, Presenter, Result, SessionConfig, SessionController, SessionHandle,
    TranscriptClassifier, TriggerState, Vocabulary,
};

/// Build a classifier over the given products
#[must_use]
pub fn classifier(products: &[&str]) -> TranscriptClassifier {
    TranscriptClassifier::new(Arc::new(Vocabulary::from_products(products.iter().copied())))
}

/// Turn string literals into owned tokens
#[must_use]
pub fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Call counters shared between a mock and the test body
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Recognizer that counts lifecycle calls
#[derive(Clone, Default)]
pub struct MockRecognizer {
    pub starts: Counter,
    pub end_audio: Counter,
    pub cancels: Counter,
    pub fail_start: bool,
    pub denied: Option<Authorization>,
    pub takes_audio: bool,
    pub active: Arc<Mutex<Option<mpsc::Sender<TranscriptEvent>>>>,
}

#[async_trait]
impl Recognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn authorization(&self) -> Authorization {
        self.denied.unwrap_or(Authorization::Authorized)
    }

    fn audio_sink(&self) -> Option<AudioSink> {
        self.takes_audio.then(|| Arc::new(|_: &[f32]| {}) as AudioSink)
    }

    async fn start_pass(&mut self) -> Result<TranscriptStream> {
        self.starts.bump();
        if self.fail_start {
            return Err(Error::Recognition("engine offline".to_string()));
        }
        let (tx, rx) = mpsc::channel(8);
        *self.active.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn end_audio(&mut self) {
        self.end_audio.bump();
    }

    fn cancel(&mut self) {
        self.cancels.bump();
        self.active.lock().unwrap().take();
    }
}

/// Audio source that counts starts and stops
#[derive(Clone, Default)]
pub struct MockAudio {
    pub starts: Counter,
    pub stops: Counter,
    pub fail_start: bool,
}

impl AudioSource for MockAudio {
    fn start(&mut self, _sink: AudioSink) -> Result<()> {
        self.starts.bump();
        if self.fail_start {
            return Err(Error::Audio("device busy".to_string()));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.bump();
    }

    fn is_running(&self) -> bool {
        self.starts.get() > self.stops.get()
    }
}

/// Presenter that records everything it is shown
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub transcripts: Arc<Mutex<Vec<String>>>,
    pub notices: Arc<Mutex<Vec<Notice>>>,
    pub triggers: Arc<Mutex<Vec<TriggerState>>>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_trigger(&self) -> Option<TriggerState> {
        self.triggers.lock().unwrap().last().copied()
    }

    #[must_use]
    pub fn last_transcript(&self) -> Option<String> {
        self.transcripts.lock().unwrap().last().cloned()
    }
}

impl Presenter for RecordingPresenter {
    fn transcript(&self, text: &str) {
        self.transcripts.lock().unwrap().push(text.to_string());
    }

    fn notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn trigger_changed(&self, trigger: TriggerState) {
        self.triggers.lock().unwrap().push(trigger);
    }
}

/// A controller wired to mocks, with the mocks kept for inspection
pub struct Harness {
    pub controller: SessionController,
    pub handle: SessionHandle,
    pub recognizer: MockRecognizer,
    pub audio: MockAudio,
    pub presenter: RecordingPresenter,
}

impl Harness {
    /// Controller over `products` with default mocks
    #[must_use]
    pub fn new(products: &[&str]) -> Self {
        Self::with(
            products,
            MockRecognizer::default(),
            MockAudio::default(),
            SessionConfig::default(),
        )
    }

    /// Controller over `products` with the given mocks and settings
    #[must_use]
    pub fn with(
        products: &[&str],
        recognizer: MockRecognizer,
        audio: MockAudio,
        config: SessionConfig,
    ) -> Self {
        let presenter = RecordingPresenter::default();
        let (controller, handle) = SessionController::new(
            classifier(products),
            Box::new(recognizer.clone()),
            Box::new(audio.clone()),
            Box::new(presenter.clone()),
            config,
        );
        Self {
            controller,
            handle,
            recognizer,
            audio,
            presenter,
        }
    }
}

//! Speech recognition boundary
//!
//! A recognizer turns one recording pass into a stream of transcript events.
//! Each event carries the full best transcription so far, not a delta.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Capacity of a pass's transcript stream
const STREAM_CAPACITY: usize = 32;

/// Locale assumed when none is configured
pub const DEFAULT_LOCALE: &str = "en-US";

/// Per-pass stream of transcript events
pub type TranscriptStream = mpsc::Receiver<TranscriptEvent>;

/// Callback receiving raw microphone samples
pub type AudioSink = Arc<dyn Fn(&[f32]) + Send + Sync>;

/// One transcript update from the recognizer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Recognized words in order
    pub segments: Vec<String>,
    /// The recognizer will send nothing further for this pass
    pub is_final: bool,
    /// Recognition failed
    pub error: Option<String>,
}

impl TranscriptEvent {
    /// A partial result
    #[must_use]
    pub const fn partial(segments: Vec<String>) -> Self {
        Self {
            segments,
            is_final: false,
            error: None,
        }
    }

    /// The final result of a pass
    #[must_use]
    pub const fn final_result(segments: Vec<String>) -> Self {
        Self {
            segments,
            is_final: true,
            error: None,
        }
    }

    /// A recognition failure with no transcript
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            is_final: false,
            error: Some(message.into()),
        }
    }

    /// Display text of the transcript
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.join(" ")
    }
}

/// Split recognizer text into word tokens
///
/// Surrounding punctuation is stripped, apostrophes inside words are kept.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Speech recognition authorization status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Recognition may be used
    Authorized,
    /// The user refused access
    Denied,
    /// Recognition is not available on this device
    Restricted,
    /// The user has not been asked yet
    NotDetermined,
}

impl Authorization {
    /// User-facing explanation when recognition cannot be used
    #[must_use]
    pub const fn message(self) -> Option<&'static str> {
        match self {
            Self::Authorized => None,
            Self::Denied => Some("Please enable access to speech recognition."),
            Self::Restricted => Some("Speech recognition not available on this device."),
            Self::NotDetermined => Some("Speech recognition is still not authorized."),
        }
    }

    /// Whether recording may start
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// A speech-to-text engine producing one transcript stream per pass
#[async_trait]
pub trait Recognizer: Send {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Locale the engine recognizes
    fn locale(&self) -> &str {
        DEFAULT_LOCALE
    }

    /// Current authorization status
    fn authorization(&self) -> Authorization {
        Authorization::Authorized
    }

    /// Begin a recognition pass
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot start recognizing
    async fn start_pass(&mut self) -> Result<TranscriptStream>;

    /// Where captured audio for the active pass should go
    fn audio_sink(&self) -> Option<AudioSink> {
        None
    }

    /// No more audio will be appended to the active pass
    fn end_audio(&mut self);

    /// Abandon the active pass; no further events are delivered
    fn cancel(&mut self);
}

type ActiveSender = Arc<Mutex<Option<mpsc::Sender<TranscriptEvent>>>>;

/// Recognizer whose transcript events are pushed in through a [`RecognizerFeed`]
///
/// Used by the interactive CLI, where typed lines stand in for speech.
pub struct FeedRecognizer {
    active: ActiveSender,
    authorization: Authorization,
    locale: String,
}

impl Default for FeedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedRecognizer {
    /// Create an authorized feed recognizer
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(None)),
            authorization: Authorization::Authorized,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Recognize the given locale
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Report the given authorization status
    #[must_use]
    pub const fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }

    /// Handle for pushing events into the active pass
    #[must_use]
    pub fn feed(&self) -> RecognizerFeed {
        RecognizerFeed {
            active: Arc::clone(&self.active),
        }
    }

    fn close(&self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[async_trait]
impl Recognizer for FeedRecognizer {
    fn name(&self) -> &str {
        "feed"
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn authorization(&self) -> Authorization {
        self.authorization
    }

    async fn start_pass(&mut self) -> Result<TranscriptStream> {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        tracing::debug!(locale = %self.locale, "feed recognizer pass started");
        Ok(rx)
    }

    fn end_audio(&mut self) {
        tracing::trace!("feed recognizer audio ended");
    }

    fn cancel(&mut self) {
        self.close();
        tracing::debug!("feed recognizer pass cancelled");
    }
}

/// Pushes transcript events into a [`FeedRecognizer`]'s active pass
#[derive(Clone)]
pub struct RecognizerFeed {
    active: ActiveSender,
}

impl RecognizerFeed {
    /// Deliver an event to the active pass
    ///
    /// Returns `false` if no pass is active.
    pub async fn send(&self, event: TranscriptEvent) -> bool {
        let sender = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Whether a pass is accepting events
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

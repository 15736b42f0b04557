//! Voice input module
//!
//! Handles audio capture and the speech recognition boundary.

mod capture;
mod recognizer;

pub use capture::{AudioSource, InputLevel, MicrophoneCapture, SAMPLE_RATE, SilentSource};
pub use recognizer::{
    AudioSink, Authorization, DEFAULT_LOCALE, FeedRecognizer, Recognizer, RecognizerFeed,
    TranscriptEvent, TranscriptStream, tokenize,
};

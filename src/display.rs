//! Display boundary
//!
//! The session controller reports transcript text, user notices and the
//! record trigger's state through a [`Presenter`]. The product list itself is
//! published on a watch channel (see [`crate::session::SessionHandle`]).

use std::fmt;

/// Blocking message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Speech recognition is not authorized
    Permission(String),
    /// The audio engine could not start
    AudioUnavailable,
    /// The recognition engine could not start a pass
    RecognitionUnavailable(String),
}

impl Notice {
    /// Short title for the notice
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Permission(_) => "Permissions error",
            Self::AudioUnavailable => "Audio Error",
            Self::RecognitionUnavailable(_) => "Recognition Error",
        }
    }

    /// Body of the notice
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Permission(message) | Self::RecognitionUnavailable(message) => message.as_str(),
            Self::AudioUnavailable => "Recording is not possible at the moment.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

/// State of the record toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    /// The toggle accepts presses
    pub enabled: bool,
    /// A pass is in progress
    pub recording: bool,
}

impl TriggerState {
    /// Label for the toggle
    #[must_use]
    pub const fn label(self) -> &'static str {
        if self.recording {
            "Stop Recording"
        } else {
            "Start Recording"
        }
    }
}

/// Receives user-visible session updates
pub trait Presenter: Send {
    /// Best transcription of the active pass; empty clears it
    fn transcript(&self, text: &str);

    /// Show a blocking notice
    fn notice(&self, notice: &Notice);

    /// The record toggle changed
    fn trigger_changed(&self, trigger: TriggerState);
}

/// Presenter that writes everything to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn transcript(&self, text: &str) {
        if !text.is_empty() {
            tracing::info!(text, "heard");
        }
    }

    fn notice(&self, notice: &Notice) {
        tracing::warn!(title = notice.title(), "{}", notice.message());
    }

    fn trigger_changed(&self, trigger: TriggerState) {
        tracing::debug!(
            enabled = trigger.enabled,
            label = trigger.label(),
            "record trigger"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_text() {
        assert_eq!(
            Notice::AudioUnavailable.to_string(),
            "Audio Error: Recording is not possible at the moment."
        );
        let notice = Notice::Permission("Please enable access to speech recognition.".into());
        assert_eq!(notice.title(), "Permissions error");
        assert_eq!(notice.message(), "Please enable access to speech recognition.");
    }

    #[test]
    fn test_trigger_label() {
        let idle = TriggerState {
            enabled: true,
            recording: false,
        };
        assert_eq!(idle.label(), "Start Recording");
        assert_eq!(
            TriggerState {
                recording: true,
                ..idle
            }
            .label(),
            "Stop Recording"
        );
    }
}

//! Configuration management for voice-cart

pub mod file;

use std::path::PathBuf;

use crate::reconciler::ReconcilePolicy;
use crate::session::SessionConfig;
use crate::voice::{DEFAULT_LOCALE, Recognizer};
use crate::{Error, Result, Vocabulary};

/// voice-cart configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Product vocabulary file; the embedded list is used when unset
    pub products_path: Option<PathBuf>,

    /// Recognition locale, handed to the recognizer
    pub locale: String,

    /// Classify partial results as they arrive
    pub partial_results: bool,

    /// Drop repeated products on reconciliation
    pub dedupe: bool,

    /// Capture from the default microphone
    pub microphone: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            products_path: None,
            locale: DEFAULT_LOCALE.to_string(),
            partial_results: true,
            dedupe: false,
            microphone: true,
        }
    }
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::load_with_options(None, false)
    }

    /// Load configuration with command-line overrides
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load_with_options(products: Option<PathBuf>, disable_mic: bool) -> Result<Self> {
        // env > toml > default
        let fc = file::load_config_file();
        Self::from_file(&fc, products, disable_mic)
    }

    /// Resolve configuration on top of a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if the locale is empty
    pub fn from_file(
        fc: &file::ConfigFile,
        products: Option<PathBuf>,
        disable_mic: bool,
    ) -> Result<Self> {
        Self::from_lookup(fc, products, disable_mic, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with `env` standing in for the process environment
    ///
    /// # Errors
    ///
    /// Returns error if the locale is empty
    pub fn from_lookup(
        fc: &file::ConfigFile,
        products: Option<PathBuf>,
        disable_mic: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let products_path = products
            .or_else(|| env("VOICE_CART_PRODUCTS").map(PathBuf::from))
            .or_else(|| fc.products_path());

        let locale = env("VOICE_CART_LOCALE")
            .or_else(|| fc.recognition.locale.clone())
            .unwrap_or(defaults.locale);
        if locale.trim().is_empty() {
            return Err(Error::Config("recognition locale must not be empty".to_string()));
        }

        let dedupe = env("VOICE_CART_DEDUPE")
            .as_deref()
            .map(parse_flag)
            .or(fc.list.dedupe)
            .unwrap_or(defaults.dedupe);

        let microphone = if disable_mic {
            tracing::info!("microphone explicitly disabled");
            false
        } else {
            fc.audio.microphone.unwrap_or(defaults.microphone)
        };

        Ok(Self {
            products_path,
            locale,
            partial_results: fc
                .recognition
                .partial_results
                .unwrap_or(defaults.partial_results),
            dedupe,
            microphone,
        })
    }

    /// Load the configured product vocabulary
    ///
    /// A configured file that cannot be read yields an empty vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> Vocabulary {
        self.products_path.as_ref().map_or_else(Vocabulary::embedded, |path| {
            Vocabulary::load_or_empty(path)
        })
    }

    /// Whether to open the microphone for `recognizer`
    ///
    /// Audio is only captured when enabled and the recognizer has somewhere
    /// to send it.
    #[must_use]
    pub fn capture_audio(&self, recognizer: &dyn Recognizer) -> bool {
        self.microphone && recognizer.audio_sink().is_some()
    }

    /// Session settings derived from this configuration
    #[must_use]
    pub const fn session(&self) -> SessionConfig {
        SessionConfig {
            policy: ReconcilePolicy {
                dedupe: self.dedupe,
            },
            partial_results: self.partial_results,
        }
    }
}

/// Parse a boolean environment value (`1`, `true`, `yes`, `on`)
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

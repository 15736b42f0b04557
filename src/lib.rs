//! voice-cart - voice-driven product list
//!
//! This library turns a live speech transcript into a list of products:
//! - Vocabulary of recognizable products and trigger words
//! - Transcript classification into additions, deletions and stop requests
//! - Reconciliation of each recording pass into the durable list
//! - A single-consumer session controller driving recording passes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Recognizer  │  Microphone               │
//! └────────────────────┬────────────────────────────────┘
//!                      │ transcript events (per pass)
//! ┌────────────────────▼────────────────────────────────┐
//! │                Session Controller                    │
//! │   Classifier  │  Session lists  │  Reconciler        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ product list / notices
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Presenter                          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod display;
pub mod error;
pub mod reconciler;
pub mod session;
pub mod vocabulary;
pub mod voice;

pub use classifier::{Classification, SessionLists, TranscriptClassifier};
pub use config::Config;
pub use display::{LogPresenter, Notice, Presenter, TriggerState};
pub use error::{Error, Result};
pub use reconciler::{ProductList, ReconcilePolicy, reconcile};
pub use session::{
    PassEnd, PassId, RecorderState, SessionConfig, SessionController, SessionEvent, SessionHandle,
};
pub use vocabulary::Vocabulary;

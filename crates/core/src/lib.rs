//! # Minutes Core
//!
//! Core logic for the meeting-notes assistant.
//!
//! This crate contains the document operations and file management for a Markdown vault:
//! - The state-document merge engine (topic updates, other-topics replacement, closed
//!   topic archival) and append-only history documents
//! - Transcript correction with a memorised corrections log
//! - Note creation, discovery and processed-marking under the vault's meetings folder
//! - Language-model extraction adapters that turn transcripts into typed results
//!
//! **No terminal I/O**: prompting the user and reading the environment belong in `cli`.

pub mod config;
pub mod constants;
pub mod corrections;
pub mod error;
pub mod extraction;
pub mod files;
pub mod history;
pub mod markdown;
pub mod notes;
pub mod paths;
pub mod state;
pub mod vocabulary;

pub use config::{CoreConfig, Locale};
pub use corrections::{CorrectionService, Decision, MemorisedCorrections, ProposedCorrection};
pub use error::{MinutesError, MinutesResult};
pub use extraction::client::{ChatCompletionsModel, LanguageModel};
pub use extraction::daily::DailyStandupResult;
pub use extraction::topics::{TopicTrackingResult, TopicUpdate};
pub use markdown::{SectionMarkers, TopicDocument};
pub use notes::{Attendee, Meeting, NoteMetadata, NoteRepository, UnprocessedNote};
pub use paths::SeriesPaths;
pub use state::{StateDocumentService, StateUpdateOutcome};
pub use vocabulary::Vocabulary;

pub use minutes_types::{DateLabel, NonEmptyText, TextError};

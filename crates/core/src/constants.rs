//! Constants used throughout the minutes core crate.
//!
//! Literal strings that depend on the vault's language live in
//! [`crate::config::Locale`]; this module holds the ones that do not.

/// Character appended to a note's file stem once it has been processed.
pub const DEFAULT_PROCESSED_MARKER: char = '*';

/// Extension of every Markdown document in the vault.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Delimiter between original and correction in the memorised corrections log.
pub const CORRECTION_ARROW: &str = " → ";

/// Line that opens and closes a note's metadata header.
pub const FRONT_MATTER_DELIMITER: &str = "---";

/// Characters stripped from meeting titles before they become file or folder names.
pub const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Number of characters shown either side of a proposed correction during review.
pub const REVIEW_CONTEXT_CHARS: usize = 200;

/// Default model used when `LLM_MODEL` is not set.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible endpoint used when `LLM_BASE_URL` is not set.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

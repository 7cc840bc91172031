//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Nothing in the core reads environment variables; the CLI does that and hands the result
//! to [`CoreConfig::new`].

use crate::constants::DEFAULT_PROCESSED_MARKER;
use crate::{MinutesError, MinutesResult};
use std::path::{Path, PathBuf};

/// Every language-dependent literal the vault layout and documents rely on.
///
/// Existing vaults were written in Catalan, so [`Locale::catalan`] is the default. The
/// English locale is used by tests and by vaults created from scratch in English.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locale {
    /// Top-level folder holding all meeting kinds.
    pub meetings_root: String,
    /// Folder inside a series directory that holds the individual notes.
    pub notes_dir: String,
    /// Folder inside the meetings root holding vocabulary and memorised corrections.
    pub config_dir: String,
    /// Name (without extension) of the live topic document of a tracking series.
    pub state_document: String,
    /// Name (without extension) of the append-only history document of a series.
    pub history_document: String,
    /// Heading text (level 2) that introduces the transcript inside a note.
    pub transcript_heading: String,
    /// Phrase an Other-Topics heading starts with.
    pub other_topics: String,
    /// Keyword that marks a topic heading as closed.
    pub closed_marker: String,
    /// Meeting-kind folder whose notes feed topic tracking.
    pub tracking_kind: String,
    /// Meeting-kind folder whose notes feed daily standup extraction.
    pub daily_kind: String,
    pub yesterday_label: String,
    pub today_label: String,
    /// Heading for miscellaneous items in a rendered daily summary.
    pub daily_other_topics: String,
    /// Filename of the vocabulary list inside the config folder.
    pub vocabulary_file: String,
    /// Filename of the memorised corrections log inside the config folder.
    pub memorised_file: String,
    /// Title written at the top of a freshly created memorised corrections log.
    pub memorised_title: String,
    pub date_label: String,
    pub attendees_label: String,
    pub duration_label: String,
}

impl Locale {
    pub fn catalan() -> Self {
        Self {
            meetings_root: "Reunions".into(),
            notes_dir: "Reunions".into(),
            config_dir: "zConfig".into(),
            state_document: "Estat actual".into(),
            history_document: "Històric".into(),
            transcript_heading: "Transcripció".into(),
            other_topics: "Altres temes".into(),
            closed_marker: "Tancat".into(),
            tracking_kind: "Seguiment".into(),
            daily_kind: "Daily".into(),
            yesterday_label: "Ahir".into(),
            today_label: "Avui".into(),
            daily_other_topics: "Altres temes tractats".into(),
            vocabulary_file: "Vocabulari.md".into(),
            memorised_file: "Canvis Memoritzats.md".into(),
            memorised_title: "Canvis Memoritzats".into(),
            date_label: "Data".into(),
            attendees_label: "Assistents".into(),
            duration_label: "Durada".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            meetings_root: "Meetings".into(),
            notes_dir: "Notes".into(),
            config_dir: "zConfig".into(),
            state_document: "Current state".into(),
            history_document: "History".into(),
            transcript_heading: "Transcript".into(),
            other_topics: "Other topics".into(),
            closed_marker: "Closed".into(),
            tracking_kind: "Tracking".into(),
            daily_kind: "Daily".into(),
            yesterday_label: "Yesterday".into(),
            today_label: "Today".into(),
            daily_other_topics: "Other topics discussed".into(),
            vocabulary_file: "Vocabulary.md".into(),
            memorised_file: "Memorised corrections.md".into(),
            memorised_title: "Memorised corrections".into(),
            date_label: "Date".into(),
            attendees_label: "Attendees".into(),
            duration_label: "Duration".into(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::catalan()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    vault_dir: PathBuf,
    locale: Locale,
    self_name: Option<String>,
    processed_marker: char,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`MinutesError::VaultNotFound`] if `vault_dir` is not an existing directory,
    /// and [`MinutesError::InvalidInput`] if a locale literal the parser depends on is empty.
    pub fn new(
        vault_dir: PathBuf,
        locale: Locale,
        self_name: Option<String>,
    ) -> MinutesResult<Self> {
        if !vault_dir.is_dir() {
            return Err(MinutesError::VaultNotFound(vault_dir));
        }

        for (name, value) in [
            ("other_topics", &locale.other_topics),
            ("closed_marker", &locale.closed_marker),
            ("transcript_heading", &locale.transcript_heading),
        ] {
            if value.trim().is_empty() {
                return Err(MinutesError::InvalidInput(format!(
                    "locale field {name} cannot be empty"
                )));
            }
        }

        let self_name = self_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            vault_dir,
            locale,
            self_name,
            processed_marker: DEFAULT_PROCESSED_MARKER,
        })
    }

    pub fn vault_dir(&self) -> &Path {
        &self.vault_dir
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Attendee excluded from daily standup extraction (usually the vault owner).
    pub fn self_name(&self) -> Option<&str> {
        self.self_name.as_deref()
    }

    pub fn processed_marker(&self) -> char {
        self.processed_marker
    }

    pub fn meetings_dir(&self) -> PathBuf {
        self.vault_dir.join(&self.locale.meetings_root)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.meetings_dir().join(&self.locale.config_dir)
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        self.config_dir().join(&self.locale.vocabulary_file)
    }

    pub fn memorised_path(&self) -> PathBuf {
        self.config_dir().join(&self.locale.memorised_file)
    }
}

/// Parse the locale from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the Catalan locale.
pub fn locale_from_env_value(value: Option<String>) -> MinutesResult<Locale> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("ca") => Ok(Locale::catalan()),
        Some("en") => Ok(Locale::english()),
        Some(other) => Err(MinutesError::InvalidInput(format!(
            "unsupported locale: {other} (expected ca or en)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_missing_vault() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("nope");
        let err = CoreConfig::new(missing.clone(), Locale::english(), None).unwrap_err();
        assert!(matches!(err, MinutesError::VaultNotFound(p) if p == missing));
    }

    #[test]
    fn test_new_rejects_empty_closed_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut locale = Locale::english();
        locale.closed_marker = "  ".into();
        let err = CoreConfig::new(temp_dir.path().to_path_buf(), locale, None).unwrap_err();
        assert!(matches!(err, MinutesError::InvalidInput(_)));
    }

    #[test]
    fn test_paths_follow_locale() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::new(
            temp_dir.path().to_path_buf(),
            Locale::english(),
            Some("  ".into()),
        )
        .unwrap();
        assert_eq!(cfg.meetings_dir(), temp_dir.path().join("Meetings"));
        assert_eq!(
            cfg.vocabulary_path(),
            temp_dir.path().join("Meetings/zConfig/Vocabulary.md")
        );
        assert_eq!(cfg.self_name(), None);
        assert_eq!(cfg.processed_marker(), '*');
    }

    #[test]
    fn test_locale_from_env_value() {
        assert_eq!(locale_from_env_value(None).unwrap(), Locale::catalan());
        assert_eq!(
            locale_from_env_value(Some(" EN ".into())).unwrap(),
            Locale::english()
        );
        assert!(locale_from_env_value(Some("fr".into())).is_err());
    }
}

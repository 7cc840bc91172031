//! On-disk path layout of the meetings vault.
//!
//! This module contains **no I/O**. It only builds paths so that the layout is defined in
//! exactly one place.
//!
//! # Path Structure
//!
//! ```text
//! <vault>/
//!     <meetings-root>/
//!         <config-dir>/
//!             <vocabulary>.md
//!             <memorised corrections>.md
//!         <kind>/
//!             <series>/
//!                 <state document>.md
//!                 <history document>.md
//!                 <notes-dir>/
//!                     <yyMMdd>_<series>.md
//!                     <yyMMdd>_<series>*.md      (processed)
//! ```
//!
//! `<series>` is the meeting title passed through [`clean_name`].

use crate::config::Locale;
use crate::constants::{FORBIDDEN_FILENAME_CHARS, MARKDOWN_EXTENSION};
use minutes_types::DateLabel;
use std::path::{Path, PathBuf};

/// Turns a meeting title into a file and folder name.
///
/// Characters that are invalid on common filesystems are removed, whitespace runs are
/// collapsed and the remaining spaces become underscores.
pub fn clean_name(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !FORBIDDEN_FILENAME_CHARS.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join("_")
}

/// File name of the note for `series` on `date`.
pub fn note_file_name(date: &DateLabel, series: &str) -> String {
    format!("{date}_{series}.{MARKDOWN_EXTENSION}")
}

/// Splits a note stem into its date label and a human-readable title.
///
/// `240115_Weekly_sync` gives `(Some(240115), "Weekly sync")`. A stem without a valid
/// six-digit date prefix gives no date, including a well-formed but impossible calendar
/// date such as `240230`; a stem without an underscore is its own title.
pub fn split_note_stem(stem: &str) -> (Option<DateLabel>, String) {
    match stem.split_once('_') {
        Some((prefix, rest)) => (DateLabel::parse(prefix).ok(), rest.replace('_', " ")),
        None => (None, stem.to_string()),
    }
}

/// Paths belonging to one meeting series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesPaths {
    name: String,
    dir: PathBuf,
    notes_dir: PathBuf,
    state_document: PathBuf,
    history_document: PathBuf,
}

impl SeriesPaths {
    fn at(dir: PathBuf, name: String, locale: &Locale) -> Self {
        Self {
            notes_dir: dir.join(&locale.notes_dir),
            state_document: dir.join(format!("{}.{MARKDOWN_EXTENSION}", locale.state_document)),
            history_document: dir
                .join(format!("{}.{MARKDOWN_EXTENSION}", locale.history_document)),
            name,
            dir,
        }
    }

    /// Paths for the series titled `title` under meeting kind `kind`.
    pub fn new(meetings_dir: &Path, kind: &str, title: &str, locale: &Locale) -> Self {
        let name = clean_name(title);
        Self::at(meetings_dir.join(kind).join(&name), name, locale)
    }

    /// Paths for the series a note belongs to, derived from the note's location.
    ///
    /// Returns `None` if the note does not sit inside a notes folder.
    pub fn from_note(note: &Path, locale: &Locale) -> Option<Self> {
        let notes_dir = note.parent()?;
        if notes_dir.file_name()? != locale.notes_dir.as_str() {
            return None;
        }
        let dir = notes_dir.parent()?;
        let name = dir.file_name()?.to_string_lossy().into_owned();
        Some(Self::at(dir.to_path_buf(), name, locale))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    pub fn state_document(&self) -> &Path {
        &self.state_document
    }

    pub fn history_document(&self) -> &Path {
        &self.history_document
    }

    /// Meeting kind folder name (the series directory's parent).
    pub fn kind(&self) -> Option<String> {
        self.dir
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn note(&self, date: &DateLabel) -> PathBuf {
        self.notes_dir.join(note_file_name(date, &self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Weekly:  sync / ops?  "), "Weekly_sync_ops");
        assert_eq!(clean_name("A<b>|c\"d*"), "Abcd");
        assert_eq!(clean_name("Daily"), "Daily");
    }

    #[test]
    fn test_series_layout() {
        let locale = Locale::english();
        let series = SeriesPaths::new(Path::new("/v/Meetings"), "Tracking", "Door project", &locale);
        let date = DateLabel::parse("240115").unwrap();

        assert_eq!(series.name(), "Door_project");
        assert_eq!(series.dir(), Path::new("/v/Meetings/Tracking/Door_project"));
        assert_eq!(
            series.note(&date),
            Path::new("/v/Meetings/Tracking/Door_project/Notes/240115_Door_project.md")
        );
        assert_eq!(
            series.state_document(),
            Path::new("/v/Meetings/Tracking/Door_project/Current state.md")
        );
        assert_eq!(
            series.history_document(),
            Path::new("/v/Meetings/Tracking/Door_project/History.md")
        );
        assert_eq!(series.kind().as_deref(), Some("Tracking"));
    }

    #[test]
    fn test_from_note_round_trips_series() {
        let locale = Locale::english();
        let series = SeriesPaths::new(Path::new("/v/Meetings"), "Tracking", "Door project", &locale);
        let note = series.note(&DateLabel::parse("240115").unwrap());

        assert_eq!(SeriesPaths::from_note(&note, &locale), Some(series));
        assert_eq!(
            SeriesPaths::from_note(Path::new("/v/Meetings/Tracking/x.md"), &locale),
            None
        );
    }

    #[test]
    fn test_split_note_stem() {
        let (date, title) = split_note_stem("240115_Weekly_sync");
        assert_eq!(date.map(|d| d.to_string()).as_deref(), Some("240115"));
        assert_eq!(title, "Weekly sync");

        let (date, title) = split_note_stem("notes_from_call");
        assert!(date.is_none());
        assert_eq!(title, "from call");

        let (date, title) = split_note_stem("240230_Impossible_day");
        assert!(date.is_none());
        assert_eq!(title, "Impossible day");

        let (date, title) = split_note_stem("scratch");
        assert!(date.is_none());
        assert_eq!(title, "scratch");
    }
}

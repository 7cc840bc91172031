//! Meeting note repository.
//!
//! A note is a Markdown file with a YAML metadata header and a transcript section:
//! ```markdown
//! ---
//! date: 2024-01-15
//! time: 09:30
//! type: meeting
//! title: Door project
//! attendees:
//! - '[[Anna Puig]]'
//! ---
//!
//! # Door project
//!
//! **Date:** 2024-01-15 09:30
//! ...
//!
//! ## Transcript
//!
//! <transcript text>
//! ```
//! A note is processed once its file stem ends with the processed marker; renaming is the
//! only state change, there is no status field.

use crate::config::CoreConfig;
use crate::constants::{FRONT_MATTER_DELIMITER, MARKDOWN_EXTENSION};
use crate::files::{read_document, write_atomic};
use crate::paths::{split_note_stem, SeriesPaths};
use crate::{MinutesError, MinutesResult};
use chrono::NaiveDateTime;
use minutes_types::{DateLabel, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// A meeting participant as known to the calendar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attendee {
    pub name: NonEmptyText,
    pub email: Option<String>,
}

/// A calendar meeting a note is created for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meeting {
    pub title: NonEmptyText,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub attendees: Vec<Attendee>,
}

impl Meeting {
    pub fn date_label(&self) -> DateLabel {
        DateLabel::from_date(self.start.date())
    }

    /// Human-readable duration, `-` when the end time is unknown.
    pub fn duration_text(&self) -> String {
        let minutes = match self.end {
            Some(end) if end > self.start => (end - self.start).num_minutes(),
            _ => return "-".to_string(),
        };
        match (minutes / 60, minutes % 60) {
            (0, m) => format!("{m} min"),
            (h, 0) => format!("{h}h"),
            (h, m) => format!("{h}h {m}min"),
        }
    }
}

/// Metadata header of a note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub note_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Attendees as `[[Name]]` wiki links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    /// Email address to attendee name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub emails: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl NoteMetadata {
    /// Attendee names with any wiki-link brackets removed.
    pub fn attendee_names(&self) -> Vec<String> {
        self.attendees
            .iter()
            .map(|a| {
                let a = a.trim();
                a.strip_prefix("[[")
                    .and_then(|a| a.strip_suffix("]]"))
                    .unwrap_or(a)
                    .trim()
                    .to_string()
            })
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// A note that has not been run through extraction yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnprocessedNote {
    pub path: PathBuf,
    pub title: String,
    pub date: Option<DateLabel>,
}

/// Splits a leading `---` delimited header from the rest of the document.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix(FRONT_MATTER_DELIMITER)?
        .strip_prefix('\n')
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Byte offset just past the transcript heading line, if present.
fn transcript_offset(text: &str, heading: &str) -> Option<usize> {
    let marker = format!("## {heading}");
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == marker {
            return Some(offset + line.len());
        }
        offset += line.len();
    }
    None
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == MARKDOWN_EXTENSION)
}

/// File-system access to meeting notes.
#[derive(Clone, Debug)]
pub struct NoteRepository {
    cfg: Arc<CoreConfig>,
}

impl NoteRepository {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Meeting kinds: the folders of the meetings root, except the config folder and
    /// hidden folders, sorted by name.
    pub fn meeting_kinds(&self) -> MinutesResult<Vec<String>> {
        let meetings_dir = self.cfg.meetings_dir();
        if !meetings_dir.is_dir() {
            tracing::warn!("meetings folder {} does not exist", meetings_dir.display());
            return Ok(Vec::new());
        }

        let mut kinds = Vec::new();
        for entry in std::fs::read_dir(&meetings_dir).map_err(MinutesError::FileRead)? {
            let entry = entry.map_err(MinutesError::FileRead)?;
            if !entry.file_type().map_err(MinutesError::FileRead)?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != self.cfg.locale().config_dir && !name.starts_with('.') {
                kinds.push(name);
            }
        }
        kinds.sort();
        Ok(kinds)
    }

    pub fn series(&self, kind: &str, title: &str) -> SeriesPaths {
        SeriesPaths::new(&self.cfg.meetings_dir(), kind, title, self.cfg.locale())
    }

    /// Series a note belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`MinutesError::InvalidInput`] if the note is not inside a notes folder.
    pub fn series_of(&self, note: &Path) -> MinutesResult<SeriesPaths> {
        SeriesPaths::from_note(note, self.cfg.locale()).ok_or_else(|| {
            MinutesError::InvalidInput(format!(
                "{} is not inside a '{}' folder",
                note.display(),
                self.cfg.locale().notes_dir
            ))
        })
    }

    fn render_note(&self, meeting: &Meeting, transcript: &str, subtype: Option<&str>) -> MinutesResult<String> {
        let locale = self.cfg.locale();
        let date = meeting.start.format("%Y-%m-%d").to_string();
        let time = meeting.start.format("%H:%M").to_string();
        let links: Vec<String> = meeting
            .attendees
            .iter()
            .map(|a| format!("[[{}]]", a.name))
            .collect();

        let metadata = NoteMetadata {
            date: Some(date.clone()),
            time: Some(time.clone()),
            note_type: Some("meeting".into()),
            title: Some(meeting.title.to_string()),
            attendees: links.clone(),
            emails: meeting
                .attendees
                .iter()
                .filter_map(|a| a.email.as_ref().map(|e| (e.clone(), a.name.to_string())))
                .collect(),
            subtype: subtype.map(str::to_string),
        };
        let yaml = serde_yaml::to_string(&metadata).map_err(MinutesError::YamlSerialization)?;

        Ok(format!(
            "{FRONT_MATTER_DELIMITER}\n{yaml}{FRONT_MATTER_DELIMITER}\n\n\
             # {title}\n\n\
             **{date_label}:** {date} {time}\n\
             **{attendees_label}:** {links}\n\
             **{duration_label}:** {duration}\n\n\
             {FRONT_MATTER_DELIMITER}\n\n\
             ## {heading}\n\n\
             {transcript}\n",
            title = meeting.title,
            date_label = locale.date_label,
            attendees_label = locale.attendees_label,
            links = links.join(", "),
            duration_label = locale.duration_label,
            duration = meeting.duration_text(),
            heading = locale.transcript_heading,
            transcript = transcript.trim(),
        ))
    }

    /// Writes a new note for `meeting` under meeting kind `kind`.
    ///
    /// For the tracking kind the series' state and history documents are created with a
    /// title header if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`MinutesError::NoteExists`] if a note for that series and date exists,
    /// processed or not.
    pub fn create_note(
        &self,
        meeting: &Meeting,
        transcript: &str,
        kind: &str,
        subtype: Option<&str>,
    ) -> MinutesResult<PathBuf> {
        let series = self.series(kind, meeting.title.as_str());
        let path = series.note(&meeting.date_label());
        let processed = self.processed_path(&path);
        if path.exists() || processed.as_ref().is_some_and(|p| p.exists()) {
            return Err(MinutesError::NoteExists(path));
        }

        write_atomic(&path, &self.render_note(meeting, transcript, subtype)?)?;
        tracing::info!("created note {}", path.display());

        if kind == self.cfg.locale().tracking_kind {
            let locale = self.cfg.locale();
            for (doc, title) in [
                (series.state_document(), &locale.state_document),
                (series.history_document(), &locale.history_document),
            ] {
                if !doc.exists() {
                    write_atomic(doc, &format!("# {title}\n\n"))?;
                    tracing::info!("created {}", doc.display());
                }
            }
        }

        Ok(path)
    }

    /// Notes whose stem does not end in the processed marker, newest first.
    ///
    /// Only Markdown files directly inside a notes folder are considered, so state and
    /// history documents and everything under the config folder are skipped.
    pub fn list_unprocessed(&self) -> MinutesResult<Vec<UnprocessedNote>> {
        let meetings_dir = self.cfg.meetings_dir();
        if !meetings_dir.is_dir() {
            return Ok(Vec::new());
        }
        let locale = self.cfg.locale();
        let marker = self.cfg.processed_marker();

        let mut notes = Vec::new();
        for entry in WalkDir::new(&meetings_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&meetings_dir) else {
                continue;
            };
            if relative
                .components()
                .next()
                .is_some_and(|c| c.as_os_str() == locale.config_dir.as_str())
            {
                continue;
            }
            let in_notes_dir = relative
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|n| n == locale.notes_dir.as_str());
            if !in_notes_dir {
                continue;
            }

            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if stem.ends_with(marker) {
                continue;
            }
            let (date, title) = split_note_stem(&stem);
            notes.push(UnprocessedNote {
                path: path.to_path_buf(),
                title,
                date,
            });
        }

        notes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
        tracing::debug!("found {} unprocessed notes", notes.len());
        Ok(notes)
    }

    /// Transcript section of a note. A note without a transcript heading is returned
    /// whole.
    pub fn read_transcript(&self, path: &Path) -> MinutesResult<String> {
        let text = read_document(path)?;
        let heading = &self.cfg.locale().transcript_heading;
        match transcript_offset(&text, heading) {
            Some(at) => Ok(text[at..].trim().to_string()),
            None => {
                tracing::warn!("{} has no '## {heading}' section", path.display());
                Ok(text)
            }
        }
    }

    /// Replaces the transcript section of a note.
    ///
    /// # Returns
    ///
    /// `false`, leaving the note untouched, if it has no transcript heading.
    pub fn write_transcript(&self, path: &Path, transcript: &str) -> MinutesResult<bool> {
        let text = read_document(path)?;
        let heading = &self.cfg.locale().transcript_heading;
        let Some(at) = transcript_offset(&text, heading) else {
            tracing::warn!("{} has no '## {heading}' section; not rewritten", path.display());
            return Ok(false);
        };

        let mut updated = text[..at].to_string();
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push('\n');
        updated.push_str(transcript.trim());
        updated.push('\n');
        write_atomic(path, &updated)?;
        Ok(true)
    }

    /// Whether the note's file stem already ends with the processed marker.
    pub fn is_processed(&self, path: &Path) -> bool {
        path
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().ends_with(self.cfg.processed_marker()))
    }

    fn processed_path(&self, path: &Path) -> Option<PathBuf> {
        let stem = path.file_stem()?.to_string_lossy();
        Some(path.with_file_name(format!(
            "{stem}{}.{MARKDOWN_EXTENSION}",
            self.cfg.processed_marker()
        )))
    }

    /// Renames a note so its stem ends with the processed marker.
    ///
    /// An already processed note is returned unchanged.
    pub fn mark_processed(&self, path: &Path) -> MinutesResult<PathBuf> {
        if !path.is_file() {
            return Err(MinutesError::DocumentNotFound(path.to_path_buf()));
        }
        if self.is_processed(path) {
            return Ok(path.to_path_buf());
        }

        let target = self
            .processed_path(path)
            .ok_or_else(|| MinutesError::InvalidInput(format!("{} has no file name", path.display())))?;
        if target.exists() {
            return Err(MinutesError::NoteExists(target));
        }

        std::fs::rename(path, &target).map_err(MinutesError::FileRename)?;
        tracing::info!("marked {} as processed", target.display());
        Ok(target)
    }

    /// Metadata header of a note; a note without one has empty metadata.
    pub fn read_metadata(&self, path: &Path) -> MinutesResult<NoteMetadata> {
        let text = read_document(path)?;
        match split_front_matter(&text) {
            Some((yaml, _)) if !yaml.trim().is_empty() => {
                serde_yaml::from_str(yaml).map_err(MinutesError::YamlDeserialization)
            }
            _ => Ok(NoteMetadata::default()),
        }
    }

    /// Date label of a note, from its file name.
    pub fn date_of(&self, path: &Path) -> Option<DateLabel> {
        let stem = path.file_stem()?.to_string_lossy();
        split_note_stem(&stem).0
    }

    /// Transcript of the most recent processed note in the same series as `note`.
    pub fn latest_processed_transcript(&self, note: &Path) -> MinutesResult<Option<String>> {
        let series = self.series_of(note)?;

        let mut processed = Vec::new();
        for entry in std::fs::read_dir(series.notes_dir()).map_err(MinutesError::FileRead)? {
            let path = entry.map_err(MinutesError::FileRead)?.path();
            if is_markdown(&path) && self.is_processed(&path) && path != note {
                processed.push(path);
            }
        }

        match processed.into_iter().max() {
            Some(latest) => {
                tracing::debug!("using {} as reference transcript", latest.display());
                self.read_transcript(&latest).map(Some)
            }
            None => Ok(None),
        }
    }
}

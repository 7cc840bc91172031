//! Merge engine for topic-tracking state documents.
//!
//! The transforms on [`TopicDocument`] in this module are pure: they take the parsed
//! document, mutate it in memory and hand back whatever was removed. File access is
//! confined to [`StateDocumentService::update`], which chains the transforms into one
//! update pass and persists the results.
//!
//! ## Persistence order
//!
//! Content removed from the live document is always appended to the history document
//! *before* the live document is rewritten. A crash between the two writes therefore
//! leaves the removed content in both files, never in neither.

use crate::config::CoreConfig;
use crate::extraction::topics::{TopicTrackingResult, TopicUpdate};
use crate::files::{read_document, write_atomic};
use crate::history::{append_history_block, render_archived};
use crate::markdown::{last_content_index, Block, SectionMarkers, TopicDocument, TopicSection};
use crate::MinutesResult;
use minutes_types::DateLabel;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Collapses a free-text summary onto a single line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl TopicDocument {
    /// Appends a dated bullet to every topic section whose title matches an update.
    ///
    /// The bullet `- **{date}:** {summary}` goes after the section's last non-blank line,
    /// so blank separators before the next heading stay where they were. Updates naming
    /// a topic that is not in the document are dropped without error, as are updates
    /// with a blank summary. When several updates name the same topic the last one wins.
    ///
    /// # Returns
    ///
    /// The number of bullets inserted, which is exactly how many lines the document grew.
    pub fn apply_topic_updates(&mut self, updates: &[TopicUpdate], date: &DateLabel) -> usize {
        let by_title: HashMap<&str, String> = updates
            .iter()
            .map(|u| (u.topic_name.as_str(), single_line(&u.summary)))
            .filter(|(_, summary)| !summary.is_empty())
            .collect();

        let mut matched: HashSet<&str> = HashSet::new();
        let mut inserted = 0;
        for section in self.topics_mut() {
            let Some((&title, summary)) = by_title.get_key_value(section.title.as_str()) else {
                continue;
            };
            let at = last_content_index(&section.body).map_or(0, |i| i + 1);
            section
                .body
                .insert(at, format!("- **{date}:** {summary}"));
            matched.insert(title);
            inserted += 1;
        }

        for title in by_title.keys().filter(|t| !matched.contains(**t)) {
            tracing::debug!("topic update for '{title}' matched no section");
        }
        inserted
    }

    /// Replaces the body of the other-topics section with one bullet per entry.
    ///
    /// An empty `new_topics` clears the section.
    ///
    /// # Returns
    ///
    /// `None` if the document has no other-topics section (the document is left as is),
    /// otherwise the non-blank lines that were displaced.
    pub fn replace_other_topics(&mut self, new_topics: &[String]) -> Option<Vec<String>> {
        let index = self
            .blocks
            .iter()
            .position(|b| matches!(b, Block::OtherTopics(_)))?;
        let followed = index + 1 < self.blocks.len();

        let Block::OtherTopics(section) = &mut self.blocks[index] else {
            return None;
        };

        let mut body: Vec<String> = new_topics
            .iter()
            .map(|t| single_line(t))
            .filter(|t| !t.is_empty())
            .map(|t| format!("- {t}"))
            .collect();
        if followed {
            body.push(String::new());
        }

        let old = std::mem::replace(&mut section.body, body);
        Some(old.into_iter().filter(|l| !l.trim().is_empty()).collect())
    }

    /// Removes every topic section whose title contains `closed_marker`.
    ///
    /// # Returns
    ///
    /// The removed sections in document order. Running this again on the result always
    /// returns an empty list and leaves the document unchanged.
    pub fn archive_closed_topics(&mut self, closed_marker: &str) -> Vec<TopicSection> {
        let mut archived = Vec::new();
        let blocks = std::mem::take(&mut self.blocks);
        self.blocks = blocks
            .into_iter()
            .filter_map(|block| match block {
                Block::Topic(section) if section.is_closed(closed_marker) => {
                    archived.push(section);
                    None
                }
                other => Some(other),
            })
            .collect();
        archived
    }
}

/// What one update pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdateOutcome {
    /// Dated bullets inserted under existing topics.
    pub topics_updated: usize,
    /// Old other-topics lines moved to the history document.
    pub displaced: Vec<String>,
    /// Closed sections moved to the history document.
    pub archived: Vec<TopicSection>,
    /// Whether the state document was rewritten at all.
    pub written: bool,
}

/// Applies topic-tracking results to a series' state and history documents.
#[derive(Clone, Debug)]
pub struct StateDocumentService {
    cfg: Arc<CoreConfig>,
}

impl StateDocumentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn markers(&self) -> SectionMarkers {
        SectionMarkers::from_locale(self.cfg.locale())
    }

    /// Titles of the open topics in a state document.
    pub fn active_topics(&self, state_path: &Path) -> MinutesResult<Vec<String>> {
        let text = read_document(state_path)?;
        Ok(TopicDocument::parse(&text, &self.markers()).topic_titles())
    }

    /// Runs one full update pass.
    ///
    /// 1. Insert dated bullets for `result.updated_topics`.
    /// 2. Replace the other-topics section with `result.new_other_topics`; displaced lines
    ///    are appended to the history document under `date`.
    /// 3. Persist the state document.
    /// 4. Re-read it, archive closed topics into a second history block under `date`, and
    ///    persist the pruned document.
    ///
    /// A result with no updated topics and no new other topics is a no-op: neither file
    /// is read or written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MinutesError::DocumentNotFound`] if the state document does not
    /// exist; callers create it beforehand. I/O failures on either document are returned
    /// as they happen, with no rollback of earlier writes.
    pub fn update(
        &self,
        state_path: &Path,
        history_path: &Path,
        result: &TopicTrackingResult,
        date: &DateLabel,
    ) -> MinutesResult<StateUpdateOutcome> {
        if result.is_empty() {
            tracing::info!("nothing to merge into {}", state_path.display());
            return Ok(StateUpdateOutcome::default());
        }

        let markers = self.markers();
        let history_title = &self.cfg.locale().history_document;
        let mut outcome = StateUpdateOutcome::default();

        let text = read_document(state_path)?;
        let mut doc = TopicDocument::parse(&text, &markers);

        if !result.updated_topics.is_empty() {
            outcome.topics_updated = doc.apply_topic_updates(&result.updated_topics, date);
        }

        match doc.replace_other_topics(&result.new_other_topics) {
            Some(displaced) => outcome.displaced = displaced,
            None => tracing::warn!(
                "no '{}' section in {}; other topics left untouched",
                markers.other_topics,
                state_path.display()
            ),
        }

        if !outcome.displaced.is_empty() {
            append_history_block(
                history_path,
                history_title,
                date.as_str(),
                &outcome.displaced.join("\n"),
            )?;
        }

        write_atomic(state_path, &doc.render())?;
        outcome.written = true;
        tracing::info!(
            "updated {} topic(s) in {}",
            outcome.topics_updated,
            state_path.display()
        );

        let persisted = read_document(state_path)?;
        let mut doc = TopicDocument::parse(&persisted, &markers);
        let archived = doc.archive_closed_topics(&markers.closed);
        if !archived.is_empty() {
            append_history_block(
                history_path,
                history_title,
                date.as_str(),
                &render_archived(&archived),
            )?;
            write_atomic(state_path, &doc.render())?;
            tracing::info!(
                "archived {} closed topic(s) from {}",
                archived.len(),
                state_path.display()
            );
        }
        outcome.archived = archived;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locale;
    use tempfile::TempDir;

    fn markers() -> SectionMarkers {
        SectionMarkers::new("Other topics", "Closed")
    }

    fn date(s: &str) -> DateLabel {
        DateLabel::parse(s).unwrap()
    }

    fn update(topic: &str, summary: &str) -> TopicUpdate {
        TopicUpdate {
            topic_name: topic.into(),
            summary: summary.into(),
        }
    }

    const DOC: &str = "# Current state\n\n### A\n- **240101:** started\n\n### B (Closed)\n- note\n\n## Other topics\n- x\n";

    fn test_cfg(dir: &Path) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(dir.to_path_buf(), Locale::english(), None).unwrap())
    }

    #[test]
    fn test_apply_inserts_after_last_content_line() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let inserted = doc.apply_topic_updates(&[update("A", "progressed")], &date("240115"));
        assert_eq!(inserted, 1);
        assert!(doc
            .render()
            .contains("### A\n- **240101:** started\n- **240115:** progressed\n\n### B"));
    }

    #[test]
    fn test_apply_preserves_original_lines_in_order() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let before: Vec<String> = doc.lines().iter().map(|l| l.to_string()).collect();
        let inserted = doc.apply_topic_updates(
            &[update("A", "one"), update("B (Closed)", "two\nlines")],
            &date("240115"),
        );
        let after: Vec<String> = doc.lines().iter().map(|l| l.to_string()).collect();

        assert_eq!(after.len(), before.len() + inserted);
        let kept: Vec<&String> = after
            .iter()
            .filter(|l| !l.starts_with("- **240115:**"))
            .collect();
        assert_eq!(kept, before.iter().collect::<Vec<_>>());
        assert!(after.contains(&"- **240115:** two lines".to_string()));
    }

    #[test]
    fn test_unmatched_update_is_dropped_silently() {
        let mut with_unknown = TopicDocument::parse(DOC, &markers());
        let mut without = TopicDocument::parse(DOC, &markers());

        with_unknown.apply_topic_updates(
            &[update("A", "progressed"), update("Nope", "ignored")],
            &date("240115"),
        );
        without.apply_topic_updates(&[update("A", "progressed")], &date("240115"));

        assert_eq!(with_unknown.render(), without.render());
    }

    #[test]
    fn test_apply_counts_matched_and_unmatched_updates() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let inserted = doc.apply_topic_updates(
            &[
                update("Missing", "nowhere"),
                update("B (Closed)", "closing note"),
                update("A", "progressed"),
                update("Also missing", "nowhere"),
            ],
            &date("240115"),
        );

        assert_eq!(inserted, 2);
        let rendered = doc.render();
        assert!(rendered.contains("- **240115:** progressed"));
        assert!(rendered.contains("- note\n- **240115:** closing note"));
        assert!(!rendered.contains("nowhere"));
    }

    #[test]
    fn test_titles_compared_exactly() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let inserted = doc.apply_topic_updates(&[update("a", "lowercase")], &date("240115"));
        assert_eq!(inserted, 0);
    }

    #[test]
    fn test_apply_into_empty_section() {
        let mut doc = TopicDocument::parse("### A\n### B\n", &markers());
        doc.apply_topic_updates(&[update("A", "first")], &date("240115"));
        assert_eq!(doc.render(), "### A\n- **240115:** first\n### B\n");
    }

    #[test]
    fn test_replace_other_topics_returns_displaced() {
        let mut doc = TopicDocument::parse(
            "### A\n## Other topics\n\n- old one\n- old two\n\n# Appendix\nkeep\n",
            &markers(),
        );
        let displaced = doc
            .replace_other_topics(&["new".to_string(), "newer".to_string()])
            .unwrap();

        assert_eq!(displaced, vec!["- old one", "- old two"]);
        assert_eq!(
            doc.other_topics().unwrap().body,
            vec!["- new", "- newer", ""]
        );
        assert!(doc.render().ends_with("- newer\n\n# Appendix\nkeep\n"));
    }

    #[test]
    fn test_replace_other_topics_with_empty_list_clears() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let displaced = doc.replace_other_topics(&[]).unwrap();
        assert_eq!(displaced, vec!["- x"]);
        assert!(doc.other_topics().unwrap().body.is_empty());
        assert!(doc.render().ends_with("## Other topics\n"));
    }

    #[test]
    fn test_replace_other_topics_without_section_is_noop() {
        let mut doc = TopicDocument::parse("### A\n- x\n", &markers());
        let before = doc.clone();
        assert!(doc.replace_other_topics(&["y".to_string()]).is_none());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_archive_closed_topics_removes_sections() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        let archived = doc.archive_closed_topics("Closed");

        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].heading, "### B (Closed)");
        assert_eq!(
            doc.render(),
            "# Current state\n\n### A\n- **240101:** started\n\n## Other topics\n- x\n"
        );
    }

    #[test]
    fn test_archive_is_idempotent() {
        let mut doc = TopicDocument::parse(DOC, &markers());
        doc.archive_closed_topics("Closed");
        let once = doc.render();

        let mut again = TopicDocument::parse(&once, &markers());
        assert!(again.archive_closed_topics("Closed").is_empty());
        assert_eq!(again.render(), once);
    }

    #[test]
    fn test_closed_marker_is_case_sensitive() {
        let mut doc = TopicDocument::parse("### A (closed)\n- x\n", &markers());
        assert!(doc.archive_closed_topics("Closed").is_empty());
    }

    #[test]
    fn test_update_closes_and_archives() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = temp_dir.path().join("Current state.md");
        let history = temp_dir.path().join("History.md");
        std::fs::write(&state, "### A\n### B (Closed)\n- note\n## Other topics\n- x\n").unwrap();

        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        let result = TopicTrackingResult {
            updated_topics: vec![update("A", "progressed")],
            new_other_topics: vec![],
        };
        let outcome = service
            .update(&state, &history, &result, &date("240115"))
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&state).unwrap(),
            "### A\n- **240115:** progressed\n## Other topics\n"
        );
        let history_text = std::fs::read_to_string(&history).unwrap();
        assert!(history_text.contains("## 240115\n\n### B (Closed)\n- note\n"));
        assert!(history_text.contains("## 240115\n\n- x\n"));
        let displaced_at = history_text.find("- x").unwrap();
        let archived_at = history_text.find("### B (Closed)").unwrap();
        assert!(displaced_at < archived_at);

        assert_eq!(outcome.topics_updated, 1);
        assert_eq!(outcome.displaced, vec!["- x"]);
        assert_eq!(outcome.archived.len(), 1);
        assert!(outcome.written);
    }

    #[test]
    fn test_update_archives_freshly_updated_closed_topic() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = temp_dir.path().join("Current state.md");
        let history = temp_dir.path().join("History.md");
        std::fs::write(&state, "### B (Closed)\n- note\n## Other topics\n").unwrap();

        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        let result = TopicTrackingResult {
            updated_topics: vec![update("B (Closed)", "wrapped up")],
            new_other_topics: vec!["follow-up".into()],
        };
        service
            .update(&state, &history, &result, &date("240115"))
            .unwrap();

        let history_text = std::fs::read_to_string(&history).unwrap();
        assert!(history_text.contains("### B (Closed)\n- note\n- **240115:** wrapped up"));
        assert_eq!(
            std::fs::read_to_string(&state).unwrap(),
            "## Other topics\n- follow-up\n"
        );
    }

    #[test]
    fn test_update_noop_leaves_files_untouched() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = temp_dir.path().join("Current state.md");
        let history = temp_dir.path().join("History.md");
        std::fs::write(&state, DOC).unwrap();
        let modified = std::fs::metadata(&state).unwrap().modified().unwrap();

        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        let outcome = service
            .update(
                &state,
                &history,
                &TopicTrackingResult::default(),
                &date("240115"),
            )
            .unwrap();

        assert!(!outcome.written);
        assert_eq!(std::fs::read_to_string(&state).unwrap(), DOC);
        assert_eq!(
            std::fs::metadata(&state).unwrap().modified().unwrap(),
            modified
        );
        assert!(!history.exists());
    }

    #[test]
    fn test_update_missing_state_document_is_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        let result = TopicTrackingResult {
            updated_topics: vec![update("A", "x")],
            new_other_topics: vec![],
        };
        let err = service
            .update(
                &temp_dir.path().join("missing.md"),
                &temp_dir.path().join("History.md"),
                &result,
                &date("240115"),
            )
            .unwrap_err();
        assert!(matches!(err, crate::MinutesError::DocumentNotFound(_)));
    }

    #[test]
    fn test_update_without_closed_topics_skips_second_block() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = temp_dir.path().join("Current state.md");
        let history = temp_dir.path().join("History.md");
        std::fs::write(&state, "### A\n## Other topics\n").unwrap();

        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        let result = TopicTrackingResult {
            updated_topics: vec![update("A", "x")],
            new_other_topics: vec![],
        };
        let outcome = service
            .update(&state, &history, &result, &date("240115"))
            .unwrap();

        assert!(outcome.archived.is_empty());
        assert!(outcome.displaced.is_empty());
        assert!(!history.exists());
    }

    #[test]
    fn test_active_topics() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = temp_dir.path().join("Current state.md");
        std::fs::write(&state, DOC).unwrap();
        let service = StateDocumentService::new(test_cfg(temp_dir.path()));
        assert_eq!(
            service.active_topics(&state).unwrap(),
            vec!["A", "B (Closed)"]
        );
    }
}

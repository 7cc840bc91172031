//! Daily standup extraction and rendering.

use super::client::LanguageModel;
use super::parse_lenient;
use crate::config::Locale;
use crate::history::append_history_block;
use crate::vocabulary::Vocabulary;
use crate::MinutesResult;
use minutes_types::DateLabel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What one attendee reported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDaily {
    pub name: String,
    #[serde(default, alias = "ahir")]
    pub yesterday: Vec<String>,
    #[serde(default, alias = "avui")]
    pub today: Vec<String>,
}

impl ParticipantDaily {
    fn is_empty(&self) -> bool {
        self.yesterday.is_empty() && self.today.is_empty()
    }
}

/// Structured output of a daily standup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStandupResult {
    #[serde(default)]
    pub participants: Vec<ParticipantDaily>,
    #[serde(default, alias = "altres_temes", alias = "otherTopics")]
    pub other_topics: Vec<String>,
}

impl DailyStandupResult {
    pub fn is_empty(&self) -> bool {
        self.participants.iter().all(ParticipantDaily::is_empty) && self.other_topics.is_empty()
    }
}

/// Builds the daily standup prompt for the given attendees.
pub fn build_prompt(attendees: &[String], vocabulary: &Vocabulary, transcript: &str) -> String {
    let attendees = attendees
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyse the transcript of a daily standup meeting.

ATTENDEES (exact names you must use):
{attendees}

COMPANY VOCABULARY (for spelling product, project and people names correctly):
{vocabulary}

TRANSCRIPT:
{transcript}

INSTRUCTIONS:
- For each attendee, extract what they did YESTERDAY (past tense) and what they will do TODAY (future or present tense).
- Leave "yesterday" or "today" empty when the person does not mention it.
- Each bullet is a short, clear sentence of at most two lines.
- "name" must match one of the attendee names EXACTLY.
- Do not invent information that is not in the transcript.
- Put additional subjects (decisions, blockers, general discussion) in "other_topics" as short sentences, or leave it empty.
- Write in the language of the transcript.

Return ONLY a JSON object with this shape:
{{"participants": [{{"name": "...", "yesterday": ["..."], "today": ["..."]}}], "other_topics": ["..."]}}"#,
        vocabulary = vocabulary.prompt_text(),
    )
}

/// Runs a daily standup pass over `transcript`.
///
/// `self_name`, when set, is removed from the attendee list before prompting.
pub fn extract_daily(
    model: &dyn LanguageModel,
    vocabulary: &Vocabulary,
    attendees: &[String],
    self_name: Option<&str>,
    transcript: &str,
) -> MinutesResult<DailyStandupResult> {
    let attendees: Vec<String> = attendees
        .iter()
        .filter(|a| Some(a.as_str()) != self_name)
        .cloned()
        .collect();

    tracing::info!(
        "extracting daily standup for {} attendees with {}",
        attendees.len(),
        model.model_name()
    );
    let raw = model.complete(&build_prompt(&attendees, vocabulary, transcript))?;
    Ok(parse_lenient(&raw, "daily standup"))
}

/// Renders a daily result as the body of a history block.
///
/// Participants with nothing to report are left out. The other-topics list gets a level-4
/// heading so that it nests under the block's level-2 date heading.
pub fn render_daily(result: &DailyStandupResult, locale: &Locale) -> String {
    let mut lines = Vec::new();

    for p in result.participants.iter().filter(|p| !p.is_empty()) {
        lines.push(format!("##### [[{}]]", p.name));
        for (label, items) in [
            (&locale.yesterday_label, &p.yesterday),
            (&locale.today_label, &p.today),
        ] {
            if items.is_empty() {
                continue;
            }
            lines.push(format!("**{label}:**"));
            lines.extend(items.iter().map(|i| format!("- {i}")));
        }
        lines.push(String::new());
    }

    if !result.other_topics.is_empty() {
        lines.push(format!("#### {}", locale.daily_other_topics));
        lines.extend(result.other_topics.iter().map(|t| format!("- {t}")));
    }

    lines.join("\n").trim_end().to_string()
}

/// Appends a rendered daily result to the series history document as a dated block.
///
/// # Returns
///
/// `false` if the result was empty and nothing was written.
pub fn append_daily(
    history_path: &Path,
    locale: &Locale,
    result: &DailyStandupResult,
    date: &DateLabel,
) -> MinutesResult<bool> {
    append_history_block(
        history_path,
        &locale.history_document,
        date.as_str(),
        &render_daily(result, locale),
    )
}

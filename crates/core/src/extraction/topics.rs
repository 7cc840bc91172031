//! Topic-tracking extraction.
//!
//! Given the open topics of a tracking series and a meeting transcript, asks the model
//! which topics were discussed and what new ones came up. The result feeds
//! [`crate::state::StateDocumentService::update`].

use super::client::LanguageModel;
use super::parse_lenient;
use crate::MinutesResult;
use serde::{Deserialize, Serialize};

/// Progress summary for one open topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicUpdate {
    /// Must equal a topic heading title exactly to have any effect.
    #[serde(alias = "topicName")]
    pub topic_name: String,
    pub summary: String,
}

/// Structured output of a topic-tracking pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTrackingResult {
    #[serde(default, alias = "updatedTopics")]
    pub updated_topics: Vec<TopicUpdate>,
    #[serde(default, alias = "newOtherTopics")]
    pub new_other_topics: Vec<String>,
}

impl TopicTrackingResult {
    /// `true` when the result carries neither topic updates nor other topics.
    pub fn is_empty(&self) -> bool {
        self.updated_topics.is_empty() && self.new_other_topics.is_empty()
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the topic-tracking prompt.
pub fn build_prompt(topics: &[String], transcript: &str) -> String {
    format!(
        r#"Analyse the transcript of a project follow-up meeting and work out which topics were discussed.

CURRENT OPEN TOPICS:
{topics}

TRANSCRIPT:
{transcript}

INSTRUCTIONS:
- For every open topic discussed in the meeting, write a 3-4 line summary of what was said, including decisions, current status and next steps when mentioned.
- Only summarise what was said. Do not invent anything.
- Leave topics that were not discussed out of "updated_topics".
- Put new topics that are not in the open list in "new_other_topics" with a short description.
- "topic_name" must match the topic name EXACTLY as it appears in the list.
- Write the summaries in the language of the transcript.

Return ONLY a JSON object with this shape:
{{"updated_topics": [{{"topic_name": "...", "summary": "..."}}], "new_other_topics": ["..."]}}"#,
        topics = bullet_list(topics),
    )
}

/// Runs a topic-tracking pass over `transcript`.
///
/// # Errors
///
/// Only transport failures are returned; an unparseable reply yields an empty result.
pub fn extract_topic_updates(
    model: &dyn LanguageModel,
    topics: &[String],
    transcript: &str,
) -> MinutesResult<TopicTrackingResult> {
    tracing::info!(
        "extracting topic updates for {} open topics with {}",
        topics.len(),
        model.model_name()
    );
    let raw = model.complete(&build_prompt(topics, transcript))?;
    let result: TopicTrackingResult = parse_lenient(&raw, "topic updates");

    tracing::info!(
        "model reported {} topic updates and {} other topics",
        result.updated_topics.len(),
        result.new_other_topics.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::testing::CannedModel;

    #[test]
    fn test_extract_topic_updates_parses_reply() {
        let model = CannedModel::new(
            "```json\n{\"updated_topics\": [{\"topic_name\": \"Door firmware\", \"summary\": \"Release next week\"}], \"new_other_topics\": [\"Printer\"]}\n```",
        );
        let result =
            extract_topic_updates(&model, &["Door firmware".into()], "we talked").unwrap();

        assert_eq!(result.updated_topics.len(), 1);
        assert_eq!(result.updated_topics[0].topic_name, "Door firmware");
        assert_eq!(result.new_other_topics, vec!["Printer".to_string()]);

        let prompts = model.prompts.borrow();
        assert!(prompts[0].contains("- Door firmware"));
        assert!(prompts[0].contains("we talked"));
    }

    #[test]
    fn test_camel_case_keys_are_accepted() {
        let result: TopicTrackingResult = serde_json::from_str(
            r#"{"updatedTopics": [{"topicName": "A", "summary": "s"}], "newOtherTopics": []}"#,
        )
        .unwrap();
        assert_eq!(result.updated_topics[0].topic_name, "A");
    }

    #[test]
    fn test_unparseable_reply_is_empty_result() {
        let model = CannedModel::new("I could not find any topics, sorry.");
        let result = extract_topic_updates(&model, &[], "text").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_prompt_without_topics() {
        assert!(build_prompt(&[], "t").contains("CURRENT OPEN TOPICS:\n(none)"));
    }
}

//! Correction proposals for speech-recognition errors.

use super::client::LanguageModel;
use super::parse_lenient;
use crate::corrections::ProposedCorrection;
use crate::vocabulary::Vocabulary;
use crate::MinutesResult;

/// Builds the correction prompt.
///
/// `reference` is an already corrected transcript from the same meeting series, used by
/// the model as a guide to names, terms and style.
pub fn build_prompt(vocabulary: &Vocabulary, reference: Option<&str>, transcript: &str) -> String {
    let reference = reference
        .map(|r| {
            format!(
                "\nALREADY CORRECTED TRANSCRIPT (previous meeting of the same series, use it as a reference for names, terms and style):\n{r}\n"
            )
        })
        .unwrap_or_default();

    format!(
        r#"You correct automatic speech recognition (ASR) transcripts of technical meetings.

ASR makes phonetic mistakes: it writes common words where the speaker said a technical term, a product name or a person's name from the company vocabulary.

TASK: Review the transcript and find EVERY word or phrase that is probably a phonetic error for a vocabulary term. Do not stop at spelling mistakes: look for words that make no sense in a technical context and sound like a vocabulary term.

COMPANY VOCABULARY:
{vocabulary}
{reference}
TRANSCRIPT:
{transcript}

For each likely error give:
- "original": the wrong text exactly as it appears in the transcript
- "correction": the correct vocabulary term
- "reason": a short explanation of the phonetic similarity or why it makes no sense in context
- "sentence": the full transcript sentence containing the error

Return ONLY a JSON array, with no other text:
[{{"original": "...", "correction": "...", "reason": "...", "sentence": "..."}}]
If there are no errors, return []."#,
        vocabulary = vocabulary.prompt_text(),
    )
}

/// Asks the model for correction proposals.
///
/// Proposals whose `original` is blank or equal to the correction are discarded.
pub fn propose_corrections(
    model: &dyn LanguageModel,
    vocabulary: &Vocabulary,
    reference: Option<&str>,
    transcript: &str,
) -> MinutesResult<Vec<ProposedCorrection>> {
    tracing::info!("requesting correction proposals from {}", model.model_name());
    let raw = model.complete(&build_prompt(vocabulary, reference, transcript))?;
    let proposals: Vec<ProposedCorrection> = parse_lenient(&raw, "corrections");

    let proposals: Vec<_> = proposals
        .into_iter()
        .filter(|p| !p.original.trim().is_empty() && p.original != p.correction)
        .collect();

    tracing::info!("model proposed {} corrections", proposals.len());
    Ok(proposals)
}

//! Transcript correction: memorised replays, proposal review and approved replacements.
//!
//! Corrections are literal substring replacements; there is no tokenisation and no
//! word-boundary check. The memorised corrections log is a Markdown list of
//! `- original → correction` lines that grows as the user approves fixes during review
//! and is replayed automatically on every later transcript.

use crate::config::CoreConfig;
use crate::constants::{CORRECTION_ARROW, FRONT_MATTER_DELIMITER, REVIEW_CONTEXT_CHARS};
use crate::files::{read_optional, write_atomic};
use crate::{MinutesError, MinutesResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A fix proposed by the correction model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedCorrection {
    pub original: String,
    #[serde(alias = "correccio")]
    pub correction: String,
    #[serde(default, alias = "motiu")]
    pub reason: String,
    #[serde(default, alias = "frase")]
    pub sentence: String,
}

/// Ordered `original → correction` pairs read from the memorised corrections log.
///
/// A later line for the same original overrides the earlier value but keeps the
/// position of the first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorisedCorrections {
    entries: Vec<(String, String)>,
}

impl MemorisedCorrections {
    /// Parses a log; lines that are not `- A → B` are ignored.
    pub fn parse(text: &str) -> Self {
        let mut memorised = Self::default();
        for line in text.lines() {
            let Some(rest) = line.strip_prefix("- ") else {
                continue;
            };
            let Some((original, correction)) = rest.split_once(CORRECTION_ARROW) else {
                continue;
            };
            memorised.insert(original.trim(), correction.trim());
        }
        memorised
    }

    /// Loads the log at `path`. A missing file is an empty log.
    pub fn load(path: &Path) -> MinutesResult<Self> {
        Ok(read_optional(path)?
            .map(|text| Self::parse(&text))
            .unwrap_or_default())
    }

    fn insert(&mut self, original: &str, correction: &str) {
        match self.entries.iter_mut().find(|(o, _)| o == original) {
            Some(entry) => entry.1 = correction.to_string(),
            None => self
                .entries
                .push((original.to_string(), correction.to_string())),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replays every memorised pair over `transcript`, in log order.
    ///
    /// Each pair whose original occurs replaces all of its occurrences. A later pair may
    /// rewrite text introduced by an earlier one.
    ///
    /// # Returns
    ///
    /// The corrected transcript and the pairs that matched.
    pub fn apply(&self, transcript: &str) -> (String, Vec<(String, String)>) {
        let mut text = transcript.to_string();
        let mut applied = Vec::new();
        for (original, correction) in &self.entries {
            if original.is_empty() || !text.contains(original.as_str()) {
                continue;
            }
            text = text.replace(original.as_str(), correction);
            tracing::debug!("memorised correction \"{original}\" → \"{correction}\"");
            applied.push((original.clone(), correction.clone()));
        }
        (text, applied)
    }

    /// Appends `- original → correction` to the log at `path` unless that exact line is
    /// already present somewhere in the file.
    ///
    /// A missing log is created with a small front matter block and a `# {title}` header.
    ///
    /// # Returns
    ///
    /// `true` if the entry was written.
    pub fn save(path: &Path, original: &str, correction: &str, title: &str) -> MinutesResult<bool> {
        let mut text = read_optional(path)?.unwrap_or_else(|| {
            format!(
                "{FRONT_MATTER_DELIMITER}\ntype: config\n{FRONT_MATTER_DELIMITER}\n\n# {title}\n\n"
            )
        });

        let entry = format!("- {original}{CORRECTION_ARROW}{correction}");
        if text.contains(&entry) {
            tracing::debug!("correction \"{original}\" already memorised");
            return Ok(false);
        }

        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&entry);
        text.push('\n');
        write_atomic(path, &text)?;

        tracing::info!("memorised \"{original}\" → \"{correction}\"");
        Ok(true)
    }
}

/// Applies approved corrections in list order, each replacing every occurrence of its
/// original.
pub fn apply_approved(transcript: &str, approved: &[ProposedCorrection]) -> String {
    approved
        .iter()
        .filter(|c| !c.original.is_empty())
        .fold(transcript.to_string(), |text, c| {
            text.replace(c.original.as_str(), &c.correction)
        })
}

/// Returns up to `chars` characters either side of the first occurrence of `original`,
/// with the occurrence wrapped in brackets. `None` if `original` does not occur.
pub fn context_snippet(transcript: &str, original: &str, chars: usize) -> Option<String> {
    if original.is_empty() {
        return None;
    }
    let at = transcript.find(original)?;
    let before = &transcript[..at];
    let after = &transcript[at + original.len()..];

    let start = before
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(at, |(i, _)| i);
    let end = after
        .char_indices()
        .nth(chars)
        .map_or(after.len(), |(i, _)| i);

    Some(format!(
        "{}[{original}]{}",
        &transcript[start..at],
        &after[..end]
    ))
}

/// What the user decided about one proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    AcceptAndMemorise,
    Reject,
    /// Apply a user-supplied correction instead of the proposed one.
    Replace { correction: String, memorise: bool },
}

impl Decision {
    /// Interprets a review answer: `y`/`s` accepts, `m` accepts and memorises, `n` or
    /// nothing rejects, anything else is a replacement text (not memorised).
    pub fn parse(answer: &str) -> Self {
        let answer = answer.trim();
        match answer.to_lowercase().as_str() {
            "y" | "yes" | "s" | "si" | "sí" => Self::Accept,
            "m" => Self::AcceptAndMemorise,
            "" | "n" | "no" => Self::Reject,
            _ => Self::Replace {
                correction: answer.to_string(),
                memorise: false,
            },
        }
    }
}

/// Result of a review pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub transcript: String,
    pub approved: Vec<ProposedCorrection>,
    pub memorised: usize,
}

/// Correction workflow over the vault's memorised corrections log.
#[derive(Clone, Debug)]
pub struct CorrectionService {
    cfg: Arc<CoreConfig>,
}

impl CorrectionService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn load_memorised(&self) -> MinutesResult<MemorisedCorrections> {
        MemorisedCorrections::load(&self.cfg.memorised_path())
    }

    /// Replays the memorised corrections over `transcript`.
    pub fn apply_memorised(&self, transcript: &str) -> MinutesResult<(String, usize)> {
        let memorised = self.load_memorised()?;
        let (text, applied) = memorised.apply(transcript);
        if !applied.is_empty() {
            tracing::info!("applied {} memorised corrections", applied.len());
        }
        Ok((text, applied.len()))
    }

    pub fn memorise(&self, original: &str, correction: &str) -> MinutesResult<bool> {
        MemorisedCorrections::save(
            &self.cfg.memorised_path(),
            original,
            correction,
            &self.cfg.locale().memorised_title,
        )
    }

    /// Walks through `proposals` asking `decide` about each one, then applies the
    /// approved corrections to `transcript`.
    ///
    /// `decide` receives the proposal and a context snippet around its first occurrence
    /// (empty if it does not occur). Proposals with a blank original are skipped.
    /// Memorisation happens immediately, so an abort part-way through keeps what was
    /// already memorised.
    pub fn review<F, E>(
        &self,
        transcript: &str,
        proposals: &[ProposedCorrection],
        mut decide: F,
    ) -> Result<ReviewOutcome, E>
    where
        F: FnMut(&ProposedCorrection, &str) -> Result<Decision, E>,
        E: From<MinutesError>,
    {
        let mut approved = Vec::new();
        let mut memorised = 0;

        for proposal in proposals.iter().filter(|p| !p.original.trim().is_empty()) {
            let context = context_snippet(transcript, &proposal.original, REVIEW_CONTEXT_CHARS)
                .unwrap_or_default();

            let chosen = match decide(proposal, &context)? {
                Decision::Reject => continue,
                Decision::Accept => (proposal.clone(), false),
                Decision::AcceptAndMemorise => (proposal.clone(), true),
                Decision::Replace {
                    correction,
                    memorise,
                } => (
                    ProposedCorrection {
                        correction,
                        ..proposal.clone()
                    },
                    memorise,
                ),
            };

            let (correction, memorise) = chosen;
            if memorise && self.memorise(&correction.original, &correction.correction)? {
                memorised += 1;
            }
            approved.push(correction);
        }

        Ok(ReviewOutcome {
            transcript: apply_approved(transcript, &approved),
            approved,
            memorised,
        })
    }
}

//! Company vocabulary used to steer correction and extraction prompts.
//!
//! The vocabulary file is a plain Markdown list grouped by level-2 headings:
//! ```markdown
//! ---
//! type: config
//! ---
//! ## Products
//! ### Access control
//! - HONOA
//! - HONOADOOR
//! ## People
//! - Anna Puig
//! ```
//! Level-3 headings only group terms visually; their terms belong to the enclosing
//! level-2 section.

use crate::constants::FRONT_MATTER_DELIMITER;
use crate::files::read_optional;
use crate::MinutesResult;
use std::path::Path;

/// Ordered `section → terms` mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    sections: Vec<(String, Vec<String>)>,
}

impl Vocabulary {
    pub fn parse(text: &str) -> Self {
        let mut vocabulary = Self::default();
        let mut lines = text.lines().peekable();

        if lines
            .peek()
            .is_some_and(|l| l.trim() == FRONT_MATTER_DELIMITER)
        {
            lines.next();
            for line in lines.by_ref() {
                if line.trim() == FRONT_MATTER_DELIMITER {
                    break;
                }
            }
        }

        let mut current: Option<usize> = None;
        for line in lines {
            if let Some(name) = line.strip_prefix("## ") {
                let name = name.trim();
                let index = match vocabulary.sections.iter().position(|(s, _)| s == name) {
                    Some(i) => i,
                    None => {
                        vocabulary.sections.push((name.to_string(), Vec::new()));
                        vocabulary.sections.len() - 1
                    }
                };
                current = Some(index);
            } else if line.starts_with("### ") {
                continue;
            } else if let (Some(term), Some(index)) = (line.strip_prefix("- "), current) {
                let term = term.trim();
                if !term.is_empty() {
                    vocabulary.sections[index].1.push(term.to_string());
                }
            }
        }
        vocabulary
    }

    /// Loads the vocabulary at `path`. A missing file is an empty vocabulary.
    pub fn load(path: &Path) -> MinutesResult<Self> {
        let vocabulary = read_optional(path)?
            .map(|text| Self::parse(&text))
            .unwrap_or_default();
        tracing::debug!(
            "loaded {} vocabulary terms from {}",
            vocabulary.term_count(),
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn sections(&self) -> &[(String, Vec<String>)] {
        &self.sections
    }

    pub fn term_count(&self) -> usize {
        self.sections.iter().map(|(_, terms)| terms.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.term_count() == 0
    }

    /// One `section: term, term` line per section, for prompts.
    pub fn prompt_text(&self) -> String {
        self.sections
            .iter()
            .map(|(section, terms)| format!("{section}: {}", terms.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ntype: config\n## Not a section\n---\n\n# Vocabulary\n\n- orphan\n## Products\n### Access control\n- HONOA\n-  HONOADOOR \n- \n## People\n- Anna Puig\n## Products\n- KAIMAI\n";

    #[test]
    fn test_parse_sections_and_terms() {
        let vocabulary = Vocabulary::parse(SAMPLE);
        assert_eq!(
            vocabulary.sections(),
            &[
                (
                    "Products".to_string(),
                    vec!["HONOA".to_string(), "HONOADOOR".to_string(), "KAIMAI".to_string()]
                ),
                ("People".to_string(), vec!["Anna Puig".to_string()]),
            ]
        );
        assert_eq!(vocabulary.term_count(), 4);
    }

    #[test]
    fn test_prompt_text() {
        let vocabulary = Vocabulary::parse(SAMPLE);
        assert_eq!(
            vocabulary.prompt_text(),
            "Products: HONOA, HONOADOOR, KAIMAI\nPeople: Anna Puig"
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let vocabulary = Vocabulary::load(&temp_dir.path().join("missing.md")).unwrap();
        assert!(vocabulary.is_empty());
        assert_eq!(vocabulary.prompt_text(), "");
    }
}

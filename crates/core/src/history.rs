//! Append-only history documents.
//!
//! A history document is a sequence of dated blocks:
//! ```markdown
//! # History
//!
//! ## 240108
//!
//! ### Door firmware (Closed)
//! - **240101:** shipped
//!
//! ## 240115
//!
//! - printer
//! ```
//! New blocks are always added after the existing content; nothing already written is
//! reordered or rewritten.

use crate::files::{read_optional, write_atomic};
use crate::markdown::TopicSection;
use crate::MinutesResult;
use std::path::Path;

/// Appends one dated block to the history document at `path`.
///
/// If the document does not exist yet it is created with a `# {document_title}` header.
/// Blank `content` is ignored so that no empty blocks are ever written.
///
/// # Arguments
///
/// * `path` - History document to append to
/// * `document_title` - Header used only when the document has to be created
/// * `block_title` - Title of the new level-2 block, usually a date label
/// * `content` - Block body
///
/// # Returns
///
/// `true` if a block was written.
pub fn append_history_block(
    path: &Path,
    document_title: &str,
    block_title: &str,
    content: &str,
) -> MinutesResult<bool> {
    let content = content.trim_end();
    if content.trim().is_empty() {
        tracing::debug!("skipping empty history block {block_title}");
        return Ok(false);
    }

    let mut text =
        read_optional(path)?.unwrap_or_else(|| format!("# {document_title}\n\n"));
    text.push_str(&format!("\n## {block_title}\n\n{content}\n"));
    write_atomic(path, &text)?;

    tracing::info!("appended block {block_title} to {}", path.display());
    Ok(true)
}

/// Renders archived topic sections as one block body: each heading followed by its
/// content, sections separated by a blank line.
pub fn render_archived(sections: &[TopicSection]) -> String {
    sections
        .iter()
        .map(|s| s.trimmed_lines().join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_document_with_header() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("History.md");

        assert!(append_history_block(&path, "History", "240115", "- x").unwrap());

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# History\n\n\n## 240115\n\n- x\n"
        );
    }

    #[test]
    fn test_append_never_rewrites_existing_blocks() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("History.md");
        std::fs::write(&path, "# History\n\n## 240101\n\nold\n").unwrap();

        append_history_block(&path, "History", "240108", "first\n\n").unwrap();
        append_history_block(&path, "History", "240108", "second").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# History\n\n## 240101\n\nold\n"));
        let first = text.find("first").unwrap();
        let second = text.find("second").unwrap();
        assert!(first < second);
        assert_eq!(text.matches("## 240108").count(), 2);
    }

    #[test]
    fn test_append_skips_blank_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("History.md");

        assert!(!append_history_block(&path, "History", "240115", " \n").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_render_archived() {
        let sections = vec![
            TopicSection {
                heading: "### B (Closed)".into(),
                title: "B (Closed)".into(),
                body: vec!["- note".into(), "".into()],
            },
            TopicSection {
                heading: "### C Closed".into(),
                title: "C Closed".into(),
                body: vec![],
            },
        ];
        assert_eq!(
            render_archived(&sections),
            "### B (Closed)\n- note\n\n### C Closed"
        );
    }
}

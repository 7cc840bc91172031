//! Heading-level structure of topic-tracking documents.
//!
//! A topic document is parsed into a flat sequence of [`Block`]s and rendered back to
//! text with [`TopicDocument::render`]. Only headings matter: list items, emphasis and
//! everything else are carried through as opaque lines.
//!
//! Document shape:
//! ```markdown
//! # Current state            <- preamble (anything before the first topic)
//!
//! ### Topic A                <- topic section, runs until the next heading of level <= 3
//! - **240108:** started
//!
//! ## Other topics            <- other-topics section, runs until the next heading of any level
//! - something new
//!
//! ## Appendix                <- tail (everything after the other-topics section)
//! ```
//!
//! Topic sections are only recognised before the other-topics section. Every line of the
//! input lands in exactly one block, so parse followed by render only normalises line
//! endings and the trailing newline.

use crate::config::Locale;

/// Heading level of a Markdown ATX heading line, if it is one.
///
/// A heading is one to six `#` characters at the very start of the line followed by a
/// space or the end of the line. `#tag` and `####### x` are not headings.
pub fn heading_level(line: &str) -> Option<usize> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    match line.as_bytes().get(level) {
        None | Some(b' ') | Some(b'\t') => Some(level),
        Some(_) => None,
    }
}

/// Text of a heading line with the markers and surrounding whitespace removed.
pub fn heading_text(line: &str) -> &str {
    line.trim_start_matches('#').trim()
}

/// Keywords that give headings their meaning in a topic document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionMarkers {
    /// Phrase an Other-Topics heading starts with.
    pub other_topics: String,
    /// Substring that marks a topic heading as closed. Case-sensitive.
    pub closed: String,
}

impl SectionMarkers {
    pub fn new(other_topics: impl Into<String>, closed: impl Into<String>) -> Self {
        Self {
            other_topics: other_topics.into(),
            closed: closed.into(),
        }
    }

    pub fn from_locale(locale: &Locale) -> Self {
        Self::new(locale.other_topics.clone(), locale.closed_marker.clone())
    }

    /// Classifies a single line. This is the only place heading semantics are decided.
    fn classify(&self, line: &str) -> LineKind {
        let Some(level) = heading_level(line) else {
            return LineKind::Text;
        };
        let text = heading_text(line);
        if text.starts_with(self.other_topics.as_str()) {
            LineKind::OtherTopics
        } else if level == 3 {
            LineKind::Topic
        } else {
            LineKind::Heading(level)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Text,
    Topic,
    OtherTopics,
    Heading(usize),
}

impl LineKind {
    /// Whether this line closes a topic section (or a loose block between topics).
    fn ends_topic(self) -> bool {
        match self {
            LineKind::Topic | LineKind::OtherTopics => true,
            LineKind::Heading(level) => level <= 3,
            LineKind::Text => false,
        }
    }

    /// Whether this line closes the other-topics section. A second other-topics
    /// heading does not; it is treated as content.
    fn ends_other_topics(self) -> bool {
        matches!(self, LineKind::Topic | LineKind::Heading(_))
    }
}

/// One open discussion item: a level-3 heading and the lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSection {
    /// The heading line exactly as written.
    pub heading: String,
    /// Heading text, trimmed. Topic identity; compared byte-for-byte.
    pub title: String,
    pub body: Vec<String>,
}

impl TopicSection {
    fn from_heading(line: &str) -> Self {
        Self {
            heading: line.to_string(),
            title: heading_text(line).to_string(),
            body: Vec::new(),
        }
    }

    pub fn is_closed(&self, marker: &str) -> bool {
        self.title.contains(marker)
    }

    /// Heading followed by body, with trailing blank lines dropped.
    pub fn trimmed_lines(&self) -> Vec<&str> {
        let end = last_content_index(&self.body).map_or(0, |i| i + 1);
        std::iter::once(self.heading.as_str())
            .chain(self.body[..end].iter().map(String::as_str))
            .collect()
    }
}

/// The catch-all bucket, fully replaced on every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherTopicsSection {
    pub heading: String,
    pub body: Vec<String>,
}

/// A structural piece of a topic document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Lines before the first topic or other-topics heading.
    Preamble(Vec<String>),
    Topic(TopicSection),
    /// A level 1-2 heading between topic sections, with its content.
    Loose(Vec<String>),
    OtherTopics(OtherTopicsSection),
    /// Everything after the other-topics section.
    Tail(Vec<String>),
}

impl Block {
    fn push(&mut self, line: &str) {
        let line = line.to_string();
        match self {
            Block::Preamble(lines) | Block::Loose(lines) | Block::Tail(lines) => lines.push(line),
            Block::Topic(section) => section.body.push(line),
            Block::OtherTopics(section) => section.body.push(line),
        }
    }

    fn write_lines<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Block::Preamble(lines) | Block::Loose(lines) | Block::Tail(lines) => {
                out.extend(lines.iter().map(String::as_str));
            }
            Block::Topic(section) => {
                out.push(&section.heading);
                out.extend(section.body.iter().map(String::as_str));
            }
            Block::OtherTopics(section) => {
                out.push(&section.heading);
                out.extend(section.body.iter().map(String::as_str));
            }
        }
    }
}

/// In-memory form of a topic-tracking document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicDocument {
    pub blocks: Vec<Block>,
}

impl TopicDocument {
    /// Parses document text into blocks.
    ///
    /// Parsing never fails: a document without topics is all preamble, and a document
    /// without an other-topics heading simply has no [`Block::OtherTopics`].
    pub fn parse(text: &str, markers: &SectionMarkers) -> Self {
        let mut blocks: Vec<Block> = Vec::new();
        let mut current: Option<Block> = None;
        let mut seen_other_topics = false;

        for line in text.lines() {
            let kind = markers.classify(line);

            if seen_other_topics {
                let closes_section =
                    matches!(current, Some(Block::OtherTopics(_))) && kind.ends_other_topics();
                if closes_section {
                    blocks.extend(current.take());
                    current = Some(Block::Tail(vec![line.to_string()]));
                } else if let Some(block) = current.as_mut() {
                    block.push(line);
                }
                continue;
            }

            match kind {
                LineKind::OtherTopics => {
                    blocks.extend(current.take());
                    seen_other_topics = true;
                    current = Some(Block::OtherTopics(OtherTopicsSection {
                        heading: line.to_string(),
                        body: Vec::new(),
                    }));
                }
                LineKind::Topic => {
                    blocks.extend(current.take());
                    current = Some(Block::Topic(TopicSection::from_heading(line)));
                }
                _ => {
                    let closes_topic =
                        matches!(current, Some(Block::Topic(_))) && kind.ends_topic();
                    if closes_topic {
                        blocks.extend(current.take());
                        current = Some(Block::Loose(vec![line.to_string()]));
                    } else if let Some(block) = current.as_mut() {
                        block.push(line);
                    } else {
                        current = Some(Block::Preamble(vec![line.to_string()]));
                    }
                }
            }
        }

        blocks.extend(current);
        Self { blocks }
    }

    /// Renders the document back to text, one `\n` after every line.
    pub fn render(&self) -> String {
        let lines = self.lines();
        if lines.is_empty() {
            return String::new();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// All lines in document order.
    pub fn lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.write_lines(&mut out);
        }
        out
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicSection> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Topic(section) => Some(section),
            _ => None,
        })
    }

    pub(crate) fn topics_mut(&mut self) -> impl Iterator<Item = &mut TopicSection> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Topic(section) => Some(section),
            _ => None,
        })
    }

    /// Titles of all topic sections, in document order.
    pub fn topic_titles(&self) -> Vec<String> {
        self.topics().map(|t| t.title.clone()).collect()
    }

    pub fn other_topics(&self) -> Option<&OtherTopicsSection> {
        self.blocks.iter().find_map(|block| match block {
            Block::OtherTopics(section) => Some(section),
            _ => None,
        })
    }
}

/// Index of the last non-blank line, if any.
pub(crate) fn last_content_index(lines: &[String]) -> Option<usize> {
    lines.iter().rposition(|l| !l.trim().is_empty())
}

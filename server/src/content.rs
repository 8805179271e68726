//! Article bodies use a small line-oriented subset of markdown. Each physical
//! line becomes exactly one block; inline syntax is left as literal text and
//! escaped by the templates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block<'a> {
    Heading { level: u8, content: &'a str },
    Blockquote { content: &'a str },
    LineBreak,
    Paragraph { content: &'a str },
}

const HEADING_PREFIXES: [(&str, u8); 3] = [("### ", 3), ("## ", 2), ("# ", 1)];

fn classify(line: &str) -> Block<'_> {
    let line = line.trim();

    for (prefix, level) in HEADING_PREFIXES {
        if let Some(content) = line.strip_prefix(prefix) {
            return Block::Heading { level, content };
        }
    }

    if let Some(content) = line.strip_prefix("> ") {
        Block::Blockquote { content }
    } else if line.is_empty() {
        Block::LineBreak
    } else {
        Block::Paragraph { content: line }
    }
}

pub fn render(source: &str) -> impl Iterator<Item = Block<'_>> + Clone {
    source.split('\n').map(classify)
}

/// The first paragraph of `source`, cut to `max_chars` characters.
pub fn excerpt(source: &str, max_chars: usize) -> Option<String> {
    let paragraph = render(source).find_map(|block| match block {
        Block::Paragraph { content } => Some(content),
        _ => None,
    })?;

    if paragraph.chars().count() <= max_chars {
        return Some(paragraph.to_string());
    }

    let mut truncated = paragraph
        .chars()
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string();
    truncated.push('…');
    Some(truncated)
}

//! Table fragment detection: partition a Markdown document into prose and
//! table fragments.
//!
//! A table block is a pipe row (the header), immediately followed by a
//! separator row whose cells are made of dashes, followed by any number of
//! further pipe rows. The block ends at the first line that is not a pipe
//! row, or at end of input.
//!
//! The partition is lossless: concatenating the `content` of every fragment
//! in order reproduces the input byte for byte. Table fragments own their
//! trailing line break so the prose that follows starts on a fresh line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prose or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Prose,
    Table,
}

/// Identity of a fragment within one assembled document.
///
/// Derived from the fragment's start offset at split time. Once assigned it
/// is never recomputed, so editing one table (and changing its length) does
/// not change the identity of any other fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId {
    pub kind: FragmentKind,
    /// Byte offset of the fragment in the document it was split from.
    pub offset: usize,
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FragmentKind::Prose => write!(f, "md-{}", self.offset),
            FragmentKind::Table => write!(f, "tbl-{}", self.offset),
        }
    }
}

/// A contiguous slice of an assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFragment {
    pub id: FragmentId,
    pub kind: FragmentKind,
    pub content: String,
}

impl DocumentFragment {
    fn new(kind: FragmentKind, offset: usize, content: &str) -> Self {
        Self {
            id: FragmentId { kind, offset },
            kind,
            content: content.to_string(),
        }
    }

    pub fn is_table(&self) -> bool {
        self.kind == FragmentKind::Table
    }
}

/// Split `document` into an ordered sequence of prose and table fragments.
///
/// An empty document yields no fragments; a document without tables yields
/// exactly one prose fragment.
pub fn split(document: &str) -> Vec<DocumentFragment> {
    let lines = line_spans(document);
    let mut fragments = Vec::new();
    let mut prose_start = 0usize;
    let mut i = 0usize;

    while i < lines.len() {
        let (start, _) = lines[i];
        let is_block_start = i + 1 < lines.len()
            && is_pipe_row(line_text(document, lines[i]))
            && is_separator_row(line_text(document, lines[i + 1]));

        if !is_block_start {
            i += 1;
            continue;
        }

        let mut j = i + 2;
        while j < lines.len() && is_pipe_row(line_text(document, lines[j])) {
            j += 1;
        }
        let end = lines[j - 1].1;

        if start > prose_start {
            fragments.push(DocumentFragment::new(
                FragmentKind::Prose,
                prose_start,
                &document[prose_start..start],
            ));
        }
        fragments.push(DocumentFragment::new(
            FragmentKind::Table,
            start,
            &document[start..end],
        ));
        prose_start = end;
        i = j;
    }

    if prose_start < document.len() {
        fragments.push(DocumentFragment::new(
            FragmentKind::Prose,
            prose_start,
            &document[prose_start..],
        ));
    }

    fragments
}

/// Byte spans `(start, end)` of every line, each including its terminator.
fn line_spans(document: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for piece in document.split_inclusive('\n') {
        spans.push((start, start + piece.len()));
        start += piece.len();
    }
    spans
}

/// Line content without its terminator.
fn line_text(document: &str, (start, end): (usize, usize)) -> &str {
    document[start..end].trim_end_matches(['\n', '\r'])
}

/// A line that begins and ends with `|` (surrounding whitespace ignored).
pub fn is_pipe_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// A pipe row whose cells are made of dashes only: `|---|---|`,
/// `| --- | --- |`. Padding around a cell is ignored; alignment colons are
/// not accepted.
pub fn is_separator_row(line: &str) -> bool {
    if !is_pipe_row(line) {
        return false;
    }
    let trimmed = line.trim();
    let inner = &trimmed[1..trimmed.len() - 1];
    inner.split('|').all(|cell| {
        let cell = cell.trim();
        !cell.is_empty() && cell.chars().all(|c| c == '-')
    })
}

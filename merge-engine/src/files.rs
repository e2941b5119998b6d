//! File reading and content utilities shared across the engine.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use similar::TextDiff;

use crate::error::ParseError;

pub const CONFLICT_MARKER_MINE: &str = "<<<<<<<";
pub const CONFLICT_MARKER_BASE: &str = "|||||||";
pub const CONFLICT_MARKER_CHANGE: &str = "=======";
pub const CONFLICT_MARKER_YOURS: &str = ">>>>>>>";

pub const MINE_LABEL: &str = "MINE";
pub const BASE_LABEL: &str = "BASE";
pub const YOURS_LABEL: &str = "YOURS";

/// Reads a file as UTF-8 source text.
pub fn read_file_content(path: &Path) -> Result<String, ParseError> {
    let bytes =
        fs::read(path).map_err(|_| ParseError::MissingFile(path.to_path_buf()))?;
    let text =
        String::from_utf8(bytes).map_err(|_| ParseError::Encoding(path.to_path_buf()))?;
    // Strip a UTF-8 BOM if present.
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Reads a file, treating missing or unreadable inputs as empty.
pub fn read_file_or_empty(path: &Path) -> String {
    read_file_content(path).unwrap_or_default()
}

/// Collapses content into a single line with all whitespace removed; the
/// canonical comparison form used everywhere bodies are compared.
pub fn normalized_single_line(content: &str) -> String {
    content.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Character-level similarity of two contents in `[0, 1]`.
pub fn content_similarity(a: &str, b: &str) -> f32 {
    TextDiff::from_chars(a, b).ratio()
}

/// Does `content` contain (the opening marker of) a merge conflict?
pub fn has_conflict_markers(content: &str) -> bool {
    content.contains(CONFLICT_MARKER_MINE)
}

/// One conflict block extracted from merged text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub left: String,
    pub base: String,
    pub right: String,
}

/// Renders a conflict block in the conventional layout. The base section is
/// emitted only when `show_base` is set.
pub fn format_conflict(left: &str, base: &str, right: &str, show_base: bool) -> String {
    let mut out = String::new();
    out.push_str(CONFLICT_MARKER_MINE);
    out.push(' ');
    out.push_str(MINE_LABEL);
    out.push('\n');
    push_section(&mut out, left);
    if show_base {
        out.push_str(CONFLICT_MARKER_BASE);
        out.push(' ');
        out.push_str(BASE_LABEL);
        out.push('\n');
        push_section(&mut out, base);
    }
    out.push_str(CONFLICT_MARKER_CHANGE);
    out.push('\n');
    push_section(&mut out, right);
    out.push_str(CONFLICT_MARKER_YOURS);
    out.push(' ');
    out.push_str(YOURS_LABEL);
    out
}

fn push_section(out: &mut String, section: &str) {
    if !section.is_empty() {
        out.push_str(section);
        if !section.ends_with('\n') {
            out.push('\n');
        }
    }
}

/// Extracts every conflict block from `content`, in order of appearance.
pub fn extract_merge_conflicts(content: &str) -> Vec<MergeConflict> {
    enum State {
        Outside,
        InLeft,
        InBase,
        InRight,
    }

    let mut conflicts = Vec::new();
    let mut state = State::Outside;
    let (mut left, mut base, mut right) = (Vec::new(), Vec::new(), Vec::new());

    for line in content.lines() {
        let trimmed = line.trim_start();
        match state {
            State::Outside => {
                if trimmed.starts_with(CONFLICT_MARKER_MINE) {
                    state = State::InLeft;
                }
            }
            State::InLeft => {
                if trimmed.starts_with(CONFLICT_MARKER_BASE) {
                    state = State::InBase;
                } else if trimmed.starts_with(CONFLICT_MARKER_CHANGE) {
                    state = State::InRight;
                } else {
                    left.push(line);
                }
            }
            State::InBase => {
                if trimmed.starts_with(CONFLICT_MARKER_CHANGE) {
                    state = State::InRight;
                } else {
                    base.push(line);
                }
            }
            State::InRight => {
                if trimmed.starts_with(CONFLICT_MARKER_YOURS) {
                    conflicts.push(MergeConflict {
                        left: left.join("\n"),
                        base: base.join("\n"),
                        right: right.join("\n"),
                    });
                    left.clear();
                    base.clear();
                    right.clear();
                    state = State::Outside;
                } else {
                    right.push(line);
                }
            }
        }
    }

    conflicts
}

/// Line comparison key: the line itself, or its whitespace-stripped form.
pub(crate) fn line_key(line: &str, ignore_whitespace: bool) -> Cow<'_, str> {
    if ignore_whitespace {
        Cow::Owned(normalized_single_line(line))
    } else {
        Cow::Borrowed(line)
    }
}

use super::discussion::DiscussionThread;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Line code identifier (`<file_hash>_<old>_<new>`, or with a `_match` suffix).
pub type LineCode = String;

/// Old/new line number pair used for position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineNumbers {
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

impl LineNumbers {
    pub fn new(old_line: u32, new_line: u32) -> Self {
        Self {
            old_line: Some(old_line),
            new_line: Some(new_line),
        }
    }
}

/// Where a match line's fold ends: the nearest known real line beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub old_pos: u32,
    pub new_pos: u32,
}

impl From<MatchMetadata> for LineNumbers {
    fn from(meta: MatchMetadata) -> Self {
        LineNumbers::new(meta.old_pos, meta.new_pos)
    }
}

/// Kind of a real content line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[default]
    Context,
    /// Present only in the new version
    Added,
    /// Present only in the old version
    Removed,
    /// Added line marked "no newline at end of file"
    AddedNoNewline,
    /// Removed line marked "no newline at end of file"
    RemovedNoNewline,
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => write!(f, "context"),
            Self::Added => write!(f, "new"),
            Self::Removed => write!(f, "old"),
            Self::AddedNoNewline => write!(f, "new-nonewline"),
            Self::RemovedNoNewline => write!(f, "old-nonewline"),
        }
    }
}

impl FromStr for LineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "context" | "unchanged" => Ok(Self::Context),
            "new" | "added" => Ok(Self::Added),
            "old" | "removed" => Ok(Self::Removed),
            "new-nonewline" | "new_nonewline" => Ok(Self::AddedNoNewline),
            "old-nonewline" | "old_nonewline" => Ok(Self::RemovedNoNewline),
            other => Err(format!("unknown line type: {other}")),
        }
    }
}

/// A real content line of a diff file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLine {
    pub line_code: LineCode,
    pub kind: LineKind,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
    /// Highlighted text with the leading diff marker removed.
    pub rich_text: String,
    pub discussions: Vec<DiscussionThread>,
    pub discussions_expanded: bool,
    /// Transient comment form visibility.
    pub has_form: bool,
    pub comments_disabled: bool,
}

impl ContentLine {
    pub fn new(line_code: LineCode, kind: LineKind, numbers: LineNumbers, rich_text: String) -> Self {
        Self {
            line_code,
            kind,
            old_line: numbers.old_line,
            new_line: numbers.new_line,
            rich_text,
            discussions: Vec::new(),
            discussions_expanded: true,
            has_form: false,
            comments_disabled: false,
        }
    }
}

/// Placeholder standing in for folded-away context lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchLine {
    pub line_code: LineCode,
    /// Hunk header text shown in place of the folded lines.
    pub rich_text: String,
    pub meta: MatchMetadata,
}

impl MatchLine {
    pub fn new(file_hash: &str, meta: MatchMetadata, rich_text: String) -> Self {
        Self {
            line_code: match_line_code(file_hash, meta),
            rich_text,
            meta,
        }
    }
}

/// One entry of a line representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffLine {
    Content(ContentLine),
    Match(MatchLine),
}

impl DiffLine {
    pub fn line_code(&self) -> &str {
        match self {
            DiffLine::Content(line) => &line.line_code,
            DiffLine::Match(line) => &line.line_code,
        }
    }

    pub fn old_line(&self) -> Option<u32> {
        match self {
            DiffLine::Content(line) => line.old_line,
            DiffLine::Match(_) => None,
        }
    }

    pub fn new_line(&self) -> Option<u32> {
        match self {
            DiffLine::Content(line) => line.new_line,
            DiffLine::Match(_) => None,
        }
    }

    pub fn numbers(&self) -> LineNumbers {
        LineNumbers {
            old_line: self.old_line(),
            new_line: self.new_line(),
        }
    }

    /// Position lookup: a content line sitting at exactly these numbers.
    pub fn is_at(&self, numbers: LineNumbers) -> bool {
        !self.is_match() && self.numbers() == numbers
    }

    pub fn is_match(&self) -> bool {
        matches!(self, DiffLine::Match(_))
    }

    pub fn as_content(&self) -> Option<&ContentLine> {
        match self {
            DiffLine::Content(line) => Some(line),
            DiffLine::Match(_) => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentLine> {
        match self {
            DiffLine::Content(line) => Some(line),
            DiffLine::Match(_) => None,
        }
    }

    pub fn as_match(&self) -> Option<&MatchLine> {
        match self {
            DiffLine::Match(line) => Some(line),
            DiffLine::Content(_) => None,
        }
    }

    pub fn discussions(&self) -> &[DiscussionThread] {
        match self {
            DiffLine::Content(line) => &line.discussions,
            DiffLine::Match(_) => &[],
        }
    }
}

/// A side-by-side row. Either side may be absent (pure insertion/deletion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelLine {
    pub line_code: LineCode,
    pub left: Option<DiffLine>,
    pub right: Option<DiffLine>,
}

impl ParallelLine {
    /// Context lines are identical on both sides.
    pub fn mirrored(line: DiffLine) -> Self {
        Self {
            line_code: line.line_code().to_string(),
            left: Some(line.clone()),
            right: Some(line),
        }
    }

    /// Row lookup mirrors the inline one: old number on the left, new on the right.
    pub fn is_at(&self, numbers: LineNumbers) -> bool {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => {
                !left.is_match()
                    && left.old_line() == numbers.old_line
                    && right.new_line() == numbers.new_line
            }
            _ => false,
        }
    }

    pub fn is_match(&self) -> bool {
        self.left.as_ref().is_some_and(DiffLine::is_match)
            || self.right.as_ref().is_some_and(DiffLine::is_match)
    }

    pub fn sides(&self) -> impl Iterator<Item = &DiffLine> {
        self.left.iter().chain(self.right.iter())
    }

    pub fn sides_mut(&mut self) -> impl Iterator<Item = &mut DiffLine> {
        self.left.iter_mut().chain(self.right.iter_mut())
    }
}

/// Line code for a real line. Missing numbers are rendered as `0`.
pub fn line_code_for(file_hash: &str, numbers: LineNumbers) -> LineCode {
    format!(
        "{}_{}_{}",
        file_hash,
        numbers.old_line.unwrap_or(0),
        numbers.new_line.unwrap_or(0)
    )
}

pub fn match_line_code(file_hash: &str, meta: MatchMetadata) -> LineCode {
    format!("{}_{}_{}_match", file_hash, meta.old_pos, meta.new_pos)
}

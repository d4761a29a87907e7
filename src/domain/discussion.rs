use super::line::LineCode;
use serde::{Deserialize, Serialize};

/// How a position anchors into the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    #[default]
    Text,
    /// File-level thread, not attached to a line
    File,
    Image,
}

/// One end of a multi-line range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRangeEnd {
    #[serde(default)]
    pub line_code: Option<LineCode>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub old_line: Option<u32>,
    #[serde(default)]
    pub new_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRange {
    #[serde(default)]
    pub start: LineRangeEnd,
    #[serde(default)]
    pub end: LineRangeEnd,
}

/// Normalized snapshot of where a thread (or a loaded line) sits in a diff version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffPosition {
    #[serde(default)]
    pub base_sha: Option<String>,
    #[serde(default)]
    pub start_sha: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub old_line: Option<u32>,
    #[serde(default)]
    pub new_line: Option<u32>,
    #[serde(default)]
    pub position_type: PositionType,
    /// Not reliably populated server-side; ignored by [`DiffPosition::same_location`].
    #[serde(default)]
    pub line_range: Option<LineRange>,
}

impl DiffPosition {
    /// Equality on every field except `line_range`.
    pub fn same_location(&self, other: &DiffPosition) -> bool {
        self.without_line_range() == other.without_line_range()
    }

    fn without_line_range(&self) -> DiffPosition {
        DiffPosition {
            line_range: None,
            ..self.clone()
        }
    }
}

/// Reference from a thread to the diff file it was made on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscussionFileRef {
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
}

/// A discussion thread owned by the discussions collaborator.
///
/// The engine reads these and copies them onto the lines they apply to; it
/// never changes thread content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscussionThread {
    pub id: String,
    #[serde(default)]
    pub diff_discussion: bool,
    #[serde(default)]
    pub diff_file: Option<DiscussionFileRef>,
    #[serde(default)]
    pub line_code: Option<LineCode>,
    #[serde(default)]
    pub line_codes: Vec<LineCode>,
    #[serde(default)]
    pub position: Option<DiffPosition>,
    #[serde(default)]
    pub original_position: Option<DiffPosition>,
    #[serde(default)]
    pub positions: Vec<DiffPosition>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
    /// File-level expansion state, toggled per thread.
    #[serde(default = "default_active")]
    pub expanded_on_diff: bool,
}

fn default_active() -> bool {
    true
}

impl DiscussionThread {
    pub fn file_hash(&self) -> Option<&str> {
        self.diff_file.as_ref().map(|file| file.file_hash.as_str())
    }

    pub fn is_file_level(&self) -> bool {
        self.position
            .as_ref()
            .is_some_and(|position| position.position_type == PositionType::File)
    }

    /// Line codes this thread may attach to.
    pub fn candidate_line_codes(&self) -> Vec<&str> {
        let original_start = self
            .original_position
            .as_ref()
            .and_then(|position| position.line_range.as_ref())
            .and_then(|range| range.start.line_code.as_deref());

        self.line_code
            .as_deref()
            .into_iter()
            .chain(original_start)
            .chain(self.line_codes.iter().map(String::as_str))
            .collect()
    }

    /// True when `fragment` is `note_<id>` for one of this thread's notes.
    pub fn targets_note(&self, fragment: Option<&str>) -> bool {
        let Some(fragment) = fragment else {
            return false;
        };
        self.notes
            .iter()
            .any(|note| fragment.strip_prefix("note_") == Some(note.id.as_str()))
    }
}

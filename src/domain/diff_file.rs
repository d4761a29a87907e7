use super::discussion::DiscussionThread;
use super::line::{DiffLine, LineNumbers, ParallelLine};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a diff file, independent of content.
pub type FileHash = String;

/// Revision identifiers of the diff version a file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffRefs {
    #[serde(default)]
    pub base_sha: Option<String>,
    #[serde(default)]
    pub start_sha: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Viewer type reported by the server (`text`, `image`, `no_preview`, ...).
    #[serde(default = "default_viewer_name")]
    pub name: String,
    #[serde(default)]
    pub collapsed: bool,
}

fn default_viewer_name() -> String {
    Viewer::TEXT.to_string()
}

impl Viewer {
    pub const TEXT: &'static str = "text";

    pub fn is_text(&self) -> bool {
        self.name == Self::TEXT
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            name: default_viewer_name(),
            collapsed: false,
        }
    }
}

/// Which line representation the reviewer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffViewType {
    #[default]
    Inline,
    Parallel,
}

impl fmt::Display for DiffViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for DiffViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "parallel" | "side-by-side" | "side_by_side" => Ok(Self::Parallel),
            other => Err(format!("unknown diff view type: {other}")),
        }
    }
}

/// One changed file, as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffFile {
    pub file_hash: FileHash,
    /// Identity of the blob pairing; part of the dedup key.
    pub content_sha: String,
    pub old_path: String,
    pub new_path: String,
    pub new_file: bool,
    pub deleted_file: bool,
    pub renamed_file: bool,
    pub added_lines: u32,
    pub removed_lines: u32,
    pub diff_refs: DiffRefs,
    pub viewer: Viewer,
    pub inline_lines: Vec<DiffLine>,
    pub side_by_side_lines: Vec<ParallelLine>,
    /// File-level threads (not attached to any line).
    pub discussions: Vec<DiscussionThread>,
    pub collapsed: bool,
    pub render_it: bool,
    pub is_loading_full_file: bool,
    pub is_showing_full_file: bool,
    /// Set while a streamed full-file expansion still has lines to apply.
    pub rendering_lines: bool,
    /// Endpoint for fetching context lines of this file.
    pub context_lines_path: Option<String>,
    /// Endpoint returning this file's collapsed (non full-file) diff.
    pub load_collapsed_diff_url: Option<String>,
}

impl DiffFile {
    pub fn registry_key(&self) -> String {
        format!("{}{}", self.content_sha, self.file_hash)
    }

    pub fn has_lines(&self) -> bool {
        !self.inline_lines.is_empty() || !self.side_by_side_lines.is_empty()
    }

    pub fn visible_line_count(&self) -> usize {
        self.inline_lines.len().max(self.side_by_side_lines.len())
    }

    pub fn find_inline_index(&self, line_code: &str) -> Option<usize> {
        self.inline_lines
            .iter()
            .position(|line| line.line_code() == line_code)
    }

    pub fn inline_index_at(&self, numbers: LineNumbers) -> Option<usize> {
        self.inline_lines.iter().position(|line| line.is_at(numbers))
    }

    pub fn side_by_side_index_at(&self, numbers: LineNumbers) -> Option<usize> {
        self.side_by_side_lines
            .iter()
            .position(|line| line.is_at(numbers))
    }

    /// Iterates every line in both representations.
    pub fn all_lines_mut(&mut self) -> impl Iterator<Item = &mut DiffLine> {
        self.inline_lines.iter_mut().chain(
            self.side_by_side_lines
                .iter_mut()
                .flat_map(ParallelLine::sides_mut),
        )
    }
}

//! Wire shapes returned by the transport, before normalization.
//!
//! Everything is optional here: records are accepted permissively and the
//! normalizer turns them into the typed [`DiffFile`](super::DiffFile) model.

use super::diff_file::{DiffRefs, DiffViewType, Viewer};
use serde::{Deserialize, Serialize};

/// Raw `type` value the server uses for fold placeholders.
pub const MATCH_LINE_TYPE: &str = "match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatchMeta {
    pub old_pos: u32,
    pub new_pos: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default)]
    pub line_code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub old_line: Option<u32>,
    #[serde(default)]
    pub new_line: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rich_text: Option<String>,
    #[serde(default)]
    pub meta_data: Option<RawMatchMeta>,
}

impl RawLine {
    pub fn is_match(&self) -> bool {
        self.kind.as_deref() == Some(MATCH_LINE_TYPE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParallelLine {
    #[serde(default)]
    pub left: Option<RawLine>,
    #[serde(default)]
    pub right: Option<RawLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDiffFile {
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(default)]
    pub content_sha: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub added_lines: u32,
    #[serde(default)]
    pub removed_lines: u32,
    #[serde(default)]
    pub diff_refs: Option<DiffRefs>,
    #[serde(default)]
    pub viewer: Option<Viewer>,
    #[serde(default)]
    pub highlighted_diff_lines: Option<Vec<RawLine>>,
    #[serde(default)]
    pub parallel_diff_lines: Option<Vec<RawParallelLine>>,
    #[serde(default)]
    pub context_lines_path: Option<String>,
    #[serde(default)]
    pub load_collapsed_diff_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// `None` means the total is unknown; the loader stops after the current page.
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One page of the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub diff_files: Vec<RawDiffFile>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Response of the single linked-file endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleFileResponse {
    #[serde(default)]
    pub diff_files: Vec<RawDiffFile>,
}

/// Query for one batch page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// File offset of the first file in this page.
    pub page: u32,
    pub per_page: u32,
    pub view: DiffViewType,
}

/// Query for context lines of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesRequest {
    pub since: u32,
    pub to: u32,
    pub bottom: bool,
    pub offset: i64,
    pub unfold: bool,
    /// Request the whole blob instead of a range.
    #[serde(default)]
    pub full: bool,
}

use super::diff_file::FileHash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeEntryKind {
    Blob,
    Tree,
}

/// Metadata carried only by file (blob) entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub file_hash: FileHash,
    pub added_lines: u32,
    pub removed_lines: u32,
    pub deleted: bool,
    /// Set for files that only exist in the new version.
    pub temp_file: bool,
}

/// A node of the changed-files tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Full path. A collapsed directory keeps the path of its outermost segment.
    pub path: String,
    /// Display label, possibly several joined segments.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
    pub tree: Vec<TreeEntry>,
    pub blob: Option<BlobInfo>,
}

impl TreeEntry {
    pub fn is_tree(&self) -> bool {
        self.kind == TreeEntryKind::Tree
    }

    pub fn file_hash(&self) -> Option<&str> {
        self.blob.as_ref().map(|blob| blob.file_hash.as_str())
    }
}

/// Result of building a tree from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTree {
    /// Top-level entries.
    pub tree: Vec<TreeEntry>,
    /// Every blob keyed by its full path.
    pub entries: HashMap<String, BlobInfo>,
    /// Blob paths in tree display order.
    pub blobs: Vec<String>,
}

impl FileTree {
    pub fn file_hash_for_path(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(|blob| blob.file_hash.as_str())
    }
}

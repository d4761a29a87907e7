//! The file registry: owns every loaded [`DiffFile`] and folds new arrivals into it.

use super::normalize::normalize_file;
use crate::domain::{DiffFile, FileHash, RawDiffFile};
use crate::infra::app_config::EngineConfig;

/// Where a merged file ends up in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Batch arrivals move an already registered file to the end, in batch order.
    Batch,
    /// Out-of-band arrivals (linked file) merge where the file already is.
    InPlace,
}

#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Vec<DiffFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[DiffFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [DiffFile] {
        &mut self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn first(&self) -> Option<&DiffFile> {
        self.files.first()
    }

    pub fn get(&self, file_hash: &str) -> Option<&DiffFile> {
        self.files.iter().find(|file| file.file_hash == file_hash)
    }

    pub fn get_mut(&mut self, file_hash: &str) -> Option<&mut DiffFile> {
        self.files.iter_mut().find(|file| file.file_hash == file_hash)
    }

    pub fn position(&self, file_hash: &str) -> Option<usize> {
        self.files.iter().position(|file| file.file_hash == file_hash)
    }

    pub fn contains(&self, file_hash: &str) -> bool {
        self.position(file_hash).is_some()
    }

    pub fn find_by_path(&self, path: &str) -> Option<&DiffFile> {
        self.files.iter().find(|file| file.new_path == path)
    }

    /// Normalizes and merges a batch of raw records. Returns the hashes of the
    /// merged files in arrival order.
    pub fn merge_batch(
        &mut self,
        raw_files: Vec<RawDiffFile>,
        config: &EngineConfig,
        placement: Placement,
    ) -> Vec<FileHash> {
        raw_files
            .into_iter()
            .map(|raw| self.merge_file(normalize_file(raw, config), placement))
            .collect()
    }

    pub fn merge_file(&mut self, incoming: DiffFile, placement: Placement) -> FileHash {
        let file_hash = incoming.file_hash.clone();
        let Some(index) = self.position(&file_hash) else {
            log::debug!("Registering diff file {} ({})", incoming.new_path, file_hash);
            self.files.push(incoming);
            return file_hash;
        };

        let existing = &self.files[index];
        let merged = if same_content(existing, &incoming) {
            log::debug!("Merging repeated arrival of {}", existing.registry_key());
            merge_two_files(existing.clone(), incoming)
        } else {
            log::debug!(
                "Replacing {} with new content {}",
                existing.registry_key(),
                incoming.registry_key()
            );
            incoming
        };

        match placement {
            Placement::Batch => {
                self.files.remove(index);
                self.files.push(merged);
            }
            Placement::InPlace => self.files[index] = merged,
        }
        file_hash
    }

    pub fn set_file_collapsed(&mut self, file_hash: &str, collapsed: bool) -> bool {
        let Some(file) = self.get_mut(file_hash) else {
            return false;
        };
        file.collapsed = collapsed;
        true
    }

    pub fn set_all_files_collapsed(&mut self, collapsed: bool) {
        for file in &mut self.files {
            file.collapsed = collapsed;
        }
    }

    pub fn set_render_it(&mut self, file_hash: &str) -> bool {
        let Some(file) = self.get_mut(file_hash) else {
            return false;
        };
        file.render_it = true;
        true
    }
}

/// An empty content sha on either side is a metadata-only record of the same file.
fn same_content(existing: &DiffFile, incoming: &DiffFile) -> bool {
    existing.content_sha == incoming.content_sha
        || existing.content_sha.is_empty()
        || incoming.content_sha.is_empty()
}

/// Field-level merge of two arrivals of the same key. Line collections
/// already loaded win over incoming ones; render hints always follow the
/// latest arrival.
pub fn merge_two_files(existing: DiffFile, incoming: DiffFile) -> DiffFile {
    let inline_lines = if existing.inline_lines.is_empty() {
        incoming.inline_lines
    } else {
        existing.inline_lines
    };
    let side_by_side_lines = if existing.side_by_side_lines.is_empty() {
        incoming.side_by_side_lines
    } else {
        existing.side_by_side_lines
    };
    let content_sha = if existing.content_sha.is_empty() {
        incoming.content_sha
    } else {
        existing.content_sha
    };

    DiffFile {
        inline_lines,
        side_by_side_lines,
        content_sha,
        render_it: incoming.render_it,
        collapsed: incoming.collapsed,
        context_lines_path: existing.context_lines_path.or(incoming.context_lines_path),
        load_collapsed_diff_url: existing
            .load_collapsed_diff_url
            .or(incoming.load_collapsed_diff_url),
        ..existing
    }
}

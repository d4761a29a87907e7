//! Builds the compact changed-files tree shown next to the diff.

use crate::domain::{BlobInfo, DiffFile, FileTree, TreeEntry, TreeEntryKind};
use std::cmp::Ordering;
use std::collections::HashMap;

const ELLIPSIS: &str = "...";
const MAX_TRUNCATION_PASSES: usize = 100;

/// Builds the tree from registry order, collapses single-directory chains
/// and sorts every level (directories first, then by name).
pub fn build_file_tree(files: &[DiffFile], max_name_width: usize) -> FileTree {
    let mut root: Vec<TreeEntry> = Vec::new();
    for file in files {
        insert_path(&mut root, file);
    }

    let mut tree = collapse_single_folders(root, max_name_width);
    sort_entries(&mut tree);

    let mut entries = HashMap::new();
    let mut blobs = Vec::new();
    collect_blobs(&tree, &mut entries, &mut blobs);

    log::debug!("Built file tree with {} blobs", blobs.len());
    FileTree {
        tree,
        entries,
        blobs,
    }
}

fn insert_path(root: &mut Vec<TreeEntry>, file: &DiffFile) {
    let segments: Vec<&str> = file
        .new_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let Some((last, dirs)) = segments.split_last() else {
        return;
    };

    let mut level = root;
    let mut path = String::new();
    for segment in dirs {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(segment);

        let index = match level.iter().position(|entry| entry.is_tree() && entry.path == path) {
            Some(index) => index,
            None => {
                level.push(TreeEntry {
                    path: path.clone(),
                    name: segment.to_string(),
                    kind: TreeEntryKind::Tree,
                    tree: Vec::new(),
                    blob: None,
                });
                level.len() - 1
            }
        };
        level = &mut level[index].tree;
    }

    let blob_path = if path.is_empty() {
        last.to_string()
    } else {
        format!("{path}/{last}")
    };
    if level.iter().any(|entry| entry.path == blob_path) {
        return;
    }
    level.push(TreeEntry {
        path: blob_path,
        name: last.to_string(),
        kind: TreeEntryKind::Blob,
        tree: Vec::new(),
        blob: Some(BlobInfo {
            file_hash: file.file_hash.clone(),
            added_lines: file.added_lines,
            removed_lines: file.removed_lines,
            deleted: file.deleted_file,
            temp_file: file.new_file,
        }),
    });
}

/// A directory whose only child is a directory absorbs it, repeatedly. The
/// absorbed names are joined into the display name; the path stays the
/// outermost one.
fn collapse_single_folders(entries: Vec<TreeEntry>, max_name_width: usize) -> Vec<TreeEntry> {
    entries
        .into_iter()
        .map(|mut entry| {
            if entry.is_tree() && is_single_folder(&entry.tree) {
                let mut names = vec![std::mem::take(&mut entry.name)];
                let mut children = std::mem::take(&mut entry.tree);
                while is_single_folder(&children) {
                    let Some(child) = children.pop() else {
                        break;
                    };
                    names.push(child.name);
                    children = child.tree;
                }
                entry.name = truncate_folder_path(&names.join("/"), max_name_width);
                entry.tree = children;
            }
            entry.tree = collapse_single_folders(std::mem::take(&mut entry.tree), max_name_width);
            entry
        })
        .collect()
}

fn is_single_folder(children: &[TreeEntry]) -> bool {
    children.len() == 1 && children[0].is_tree()
}

/// Shortens a joined folder name by replacing middle segments with `...`
/// until it fits in `max_width` characters.
pub fn truncate_folder_path(path: &str, max_width: usize) -> String {
    let mut text = path.to_string();
    let mut passes = 0;
    while text.chars().count() > max_width && passes < MAX_TRUNCATION_PASSES {
        let mut segments: Vec<&str> = text
            .split('/')
            .filter(|segment| *segment != ELLIPSIS)
            .collect();
        if segments.is_empty() {
            return ELLIPSIS.to_string();
        }
        let middle = segments.len() / 2;
        segments[middle] = ELLIPSIS;
        text = segments.join("/");
        passes += 1;
    }
    text
}

fn sort_entries(entries: &mut [TreeEntry]) {
    entries.sort_by(|a, b| match (a.is_tree(), b.is_tree()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
    for entry in entries.iter_mut() {
        sort_entries(&mut entry.tree);
    }
}

fn collect_blobs(entries: &[TreeEntry], index: &mut HashMap<String, BlobInfo>, order: &mut Vec<String>) {
    for entry in entries {
        match &entry.blob {
            Some(blob) => {
                index.insert(entry.path.clone(), blob.clone());
                order.push(entry.path.clone());
            }
            None => collect_blobs(&entry.tree, index, order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalize::normalize_file;
    use crate::domain::RawDiffFile;
    use crate::infra::app_config::EngineConfig;

    fn files(paths: &[&str]) -> Vec<DiffFile> {
        paths
            .iter()
            .map(|path| {
                normalize_file(
                    RawDiffFile {
                        new_path: Some(path.to_string()),
                        added_lines: 3,
                        new_file: path.ends_with("new.rb"),
                        ..Default::default()
                    },
                    &EngineConfig::default(),
                )
            })
            .collect()
    }

    fn names(entries: &[TreeEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn test_branching_directories_are_not_collapsed() {
        let tree = build_file_tree(&files(&["a/b/c.rb", "a/b/d.rb", "a/e.rb"]), 40);

        assert_eq!(names(&tree.tree), vec!["a"]);
        let a = &tree.tree[0];
        assert_eq!(names(&a.tree), vec!["b", "e.rb"]);
        assert_eq!(a.tree[0].path, "a/b");
        assert_eq!(names(&a.tree[0].tree), vec!["c.rb", "d.rb"]);
        assert_eq!(tree.blobs, vec!["a/b/c.rb", "a/b/d.rb", "a/e.rb"]);
    }

    #[test]
    fn test_single_directory_chain_collapses() {
        let tree = build_file_tree(&files(&["a/b/c/x.rb", "a/b/c/y.rb", "z.rb"]), 40);

        assert_eq!(names(&tree.tree), vec!["a/b/c", "z.rb"]);
        let collapsed = &tree.tree[0];
        assert_eq!(collapsed.path, "a");
        assert!(collapsed.is_tree());
        assert_eq!(names(&collapsed.tree), vec!["x.rb", "y.rb"]);
    }

    #[test]
    fn test_chain_stops_at_a_single_file() {
        let tree = build_file_tree(&files(&["lib/tasks/new.rb"]), 40);
        assert_eq!(names(&tree.tree), vec!["lib/tasks"]);

        let blob = tree.entries.get("lib/tasks/new.rb").unwrap();
        assert!(blob.temp_file);
        assert_eq!(blob.added_lines, 3);
        assert_eq!(
            tree.file_hash_for_path("lib/tasks/new.rb"),
            Some(blob.file_hash.as_str())
        );
    }

    #[test]
    fn test_directories_sort_before_files() {
        let tree = build_file_tree(&files(&["b.rb", "z/one.rb", "a.rb", "z/two.rb", "m/x.rb", "m/y.rb"]), 40);
        assert_eq!(names(&tree.tree), vec!["m", "z", "a.rb", "b.rb"]);
        assert_eq!(tree.blobs[0], "m/x.rb");
    }

    #[test]
    fn test_long_collapsed_names_are_truncated_in_the_middle() {
        let path = "app/assets/javascripts/vue_shared/components/x.js";
        let tree = build_file_tree(&files(&[path]), 40);
        let name = &tree.tree[0].name;
        assert!(name.len() <= 40);
        assert!(name.contains("..."));
        assert!(name.starts_with("app/"));
        assert!(name.ends_with("/components"));
    }

    #[test]
    fn test_truncate_folder_path() {
        assert_eq!(truncate_folder_path("short/path", 40), "short/path");
        assert_eq!(truncate_folder_path("aaaa/bbbb/cccc", 13), "aaaa/.../cccc");
        assert_eq!(truncate_folder_path("abcdefghij", 5), "...");
    }
}

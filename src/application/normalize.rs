//! Converts raw wire records into the typed line model.

use crate::domain::{
    ContentLine, DiffFile, DiffLine, LineKind, LineNumbers, MatchLine, MatchMetadata,
    ParallelLine, RawDiffFile, RawLine, RawParallelLine, line_code_for,
};
use crate::infra::app_config::EngineConfig;
use crate::infra::hash::file_hash_for_path;

pub fn normalize_file(raw: RawDiffFile, config: &EngineConfig) -> DiffFile {
    let new_path = raw
        .new_path
        .or(raw.file_path)
        .or_else(|| raw.old_path.clone())
        .unwrap_or_default();
    let old_path = raw.old_path.unwrap_or_else(|| new_path.clone());
    let file_hash = raw
        .file_hash
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| file_hash_for_path(&new_path));
    let only_moved = raw.renamed_file && raw.added_lines == 0 && raw.removed_lines == 0;

    let inline_lines: Vec<DiffLine> = raw
        .highlighted_diff_lines
        .unwrap_or_default()
        .into_iter()
        .map(|line| normalize_line(line, &file_hash, only_moved))
        .collect();
    let side_by_side_lines: Vec<ParallelLine> = raw
        .parallel_diff_lines
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, pair)| normalize_pair(pair, index, &file_hash, only_moved))
        .collect();

    let viewer = raw.viewer.unwrap_or_default();
    let visible = inline_lines.len().max(side_by_side_lines.len());
    let render_it = visible < config.render_immediately_threshold;
    let collapsed = viewer.collapsed || (viewer.is_text() && visible > config.auto_collapse_threshold);

    DiffFile {
        file_hash,
        content_sha: raw.content_sha.unwrap_or_default(),
        old_path,
        new_path,
        new_file: raw.new_file,
        deleted_file: raw.deleted_file,
        renamed_file: raw.renamed_file,
        added_lines: raw.added_lines,
        removed_lines: raw.removed_lines,
        diff_refs: raw.diff_refs.unwrap_or_default(),
        viewer,
        inline_lines,
        side_by_side_lines,
        discussions: Vec::new(),
        collapsed,
        render_it,
        is_loading_full_file: false,
        is_showing_full_file: false,
        rendering_lines: false,
        context_lines_path: raw.context_lines_path,
        load_collapsed_diff_url: raw.load_collapsed_diff_url,
    }
}

pub fn normalize_line(raw: RawLine, file_hash: &str, only_moved: bool) -> DiffLine {
    if raw.is_match() {
        let meta = raw
            .meta_data
            .map(|meta| MatchMetadata {
                old_pos: meta.old_pos,
                new_pos: meta.new_pos,
            })
            .unwrap_or(MatchMetadata {
                old_pos: raw.old_line.unwrap_or(0),
                new_pos: raw.new_line.unwrap_or(0),
            });
        let header = raw.rich_text.or(raw.text).unwrap_or_default();
        let mut line = MatchLine::new(file_hash, meta, header);
        if let Some(code) = raw.line_code.filter(|code| !code.is_empty()) {
            line.line_code = code;
        }
        return DiffLine::Match(line);
    }

    let numbers = LineNumbers {
        old_line: raw.old_line,
        new_line: raw.new_line,
    };
    let kind = match raw.kind.as_deref() {
        Some(kind) => kind.parse().unwrap_or_else(|err| {
            log::debug!("Treating line as context: {err}");
            LineKind::Context
        }),
        None => LineKind::Context,
    };
    let (line_code, code_missing) = match raw.line_code.filter(|code| !code.is_empty()) {
        Some(code) => (code, false),
        None => (line_code_for(file_hash, numbers), true),
    };
    let rich_text = strip_diff_marker(raw.rich_text.as_deref().or(raw.text.as_deref()).unwrap_or(""));

    let mut line = ContentLine::new(line_code, kind, numbers, rich_text.to_string());
    line.comments_disabled = code_missing || only_moved;
    DiffLine::Content(line)
}

fn normalize_pair(pair: RawParallelLine, index: usize, file_hash: &str, only_moved: bool) -> ParallelLine {
    let left = pair.left.map(|line| normalize_line(line, file_hash, only_moved));
    let right = pair.right.map(|line| normalize_line(line, file_hash, only_moved));
    let line_code = left
        .as_ref()
        .or(right.as_ref())
        .map(|line| line.line_code().to_string())
        .unwrap_or_else(|| format!("{file_hash}_{index}"));

    ParallelLine {
        line_code,
        left,
        right,
    }
}

/// Drops the leading `+`, `-` or space marker of a highlighted diff line.
pub fn strip_diff_marker(text: &str) -> &str {
    match text.chars().next() {
        Some('+' | '-' | ' ') => &text[1..],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawMatchMeta, Viewer};

    fn raw_line(kind: Option<&str>, old: Option<u32>, new: Option<u32>, text: &str) -> RawLine {
        RawLine {
            kind: kind.map(str::to_string),
            old_line: old,
            new_line: new,
            rich_text: Some(text.to_string()),
            line_code: Some(format!("abc_{}_{}", old.unwrap_or(0), new.unwrap_or(0))),
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_diff_marker() {
        assert_eq!(strip_diff_marker(" diff"), "diff");
        assert_eq!(strip_diff_marker("+diff"), "diff");
        assert_eq!(strip_diff_marker("-diff"), "diff");
        assert_eq!(strip_diff_marker("diff"), "diff");
        assert_eq!(strip_diff_marker(""), "");
    }

    #[test]
    fn test_missing_collections_become_empty() {
        let file = normalize_file(
            RawDiffFile {
                file_hash: Some("abc".into()),
                new_path: Some("a.rb".into()),
                ..Default::default()
            },
            &EngineConfig::default(),
        );
        assert!(file.inline_lines.is_empty());
        assert!(file.side_by_side_lines.is_empty());
        assert!(file.render_it);
        assert!(!file.collapsed);
        assert_eq!(file.old_path, "a.rb");
    }

    #[test]
    fn test_missing_hash_derived_from_path() {
        let raw = RawDiffFile {
            new_path: Some("lib/thing.rb".into()),
            ..Default::default()
        };
        let file = normalize_file(raw, &EngineConfig::default());
        assert_eq!(file.file_hash, file_hash_for_path("lib/thing.rb"));
    }

    #[test]
    fn test_lines_are_prepared() {
        let raw = RawDiffFile {
            file_hash: Some("abc".into()),
            new_path: Some("a.rb".into()),
            highlighted_diff_lines: Some(vec![
                RawLine {
                    kind: Some("match".into()),
                    rich_text: Some("@@ -1,2 +1,3 @@".into()),
                    meta_data: Some(RawMatchMeta { old_pos: 4, new_pos: 5 }),
                    ..Default::default()
                },
                raw_line(Some("new"), None, Some(5), "+added"),
                RawLine {
                    line_code: None,
                    ..raw_line(None, Some(5), Some(6), " same")
                },
            ]),
            ..Default::default()
        };
        let file = normalize_file(raw, &EngineConfig::default());

        let header = file.inline_lines[0].as_match().unwrap();
        assert_eq!(header.line_code, "abc_4_5_match");
        assert_eq!(header.rich_text, "@@ -1,2 +1,3 @@");

        let added = file.inline_lines[1].as_content().unwrap();
        assert_eq!(added.kind, LineKind::Added);
        assert_eq!(added.rich_text, "added");
        assert!(added.discussions_expanded);
        assert!(added.discussions.is_empty());
        assert!(!added.comments_disabled);

        let context = file.inline_lines[2].as_content().unwrap();
        assert_eq!(context.line_code, "abc_5_6");
        assert!(context.comments_disabled);
    }

    #[test]
    fn test_only_moved_file_disables_comments() {
        let raw = RawDiffFile {
            file_hash: Some("abc".into()),
            new_path: Some("b.rb".into()),
            old_path: Some("a.rb".into()),
            renamed_file: true,
            highlighted_diff_lines: Some(vec![raw_line(None, Some(1), Some(1), " x")]),
            ..Default::default()
        };
        let file = normalize_file(raw, &EngineConfig::default());
        assert!(file.inline_lines[0].as_content().unwrap().comments_disabled);
    }

    #[test]
    fn test_pair_line_code_fallbacks() {
        let raw = RawDiffFile {
            file_hash: Some("abc".into()),
            new_path: Some("a.rb".into()),
            parallel_diff_lines: Some(vec![
                RawParallelLine {
                    left: None,
                    right: Some(raw_line(Some("new"), None, Some(1), "+a")),
                },
                RawParallelLine::default(),
            ]),
            ..Default::default()
        };
        let file = normalize_file(raw, &EngineConfig::default());
        assert_eq!(file.side_by_side_lines[0].line_code, "abc_0_1");
        assert_eq!(file.side_by_side_lines[1].line_code, "abc_1");
    }

    #[test]
    fn test_render_hints_follow_thresholds() {
        let config = EngineConfig {
            render_immediately_threshold: 2,
            auto_collapse_threshold: 2,
            ..EngineConfig::default()
        };
        let lines = |n: u32| {
            (1..=n)
                .map(|i| raw_line(None, Some(i), Some(i), " x"))
                .collect::<Vec<_>>()
        };
        let make = |n: u32, viewer: &str| RawDiffFile {
            file_hash: Some("abc".into()),
            new_path: Some("a.rb".into()),
            viewer: Some(Viewer {
                name: viewer.into(),
                collapsed: false,
            }),
            highlighted_diff_lines: Some(lines(n)),
            ..Default::default()
        };

        let small = normalize_file(make(1, "text"), &config);
        assert!(small.render_it);
        assert!(!small.collapsed);

        let large = normalize_file(make(3, "text"), &config);
        assert!(!large.render_it);
        assert!(large.collapsed);

        let image = normalize_file(make(3, "image"), &config);
        assert!(!image.collapsed);
    }
}

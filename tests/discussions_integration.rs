mod common;

use common::*;
use diffstate::application::discussions::{assign_discussions, diff_positions_by_line_code, is_discussion_applicable};
use diffstate::application::registry::{FileRegistry, Placement};
use diffstate::domain::{
    DiffRefs, DiscussionFileRef, DiscussionThread, LineRange, LineRangeEnd, RawDiffFile,
};
use diffstate::infra::app_config::EngineConfig;

fn registry() -> FileRegistry {
    let raw = RawDiffFile {
        diff_refs: Some(DiffRefs {
            base_sha: Some("b1".into()),
            start_sha: Some("s1".into()),
            head_sha: Some("h1".into()),
        }),
        ..file_with_lines(
            "abc",
            "lib/a.rb",
            vec![context_line("abc", 1, 1), context_line("abc", 2, 2)],
        )
    };
    let mut registry = FileRegistry::new();
    registry.merge_batch(vec![raw], &EngineConfig::default(), Placement::Batch);
    registry
}

#[test]
fn position_equality_ignores_line_range() {
    let registry = registry();
    let line_position = diff_positions_by_line_code(registry.files())["abc_2_2"].clone();
    let ranged = diffstate::domain::DiffPosition {
        line_range: Some(LineRange {
            start: LineRangeEnd {
                line_code: Some("abc_2_2".into()),
                ..Default::default()
            },
            end: LineRangeEnd {
                line_code: Some("abc_2_2".into()),
                ..Default::default()
            },
        }),
        ..line_position.clone()
    };
    let thread = DiscussionThread {
        id: "d1".into(),
        diff_discussion: true,
        diff_file: Some(DiscussionFileRef {
            file_hash: "abc".into(),
        }),
        line_code: Some("abc_2_2".into()),
        original_position: Some(ranged.clone()),
        position: Some(ranged),
        active: false,
        ..Default::default()
    };

    assert!(is_discussion_applicable(&thread, Some(&line_position), "abc_2_2", false));

    let mut registry = registry;
    assert_eq!(assign_discussions(&mut registry, &[thread], false, None), 3);
}

#[test]
fn threads_wait_for_their_file() {
    let mut registry = FileRegistry::new();
    let thread = DiscussionThread {
        id: "d1".into(),
        diff_discussion: true,
        diff_file: Some(DiscussionFileRef {
            file_hash: "abc".into(),
        }),
        line_code: Some("abc_1_1".into()),
        active: true,
        ..Default::default()
    };
    assert_eq!(assign_discussions(&mut registry, std::slice::from_ref(&thread), true, None), 0);

    registry = self::registry();
    assert_eq!(assign_discussions(&mut registry, &[thread], true, None), 3);
}

//! Anchors discussion threads to the diff lines they currently apply to,
//! and keeps the per-line discussion UI state.

use crate::application::registry::FileRegistry;
use crate::domain::{DiffFile, DiffLine, DiffPosition, DiscussionThread, PositionType};
use crate::state::DiffReviewSession;
use std::collections::{HashMap, HashSet};


/// Position of every loaded inline line, keyed by line code.
pub fn diff_positions_by_line_code(files: &[DiffFile]) -> HashMap<String, DiffPosition> {
    let mut positions = HashMap::new();
    for file in files {
        for line in file.inline_lines.iter().filter_map(DiffLine::as_content) {
            positions.insert(
                line.line_code.clone(),
                DiffPosition {
                    base_sha: file.diff_refs.base_sha.clone(),
                    start_sha: file.diff_refs.start_sha.clone(),
                    head_sha: file.diff_refs.head_sha.clone(),
                    old_path: Some(file.old_path.clone()),
                    new_path: Some(file.new_path.clone()),
                    old_line: line.old_line,
                    new_line: line.new_line,
                    position_type: PositionType::Text,
                    line_range: None,
                },
            );
        }
    }
    positions
}

/// Whether `thread` decorates the line `line_code` sitting at `position`.
///
/// Threads that survived a diff update match on any of their historical
/// positions. Threads without history only match by line code, and only on
/// the latest version while still active.
pub fn is_discussion_applicable(
    thread: &DiscussionThread,
    position: Option<&DiffPosition>,
    line_code: &str,
    latest_diff: bool,
) -> bool {
    if let (Some(original), Some(current)) = (&thread.original_position, &thread.position) {
        let Some(position) = position else {
            return false;
        };
        return [original, current]
            .into_iter()
            .chain(thread.positions.iter())
            .any(|candidate| candidate.same_location(position));
    }

    latest_diff && thread.active && thread.line_code.as_deref() == Some(line_code)
}

fn upsert(discussions: &mut Vec<DiscussionThread>, thread: &DiscussionThread) {
    discussions.retain(|existing| existing.id != thread.id);
    discussions.push(thread.clone());
}

fn refresh_expanded(line: &mut DiffLine, fragment: Option<&str>) {
    let Some(line) = line.as_content_mut() else {
        return;
    };
    if line.discussions.is_empty() {
        return;
    }
    line.discussions_expanded = line
        .discussions
        .iter()
        .any(|thread| !thread.resolved || thread.targets_note(fragment));
}

/// Attaches `threads` to the lines they apply to. Threads are first detached
/// everywhere, so a thread that no longer applies to a line leaves it.
/// Returns the number of attachments made.
pub fn assign_discussions(
    registry: &mut FileRegistry,
    threads: &[DiscussionThread],
    latest_diff: bool,
    fragment: Option<&str>,
) -> usize {
    let positions = diff_positions_by_line_code(registry.files());
    let ids: HashSet<&str> = threads.iter().map(|thread| thread.id.as_str()).collect();

    for file in registry.files_mut() {
        file.discussions.retain(|thread| !ids.contains(thread.id.as_str()));
        for line in file.all_lines_mut() {
            let Some(content) = line.as_content_mut() else {
                continue;
            };
            let before = content.discussions.len();
            content.discussions.retain(|thread| !ids.contains(thread.id.as_str()));
            if content.discussions.len() != before {
                refresh_expanded(line, fragment);
            }
        }
    }

    let mut attached = 0;
    for thread in threads.iter().filter(|thread| thread.diff_discussion) {
        let Some(file_hash) = thread.file_hash() else {
            continue;
        };
        let Some(file) = registry.get_mut(file_hash) else {
            log::debug!("Deferring discussion {}: file {file_hash} not loaded", thread.id);
            continue;
        };

        if thread.is_file_level() {
            upsert(&mut file.discussions, thread);
            attached += 1;
            continue;
        }

        let candidates = thread.candidate_line_codes();
        for line in file.all_lines_mut() {
            let Some(content) = line.as_content_mut() else {
                continue;
            };
            if !candidates.contains(&content.line_code.as_str()) {
                continue;
            }
            if !is_discussion_applicable(
                thread,
                positions.get(&content.line_code),
                &content.line_code,
                latest_diff,
            ) {
                continue;
            }
            upsert(&mut content.discussions, thread);
            refresh_expanded(line, fragment);
            attached += 1;
        }
    }
    attached
}

/// Takes a fresh set of threads from the discussions collaborator and
/// reconciles the whole registry against the stored snapshot.
pub fn receive_discussions(session: &mut DiffReviewSession, threads: Vec<DiscussionThread>) -> usize {
    for thread in &threads {
        upsert(&mut session.discussions, thread);
    }
    reassign_discussions(session)
}

pub fn reassign_discussions(session: &mut DiffReviewSession) -> usize {
    let fragment = session.fragment();
    assign_discussions(
        &mut session.registry,
        &session.discussions,
        session.latest_diff,
        fragment.as_deref(),
    )
}

/// Removes one thread from a line (or from the file-level list).
pub fn remove_discussion(
    session: &mut DiffReviewSession,
    file_hash: &str,
    line_code: &str,
    discussion_id: &str,
) -> bool {
    session.discussions.retain(|thread| thread.id != discussion_id);
    let fragment = session.fragment();
    let Some(file) = session.registry.get_mut(file_hash) else {
        return false;
    };

    let before = file.discussions.len();
    file.discussions.retain(|thread| thread.id != discussion_id);
    let mut removed = file.discussions.len() != before;

    for line in file.all_lines_mut() {
        let Some(content) = line.as_content_mut() else {
            continue;
        };
        if content.line_code != line_code {
            continue;
        }
        let before = content.discussions.len();
        content.discussions.retain(|thread| thread.id != discussion_id);
        if content.discussions.len() != before {
            removed = true;
            refresh_expanded(line, fragment.as_deref());
        }
    }
    removed
}

fn lines_with_code<'a>(
    file: &'a mut DiffFile,
    line_code: &'a str,
) -> impl Iterator<Item = &'a mut crate::domain::ContentLine> + 'a {
    file.all_lines_mut()
        .filter_map(DiffLine::as_content_mut)
        .filter(move |line| line.line_code == line_code)
}

pub fn toggle_line_discussions(
    registry: &mut FileRegistry,
    file_hash: &str,
    line_code: &str,
    expanded: bool,
) -> bool {
    let Some(file) = registry.get_mut(file_hash) else {
        return false;
    };
    let mut found = false;
    for line in lines_with_code(file, line_code) {
        line.discussions_expanded = expanded;
        found = true;
    }
    found
}

pub fn set_all_discussions_expanded(registry: &mut FileRegistry, expanded: bool) {
    for file in registry.files_mut() {
        for thread in &mut file.discussions {
            thread.expanded_on_diff = expanded;
        }
        for line in file.all_lines_mut().filter_map(DiffLine::as_content_mut) {
            if !line.discussions.is_empty() {
                line.discussions_expanded = expanded;
            }
        }
    }
}

/// Expands every discussion of a file if any is collapsed, otherwise collapses them all.
pub fn toggle_file_discussion_wrappers(registry: &mut FileRegistry, file_hash: &str) -> bool {
    let Some(file) = registry.get_mut(file_hash) else {
        return false;
    };

    let line_states: Vec<bool> = file
        .inline_lines
        .iter()
        .filter_map(DiffLine::as_content)
        .filter(|line| !line.discussions.is_empty())
        .map(|line| line.discussions_expanded)
        .collect();
    let file_states: Vec<bool> = file
        .discussions
        .iter()
        .filter(|thread| thread.is_file_level())
        .map(|thread| thread.expanded_on_diff)
        .collect();
    if line_states.is_empty() && file_states.is_empty() {
        return false;
    }

    let all_expanded = line_states.iter().chain(file_states.iter()).all(|expanded| *expanded);
    let expanded = !all_expanded;

    for line in file.all_lines_mut().filter_map(DiffLine::as_content_mut) {
        if !line.discussions.is_empty() {
            line.discussions_expanded = expanded;
        }
    }
    for thread in file.discussions.iter_mut().filter(|thread| thread.is_file_level()) {
        thread.expanded_on_diff = expanded;
    }
    true
}

/// Flips the expansion of one file-level thread.
pub fn toggle_file_discussion(registry: &mut FileRegistry, file_hash: &str, discussion_id: &str) -> bool {
    let Some(thread) = registry
        .get_mut(file_hash)
        .and_then(|file| file.discussions.iter_mut().find(|thread| thread.id == discussion_id))
    else {
        return false;
    };
    thread.expanded_on_diff = !thread.expanded_on_diff;
    true
}

fn set_has_form(registry: &mut FileRegistry, file_hash: &str, line_code: &str, has_form: bool) -> bool {
    let Some(file) = registry.get_mut(file_hash) else {
        return false;
    };
    let mut found = false;
    for line in lines_with_code(file, line_code) {
        line.has_form = has_form;
        found = true;
    }
    found
}

pub fn show_comment_form(registry: &mut FileRegistry, file_hash: &str, line_code: &str) -> bool {
    set_has_form(registry, file_hash, line_code, true)
}

pub fn cancel_comment_form(registry: &mut FileRegistry, file_hash: &str, line_code: &str) -> bool {
    set_has_form(registry, file_hash, line_code, false)
}

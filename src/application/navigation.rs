use crate::application::events::{DiffEvent, EventSink};
use crate::domain::{DiscussionThread, FileHash};
use crate::state::DiffReviewSession;

/// Makes the file at `path` current and asks the renderer to scroll to it.
/// Paths the tree does not know are ignored.
pub fn scroll_to_file(session: &mut DiffReviewSession, events: &dyn EventSink, path: &str) -> bool {
    let Some(file_hash) = session.tree.file_hash_for_path(path).map(str::to_string) else {
        log::debug!("Ignoring scroll to unknown path {path}");
        return false;
    };
    session.current_file_hash = Some(file_hash.clone());
    events.emit(DiffEvent::ScrollToFile(file_hash));
    true
}

pub fn set_current_file(session: &mut DiffReviewSession, file_hash: &str) -> bool {
    if !session.registry.contains(file_hash) {
        return false;
    }
    session.current_file_hash = Some(file_hash.to_string());
    true
}

/// Selects the `index`-th file in tree display order and leaves any linked-file view.
pub fn navigate_to_file_index(session: &mut DiffReviewSession, index: usize) -> Option<FileHash> {
    let file_hash = session
        .tree
        .blobs
        .get(index)
        .and_then(|path| session.tree.file_hash_for_path(path))?
        .to_string();
    session.linked_file_hash = None;
    session.current_file_hash = Some(file_hash.clone());
    Some(file_hash)
}

/// Selects the file holding the thread that contains note `note_id`.
pub fn set_current_file_from_note(
    session: &mut DiffReviewSession,
    note_id: &str,
    discussions: &[DiscussionThread],
) -> Option<FileHash> {
    let file_hash = discussions
        .iter()
        .filter(|thread| thread.diff_discussion)
        .find(|thread| thread.notes.iter().any(|note| note.id == note_id))
        .and_then(DiscussionThread::file_hash)?
        .to_string();
    session.current_file_hash = Some(file_hash.clone());
    Some(file_hash)
}

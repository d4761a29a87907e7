//! Context line expansion: revealing folded lines around match lines, and
//! switching a file between its diff and its full content.

pub mod full_file;
pub mod plan;
pub mod splice;

pub use full_file::{ExpandedLines, convert_expand_lines};
pub use plan::{ExpansionDirection, ExpansionPlan, ExpansionTarget, plan_expansion};
pub use splice::apply_context_lines;

use crate::application::discussions::reassign_discussions;
use crate::application::events::{DiffEvent, EventSink};
use crate::application::normalize::normalize_file;
use crate::domain::{DiffFile, DiffsError, LineNumbers, LinesRequest};
use crate::infra::transport::DiffTransport;
use crate::state::{DiffReviewSession, SharedSession};

/// Fetches and splices the lines needed to reveal `target` in one file.
/// Returns the number of lines revealed; unknown files and folds are no-ops.
pub async fn expand_lines(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    events: &dyn EventSink,
    file_hash: &str,
    target: ExpansionTarget,
) -> Result<usize, DiffsError> {
    let (generation, plan, endpoint) = {
        let session = session.lock();
        let Some(file) = session.file(file_hash) else {
            log::debug!("Skipping expansion: file {file_hash} not loaded");
            return Ok(0);
        };
        let Some(plan) = plan_expansion(
            &file.inline_lines,
            &target,
            session.config.expand_both_threshold,
        ) else {
            return Ok(0);
        };
        let Some(endpoint) = file.context_lines_path.clone() else {
            log::debug!("Skipping expansion: file {file_hash} has no context lines endpoint");
            return Ok(0);
        };
        (session.generation(), plan, endpoint)
    };

    let fetched = transport
        .fetch_lines(&endpoint, &plan.request)
        .await
        .map_err(|source| DiffsError::LinesFetch {
            file_hash: file_hash.to_string(),
            source,
        })?;

    let revealed = {
        let mut session = session.lock();
        if !session.is_current(generation) {
            log::debug!("Dropping expansion for {file_hash}: session was reset");
            return Ok(0);
        }
        let Some(file) = session.file_mut(file_hash) else {
            return Ok(0);
        };
        apply_context_lines(file, &plan, fetched)
    };

    events.emit(DiffEvent::FilesChanged);
    Ok(revealed)
}

/// Reveals the line a `<hash>_<old>_<new>` deep link points at, if the linked
/// file does not already show it.
pub async fn fetch_linked_expanded_line(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    events: &dyn EventSink,
    file_hash: &str,
    numbers: LineNumbers,
) -> Result<usize, DiffsError> {
    let new_line = {
        let session = session.lock();
        let Some(file) = session.linked_file().filter(|file| file.file_hash == file_hash) else {
            return Ok(0);
        };
        if file.inline_index_at(numbers).is_some() {
            return Ok(0);
        }
        match numbers.new_line {
            Some(new_line) => new_line,
            None => return Ok(0),
        }
    };

    expand_lines(
        session,
        transport,
        events,
        file_hash,
        ExpansionTarget::Line(new_line),
    )
    .await
}

/// Replaces every fold of a file with the full blob. Large results are
/// applied in part and streamed through [`append_expanded_chunk`].
pub async fn fetch_full_file(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    events: &dyn EventSink,
    file_hash: &str,
) -> Result<(), DiffsError> {
    let (generation, endpoint) = {
        let mut session = session.lock();
        let generation = session.generation();
        let file = session
            .file_mut(file_hash)
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;
        let endpoint = file
            .context_lines_path
            .clone()
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;
        file.is_loading_full_file = true;
        (generation, endpoint)
    };

    let request = LinesRequest {
        full: true,
        ..Default::default()
    };
    let blob = match transport.fetch_lines(&endpoint, &request).await {
        Ok(blob) => blob,
        Err(source) => {
            if let Some(file) = session.lock().file_mut(file_hash) {
                file.is_loading_full_file = false;
            }
            log::warn!("Failed to load full file {file_hash}: {source}");
            return Err(DiffsError::LinesFetch {
                file_hash: file_hash.to_string(),
                source,
            });
        }
    };

    {
        let mut guard = session.lock();
        if !guard.is_current(generation) {
            return Ok(());
        }
        let session = &mut *guard;
        let max_lines = session.config.max_rendering_diff_lines;
        let start_index = session.config.start_rendering_index;
        let file = session
            .registry
            .get_mut(file_hash)
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;

        let mut stream = ExpandedLines::new(convert_expand_lines(
            &file.inline_lines,
            &blob,
            &file.file_hash,
        ));
        file.is_loading_full_file = false;
        file.is_showing_full_file = true;

        if stream.len() > max_lines {
            file.inline_lines = stream.next_chunk(start_index);
            file.rendering_lines = true;
            session
                .pending_expansions
                .insert(file_hash.to_string(), stream);
        } else {
            let total = stream.len();
            file.inline_lines = stream.next_chunk(total);
            file.rendering_lines = false;
            session.pending_expansions.remove(file_hash);
        }
    }

    events.emit(DiffEvent::FilesChanged);
    Ok(())
}

/// Applies the next chunk of a streamed full-file expansion. Returns the
/// number of lines appended; zero once nothing is pending.
pub fn append_expanded_chunk(session: &mut DiffReviewSession, file_hash: &str) -> usize {
    let bulk_rows = session.config.max_rendering_bulk_rows;
    let Some(stream) = session.pending_expansions.get_mut(file_hash) else {
        return 0;
    };
    let chunk = stream.next_chunk(bulk_rows);
    let done = stream.is_exhausted();
    if done {
        session.pending_expansions.remove(file_hash);
    }

    let appended = chunk.len();
    if let Some(file) = session.registry.get_mut(file_hash) {
        file.inline_lines.extend(chunk);
        if done {
            file.rendering_lines = false;
        }
    }
    appended
}

/// Re-fetches a file's regular (folded) diff and replaces the file with it.
pub async fn load_collapsed_diff(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    file_hash: &str,
) -> Result<(), DiffsError> {
    let (generation, url) = {
        let session = session.lock();
        let file = session
            .file(file_hash)
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;
        let url = file
            .load_collapsed_diff_url
            .clone()
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;
        (session.generation(), url)
    };

    let response = transport
        .fetch_single_file(&url)
        .await
        .map_err(|source| DiffsError::FileFetch {
            url: url.clone(),
            source,
        })?;

    let mut guard = session.lock();
    if !guard.is_current(generation) {
        return Ok(());
    }
    let session = &mut *guard;
    let mut candidates = response.diff_files.into_iter();
    let Some(raw) = candidates
        .find(|raw| raw.file_hash.as_deref() == Some(file_hash))
    else {
        log::debug!("Collapsed diff response for {file_hash} held no matching file");
        return Ok(());
    };
    let incoming = normalize_file(raw, &session.config);
    let Some(file) = session.registry.get_mut(file_hash) else {
        return Ok(());
    };
    let discussions = std::mem::take(&mut file.discussions);
    *file = DiffFile {
        discussions,
        ..incoming
    };
    session.pending_expansions.remove(file_hash);
    Ok(())
}

/// Switches a file between its full content and its regular diff.
pub async fn toggle_full_file(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    events: &dyn EventSink,
    file_hash: &str,
) -> Result<(), DiffsError> {
    let showing_full = {
        let mut session = session.lock();
        let file = session
            .file_mut(file_hash)
            .ok_or_else(|| DiffsError::FileNotFound(file_hash.to_string()))?;
        if file.is_showing_full_file {
            file.is_loading_full_file = true;
        }
        file.is_showing_full_file
    };

    if !showing_full {
        return fetch_full_file(session, transport, events, file_hash).await;
    }

    if let Err(err) = load_collapsed_diff(session, transport, file_hash).await {
        if let Some(file) = session.lock().file_mut(file_hash) {
            file.is_loading_full_file = false;
        }
        return Err(err);
    }

    {
        let mut session = session.lock();
        if let Some(file) = session.file_mut(file_hash) {
            file.is_loading_full_file = false;
            file.is_showing_full_file = false;
        }
        reassign_discussions(&mut session);
    }
    events.emit(DiffEvent::FilesChanged);
    events.emit(DiffEvent::DiscussionsAssigned);
    Ok(())
}

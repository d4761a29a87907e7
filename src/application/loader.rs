//! Adaptive batch loading of diff files, plus the out-of-band linked file fetch.

use crate::application::discussions::reassign_discussions;
use crate::application::events::{DiffEvent, EventSink};
use crate::application::expansion::fetch_linked_expanded_line;
use crate::application::navigation::set_current_file_from_note;
use crate::application::registry::Placement;
use crate::application::tree::build_file_tree;
use crate::domain::{DeepLink, DiffsError, FileHash, PageRequest};
use crate::infra::app_config::EngineConfig;
use crate::infra::transport::DiffTransport;
use crate::state::{DiffReviewSession, LoadState, SharedSession};

/// Accelerating page sizes: small first pages paint quickly, later pages
/// amortize request overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizer {
    size: u32,
    growth_tenths: u32,
    step_tenths: u32,
    max_growth_tenths: u32,
    max_size: u32,
}

impl PageSizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            size: config.first_page_size().min(config.max_page_size.max(1)),
            growth_tenths: config.initial_growth_tenths.min(config.max_growth_tenths),
            step_tenths: config.growth_step_tenths,
            max_growth_tenths: config.max_growth_tenths,
            max_size: config.max_page_size.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.size
    }

    pub fn growth_tenths(&self) -> u32 {
        self.growth_tenths
    }

    /// Grows the page size by the current multiplier, then the multiplier by one step.
    pub fn advance(&mut self) -> u32 {
        let grown = (u64::from(self.size) * u64::from(self.growth_tenths)).div_ceil(10);
        self.size = grown.min(u64::from(self.max_size)) as u32;
        self.growth_tenths = (self.growth_tenths + self.step_tenths).min(self.max_growth_tenths);
        self.size
    }
}

/// What one loader run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub pages: u32,
    pub page_sizes: Vec<u32>,
    pub files: usize,
    /// The session was reset while this run was in flight; its late pages were dropped.
    pub superseded: bool,
}

/// Fetches pages from `endpoint` until the transport reports no more, merging
/// each into the registry as it arrives.
pub async fn load_batches(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    endpoint: &str,
    events: &dyn EventSink,
) -> Result<LoadSummary, DiffsError> {
    let (generation, view, mut sizer, mut scroll_target) = {
        let mut session = session.lock();
        session.load_state = LoadState::Loading;
        session.retrieving_batches = true;
        let scroll_target = session.deep_link.as_ref().and_then(DeepLink::scroll_target);
        (
            session.generation(),
            session.view.diff_view_type,
            PageSizer::new(&session.config),
            scroll_target,
        )
    };

    let mut summary = LoadSummary::default();
    let mut offset = 0u32;

    loop {
        let request = PageRequest {
            page: offset,
            per_page: sizer.current(),
            view,
        };
        log::info!(
            "Fetching diff batch via {} (offset {}, size {})",
            transport.id(),
            request.page,
            request.per_page
        );

        let response = match transport.fetch_page(endpoint, &request).await {
            Ok(response) => response,
            Err(source) => {
                let mut session = session.lock();
                if !session.is_current(generation) {
                    summary.superseded = true;
                    return Ok(summary);
                }
                session.load_state = LoadState::Error;
                session.retrieving_batches = false;
                drop(session);
                log::warn!("Diff batch at offset {offset} failed: {source}");
                events.emit(DiffEvent::LoadFailed);
                return Err(DiffsError::PageFetch {
                    page: offset,
                    source,
                });
            }
        };

        summary.pages += 1;
        summary.page_sizes.push(request.per_page);
        let total_pages = response.pagination.total_pages;

        {
            let mut guard = session.lock();
            if !guard.is_current(generation) {
                log::debug!("Dropping diff batch at offset {offset}: session was reset");
                summary.superseded = true;
                return Ok(summary);
            }
            let session = &mut *guard;
            let merged = session
                .registry
                .merge_batch(response.diff_files, &session.config, Placement::Batch);
            summary.files += merged.len();

            if let Some(target) = scroll_target.as_deref()
                && let Some(index) = find_scroll_index(session, &merged, target)
            {
                events.emit(DiffEvent::ScrollToIndex(index));
                scroll_target = None;
            }

            if let Some(DeepLink::Note { note_id }) = session.deep_link.clone() {
                let discussions = std::mem::take(&mut session.discussions);
                set_current_file_from_note(session, &note_id, &discussions);
                session.discussions = discussions;
            } else if session.current_file_hash.is_none()
                && let Some(first) = merged.first()
            {
                session.current_file_hash = Some(first.clone());
            }

            session.tree = build_file_tree(session.registry.files(), session.config.tree_name_max_width);
            if !session.discussions.is_empty() {
                reassign_discussions(session);
                events.emit(DiffEvent::DiscussionsAssigned);
            }
        }
        events.emit(DiffEvent::FilesChanged);

        match total_pages {
            Some(total) if summary.pages < total => {
                offset += request.per_page;
                sizer.advance();
            }
            _ => break,
        }
    }

    {
        let mut session = session.lock();
        if !session.is_current(generation) {
            summary.superseded = true;
            return Ok(summary);
        }
        session.load_state = LoadState::Loaded;
        session.retrieving_batches = false;
        validate_current_file(&mut session);
    }
    log::info!(
        "Diff batches complete: {} files in {} pages",
        summary.files,
        summary.pages
    );
    events.emit(DiffEvent::BatchesComplete);
    Ok(summary)
}

/// Registry index of the first newly merged file holding `target`, which is
/// either a file hash or an inline line code.
fn find_scroll_index(session: &DiffReviewSession, merged: &[FileHash], target: &str) -> Option<usize> {
    merged.iter().find_map(|file_hash| {
        let file = session.registry.get(file_hash)?;
        let hit = file.file_hash == target || file.find_inline_index(target).is_some();
        if hit {
            session.registry.position(file_hash)
        } else {
            None
        }
    })
}

/// Falls back to the first file when the current one vanished during loading.
fn validate_current_file(session: &mut DiffReviewSession) {
    if session.is_note_link() {
        return;
    }
    let missing = session
        .current_file_hash
        .as_deref()
        .is_none_or(|hash| !session.registry.contains(hash));
    if missing {
        session.current_file_hash = session.registry.first().map(|file| file.file_hash.clone());
    }
}

/// Fetches one deep-linked file outside pagination and merges it in place.
/// Returns the hash of the merged file, if the response held one.
pub async fn fetch_linked_file(
    session: &SharedSession,
    transport: &dyn DiffTransport,
    events: &dyn EventSink,
    url: &str,
) -> Result<Option<FileHash>, DiffsError> {
    let generation = {
        let mut session = session.lock();
        session.load_state = LoadState::Loading;
        session.retrieving_batches = true;
        session.generation()
    };
    log::info!("Fetching linked diff file via {}", transport.id());

    let response = match transport.fetch_single_file(url).await {
        Ok(response) => response,
        Err(source) => {
            let mut session = session.lock();
            if session.is_current(generation) {
                session.load_state = LoadState::Error;
                session.retrieving_batches = false;
            }
            log::warn!("Linked diff file fetch failed: {source}");
            return Err(DiffsError::FileFetch {
                url: url.to_string(),
                source,
            });
        }
    };

    let (linked, line) = {
        let mut guard = session.lock();
        if !guard.is_current(generation) {
            log::debug!("Dropping linked file: session was reset");
            return Ok(None);
        }
        let session = &mut *guard;
        let merged = session
            .registry
            .merge_batch(response.diff_files, &session.config, Placement::InPlace);
        let linked = merged.first().cloned();

        if let Some(hash) = &linked {
            session.linked_file_hash = Some(hash.clone());
            if session.current_file_hash.is_none() && !session.is_note_link() {
                session.current_file_hash = Some(hash.clone());
            }
        }
        session.tree = build_file_tree(session.registry.files(), session.config.tree_name_max_width);
        if !session.discussions.is_empty() {
            reassign_discussions(session);
        }
        session.load_state = LoadState::Loaded;
        session.retrieving_batches = false;

        let line = match &session.deep_link {
            Some(DeepLink::Line { file_hash, .. }) if linked.as_deref() == Some(file_hash.as_str()) => session
                .deep_link
                .as_ref()
                .and_then(DeepLink::line_numbers)
                .map(|numbers| (file_hash.clone(), numbers)),
            _ => None,
        };
        (linked, line)
    };
    events.emit(DiffEvent::FilesChanged);

    if let Some((file_hash, numbers)) = line
        && let Err(err) = fetch_linked_expanded_line(session, transport, events, &file_hash, numbers).await
    {
        let mut session = session.lock();
        if session.is_current(generation) {
            session.load_state = LoadState::Error;
        }
        log::warn!("Linked line expansion failed: {err}");
        return Err(err);
    }
    Ok(linked)
}

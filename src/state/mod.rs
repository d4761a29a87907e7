use crate::application::expansion::ExpandedLines;
use crate::application::registry::FileRegistry;
use crate::domain::{DeepLink, DiffFile, DiscussionThread, FileHash, FileTree};
use crate::infra::app_config::{EngineConfig, ViewPreferences};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Batch loading progress, as shown to the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Everything the engine knows about one review session.
///
/// Mutations happen in short synchronous sections under the session lock;
/// no lock is held across a transport await.
pub struct DiffReviewSession {
    pub config: EngineConfig,
    pub view: ViewPreferences,
    pub registry: FileRegistry,
    pub tree: FileTree,
    pub load_state: LoadState,
    pub retrieving_batches: bool,
    pub current_file_hash: Option<FileHash>,
    /// File fetched out of band through a deep link.
    pub linked_file_hash: Option<FileHash>,
    pub deep_link: Option<DeepLink>,
    /// False while viewing an older version of the change.
    pub latest_diff: bool,
    /// Snapshot of the threads last handed over by the discussions collaborator.
    pub discussions: Vec<DiscussionThread>,
    /// Streamed full-file expansions still being applied, by file hash.
    pub pending_expansions: HashMap<FileHash, ExpandedLines>,
    generation: u64,
}

pub type SharedSession = Arc<Mutex<DiffReviewSession>>;

impl DiffReviewSession {
    pub fn new(config: EngineConfig, view: ViewPreferences) -> Self {
        Self {
            config,
            view,
            registry: FileRegistry::new(),
            tree: FileTree::default(),
            load_state: LoadState::Idle,
            retrieving_batches: false,
            current_file_hash: None,
            linked_file_hash: None,
            deep_link: None,
            latest_diff: true,
            discussions: Vec::new(),
            pending_expansions: HashMap::new(),
            generation: 0,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn with_deep_link(mut self, deep_link: Option<DeepLink>) -> Self {
        self.deep_link = deep_link;
        self
    }

    /// Epoch of the current registry. Work started under another epoch is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Discards every loaded file (e.g. when switching target revision).
    pub fn reset(&mut self) {
        self.generation += 1;
        self.registry.clear();
        self.tree = FileTree::default();
        self.load_state = LoadState::Idle;
        self.retrieving_batches = false;
        self.current_file_hash = None;
        self.linked_file_hash = None;
        self.pending_expansions.clear();
        log::info!("Diff session reset (generation {})", self.generation);
    }

    pub fn is_note_link(&self) -> bool {
        self.deep_link.as_ref().is_some_and(DeepLink::is_note)
    }

    /// Location fragment without `#`, used to detect deep-linked notes.
    pub fn fragment(&self) -> Option<String> {
        self.deep_link.as_ref().map(DeepLink::fragment)
    }

    pub fn file(&self, file_hash: &str) -> Option<&DiffFile> {
        self.registry.get(file_hash)
    }

    pub fn file_mut(&mut self, file_hash: &str) -> Option<&mut DiffFile> {
        self.registry.get_mut(file_hash)
    }

    pub fn current_file(&self) -> Option<&DiffFile> {
        self.current_file_hash
            .as_deref()
            .and_then(|hash| self.registry.get(hash))
    }

    pub fn linked_file(&self) -> Option<&DiffFile> {
        self.linked_file_hash
            .as_deref()
            .and_then(|hash| self.registry.get(hash))
    }
}

impl Default for DiffReviewSession {
    fn default() -> Self {
        Self::new(EngineConfig::default(), ViewPreferences::default())
    }
}

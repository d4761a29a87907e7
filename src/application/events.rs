use tokio::sync::mpsc::UnboundedSender;

/// One-shot signals for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent {
    FilesChanged,
    /// Registry index of the file holding the deep-linked target.
    ScrollToIndex(usize),
    ScrollToFile(String),
    BatchesComplete,
    LoadFailed,
    DiscussionsAssigned,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: DiffEvent);
}

impl EventSink for UnboundedSender<DiffEvent> {
    fn emit(&self, event: DiffEvent) {
        if self.send(event).is_err() {
            log::debug!("Dropping diff event: receiver closed");
        }
    }
}

/// Sink for callers that do not render.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: DiffEvent) {}
}

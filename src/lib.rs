pub mod application;
pub mod domain;
pub mod infra;
pub mod state;

pub use application::events::{DiffEvent, EventSink, NullSink};
pub use application::loader::{LoadSummary, fetch_linked_file, load_batches};
pub use domain::DiffsError;
pub use infra::transport::{DiffTransport, FixtureTransport};
pub use state::{DiffReviewSession, LoadState, SharedSession};

//! Application layer: the engine's algorithms.
//!
//! Everything here works on a [`DiffReviewSession`](crate::state::DiffReviewSession)
//! and talks to the outside world only through the transport and event seams.

pub mod discussions;
pub mod events;
pub mod expansion;
pub mod loader;
pub mod navigation;
pub mod normalize;
pub mod registry;
pub mod tree;

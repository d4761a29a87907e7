//! Domain types for the diff state engine
//! Defines the data model shared by the loader, registry, expansion, discussions and tree layers.

pub mod deep_link;
pub mod diff_file;
pub mod discussion;
pub mod error;
pub mod line;
pub mod raw;
pub mod tree;

pub use deep_link::*;
pub use diff_file::*;
pub use discussion::*;
pub use error::*;
pub use line::*;
pub use raw::*;
pub use tree::*;

pub mod fixture;
pub mod traits;

pub use fixture::FixtureTransport;
pub use traits::DiffTransport;

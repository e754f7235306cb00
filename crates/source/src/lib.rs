//! `source` crate: where the workflow graph document comes from.
//!
//! Pure I/O: every source hands back the raw JSON document and leaves its
//! interpretation to the `engine` crate.  No business logic lives here.

pub mod error;
pub mod traits;
pub mod file;
pub mod mock;

pub use error::SourceError;
pub use traits::GraphSource;
pub use file::FileSource;

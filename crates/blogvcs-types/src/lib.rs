//! Foundation types for blogvcs.
//!
//! Every other blogvcs crate depends on `blogvcs-types`.
//!
//! # Key Types
//!
//! - [`DocumentId`] / [`VersionId`] -- UUID v7 identifiers (time-ordered)
//! - [`Document`] -- a blog post with its current content pointer
//! - [`Version`] -- an immutable content snapshot owned by a document

pub mod error;
pub mod id;
pub mod model;

pub use error::TypeError;
pub use id::{DocumentId, VersionId};
pub use model::{Document, Version};

//! Diff engine for blogvcs.
//!
//! Computes a human-readable edit script between two text snapshots and
//! renders it as inline markup.
//!
//! # Key Types
//!
//! - [`EditScript`] / [`Operation`] / [`OpKind`] -- Coalesced equal/insert/delete runs
//! - [`DiffOptions`] / [`Granularity`] -- Tokenization and time budget for [`diff_with`]
//! - [`MarkupStyle`] -- Class hooks used by [`render_with`]
//! - [`DiffStats`] -- Counters summarizing a script

mod cleanup;
pub mod engine;
pub mod render;
pub mod script;

pub use engine::{diff, diff_with, DiffOptions, Granularity, DEFAULT_TIMEOUT_MS};
pub use render::{escape_html, render, render_with, MarkupStyle};
pub use script::{DiffStats, EditScript, OpKind, Operation};

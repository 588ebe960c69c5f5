use blogvcs_diff::{DiffOptions, MarkupStyle};
use serde::{Deserialize, Serialize};

/// Largest accepted version content, in bytes.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 5 * 1024 * 1024;

/// Service-level settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Options for the diff engine used by compare.
    pub diff: DiffOptions,
    /// Class hooks for rendered comparisons.
    pub markup: MarkupStyle,
    pub max_content_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            diff: DiffOptions::default(),
            markup: MarkupStyle::default(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }
}

//! Cache-tool detection
//!
//! A single filesystem check for the cache tool executable. The hook
//! runs before any compilation is dispatched and must not spawn
//! subprocesses, so presence is judged from metadata alone rather than
//! by invoking the tool.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether the cache tool executable is present on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The executable exists at the configured path
    Found,
    /// Nothing (or not a regular file) at the configured path;
    /// the build proceeds uncached
    Missing,
}

impl ToolStatus {
    /// True when the tool was found
    pub fn is_found(self) -> bool {
        self == ToolStatus::Found
    }
}

/// Check whether the cache tool exists at `path`.
///
/// Exists-and-is-a-regular-file; the execute permission bit is not
/// required, matching the bare existence check this replaces.
pub fn probe_tool(path: impl AsRef<Path>) -> ToolStatus {
    match std::fs::metadata(path.as_ref()) {
        Ok(meta) if meta.is_file() => ToolStatus::Found,
        _ => ToolStatus::Missing,
    }
}

//! Built-in cache tool defaults (layer 1)
//!
//! Hardcoded defaults for all settings. The cache directory is the
//! only derived value: it lives under the invoking user's home
//! directory.

use serde::{Deserialize, Serialize};

/// Built-in default settings for the cache tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Expected path of the cache tool executable
    /// (default: "/usr/local/bin/ccache")
    pub tool_path: String,

    /// Cache storage directory, derived from the user's home directory
    /// (default: "$HOME/Library/Caches/ccache")
    pub cache_dir: String,

    /// Temporary-file directory for the cache tool (default: "/tmp")
    pub temp_dir: String,

    /// Compression flag, "0" or "1" (default: "1")
    pub compress: String,

    /// Maximum cache size, digits plus optional K/M/G/T suffix
    /// (default: "2G")
    pub max_size: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            tool_path: "/usr/local/bin/ccache".to_string(),
            cache_dir: default_cache_dir(),
            temp_dir: "/tmp".to_string(),
            compress: "1".to_string(),
            max_size: "2G".to_string(),
        }
    }
}

/// Cache directory under the user's home directory.
///
/// Falls back to /tmp/ccache when HOME is unset so the unconditional
/// variables can still be written.
fn default_cache_dir() -> String {
    match std::env::var("HOME") {
        Ok(home) => format!("{}/Library/Caches/ccache", home),
        Err(_) => "/tmp/ccache".to_string(),
    }
}

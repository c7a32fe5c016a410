//! Effective cache settings with provenance
//!
//! Resolves the settings the rewriter runs with by applying layers in
//! precedence order: built-in defaults, then an optional TOML settings
//! file, then in-process overrides. Each contributing source is
//! recorded with its origin (and file digest, for files).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;

/// Origin of a settings layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsOrigin {
    Builtin,
    File,
    Overrides,
}

/// A contributing settings source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSource {
    /// Origin of this source
    pub origin: SettingsOrigin,

    /// File path (None for builtin/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// A partial settings layer: every field optional, absent fields leave
/// the lower layer's value in place.
///
/// This is also the on-disk shape of the TOML settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsOverlay {
    /// Override for the cache tool executable path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_path: Option<String>,

    /// Override for the cache storage directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Override for the temporary-file directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,

    /// Override for the compression flag ("0" or "1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<String>,

    /// Override for the maximum cache size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
}

impl SettingsOverlay {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.tool_path.is_none()
            && self.cache_dir.is_none()
            && self.temp_dir.is_none()
            && self.compress.is_none()
            && self.max_size.is_none()
    }

    /// Apply this layer on top of `settings` (set fields win)
    fn apply(&self, settings: &mut CacheSettings) {
        if let Some(ref v) = self.tool_path {
            settings.tool_path = v.clone();
        }
        if let Some(ref v) = self.cache_dir {
            settings.cache_dir = v.clone();
        }
        if let Some(ref v) = self.temp_dir {
            settings.temp_dir = v.clone();
        }
        if let Some(ref v) = self.compress {
            settings.compress = v.clone();
        }
        if let Some(ref v) = self.max_size {
            settings.max_size = v.clone();
        }
    }
}

/// Resolved cache settings the rewriter runs with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Path of the cache tool executable
    pub tool_path: String,

    /// Cache storage directory (CCACHE_DIR)
    pub cache_dir: String,

    /// Temporary-file directory (CCACHE_TEMPDIR)
    pub temp_dir: String,

    /// Compression flag (CCACHE_COMPRESS), "0" or "1"
    pub compress: String,

    /// Maximum cache size (CCACHE_MAXSIZE)
    pub max_size: String,

    /// Contributing sources in precedence order
    pub sources: Vec<SettingsSource>,
}

impl CacheSettings {
    /// Built-in defaults only
    pub fn builtin() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            tool_path: defaults.tool_path,
            cache_dir: defaults.cache_dir,
            temp_dir: defaults.temp_dir,
            compress: defaults.compress,
            max_size: defaults.max_size,
            sources: vec![SettingsSource {
                origin: SettingsOrigin::Builtin,
                path: None,
                digest: None,
            }],
        }
    }

    /// Resolve settings from layers.
    ///
    /// Precedence: builtin < `file_path` (if present on disk) <
    /// `overrides`. A missing file is not an error; a file that exists
    /// but fails to read or parse is.
    pub fn load(
        file_path: Option<&Path>,
        overrides: Option<SettingsOverlay>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::builtin();

        if let Some(path) = file_path {
            if path.exists() {
                let (overlay, digest) = Self::load_toml_file(path)?;
                overlay.apply(&mut settings);
                settings.sources.push(SettingsSource {
                    origin: SettingsOrigin::File,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(overlay) = overrides {
            if !overlay.is_empty() {
                overlay.apply(&mut settings);
                settings.sources.push(SettingsSource {
                    origin: SettingsOrigin::Overrides,
                    path: None,
                    digest: None,
                });
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load and parse a TOML settings file, returning the overlay and
    /// the digest of the raw bytes
    fn load_toml_file(path: &Path) -> Result<(SettingsOverlay, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let overlay: SettingsOverlay = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((overlay, digest))
    }

    /// Validate resolved values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tool_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "tool_path must not be empty".to_string(),
            ));
        }

        if self.cache_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "cache_dir must not be empty".to_string(),
            ));
        }

        if self.temp_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "temp_dir must not be empty".to_string(),
            ));
        }

        if self.compress != "0" && self.compress != "1" {
            return Err(ConfigError::ValidationError(format!(
                "compress must be \"0\" or \"1\", got \"{}\"",
                self.compress
            )));
        }

        if !is_valid_size(&self.max_size) {
            return Err(ConfigError::ValidationError(format!(
                "max_size must be digits with an optional K/M/G/T suffix, got \"{}\"",
                self.max_size
            )));
        }

        Ok(())
    }
}

/// Accepts "500", "500K", "2G", etc.
fn is_valid_size(size: &str) -> bool {
    let digits = size.strip_suffix(['K', 'M', 'G', 'T']).unwrap_or(size);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Settings resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

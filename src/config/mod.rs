//! Cache tool settings
//!
//! Layered settings resolution:
//! 1. Built-in defaults
//! 2. Optional TOML settings file
//! 3. In-process overrides

mod defaults;
mod settings;

pub use defaults::BuiltinDefaults;
pub use settings::{
    CacheSettings, ConfigError, SettingsOrigin, SettingsOverlay, SettingsSource,
};

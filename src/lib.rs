//! ccache-hook - Compiler cache injection for pre-build hooks
//!
//! This crate implements a one-shot configuration pass that a host
//! build tool runs before dispatching compilation: it configures the
//! ccache environment variables, detects the ccache executable, and if
//! present routes the `CC`/`CXX` compiler commands through it.

pub mod config;
pub mod env;
pub mod probe;
pub mod rewrite;

pub use config::{BuiltinDefaults, CacheSettings, ConfigError, SettingsOverlay};
pub use env::{BuildEnv, CompilerCommand};
pub use probe::{probe_tool, ToolStatus};
pub use rewrite::{RewriteReport, Rewriter};

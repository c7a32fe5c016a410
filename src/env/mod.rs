//! Build environment model
//!
//! An explicit, passed-by-reference view of the host build tool's
//! configuration: top-level compiler command entries plus the nested
//! process-environment map handed to spawned build subprocesses.
//! The hook receives a `&mut BuildEnv`, mutates it in place, and owns
//! no state beyond the call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key for the C compiler command entry
pub const CC: &str = "CC";

/// Key for the C++ compiler command entry
pub const CXX: &str = "CXX";

/// A compiler command entry: either a bare executable path or an
/// executable followed by fixed arguments.
///
/// Build tools accept both shapes for the same key, so the union is
/// modeled explicitly and normalized to a token sequence at use sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompilerCommand {
    /// A single executable path, e.g. `"gcc"`
    Single(String),
    /// An executable followed by fixed arguments, e.g. `["gcc", "-std=c11"]`
    Sequence(Vec<String>),
}

impl CompilerCommand {
    /// Normalize to an ordered token sequence.
    ///
    /// A `Single` becomes a one-element sequence; a `Sequence` is
    /// returned as-is. Order is preserved.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            CompilerCommand::Single(s) => vec![s.clone()],
            CompilerCommand::Sequence(v) => v.clone(),
        }
    }

    /// Consuming variant of [`tokens`](Self::tokens).
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            CompilerCommand::Single(s) => vec![s],
            CompilerCommand::Sequence(v) => v,
        }
    }

    /// True when the first token equals `executable`.
    ///
    /// This is the guard against double-prepending the cache tool.
    pub fn starts_with(&self, executable: &str) -> bool {
        match self {
            CompilerCommand::Single(s) => s == executable,
            CompilerCommand::Sequence(v) => v.first().map(String::as_str) == Some(executable),
        }
    }

    /// New command whose first token is `executable`, followed by this
    /// command's tokens unchanged in order.
    pub fn prepend(&self, executable: &str) -> CompilerCommand {
        let mut tokens = Vec::with_capacity(self.len() + 1);
        tokens.push(executable.to_string());
        tokens.extend(self.tokens());
        CompilerCommand::Sequence(tokens)
    }

    /// Space-joined string form, for toolchains that read compiler
    /// selection from the process environment instead of the build
    /// tool's own settings.
    pub fn joined(&self) -> String {
        match self {
            CompilerCommand::Single(s) => s.clone(),
            CompilerCommand::Sequence(v) => v.join(" "),
        }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        match self {
            CompilerCommand::Single(_) => 1,
            CompilerCommand::Sequence(v) => v.len(),
        }
    }

    /// True for an empty string or an empty sequence.
    ///
    /// Empty entries are left untouched by the rewriter, the same as
    /// absent ones.
    pub fn is_empty(&self) -> bool {
        match self {
            CompilerCommand::Single(s) => s.is_empty(),
            CompilerCommand::Sequence(v) => v.is_empty(),
        }
    }
}

impl From<&str> for CompilerCommand {
    fn from(s: &str) -> Self {
        CompilerCommand::Single(s.to_string())
    }
}

impl From<String> for CompilerCommand {
    fn from(s: String) -> Self {
        CompilerCommand::Single(s)
    }
}

impl From<Vec<String>> for CompilerCommand {
    fn from(v: Vec<String>) -> Self {
        CompilerCommand::Sequence(v)
    }
}

impl From<&[&str]> for CompilerCommand {
    fn from(v: &[&str]) -> Self {
        CompilerCommand::Sequence(v.iter().map(|s| s.to_string()).collect())
    }
}

/// The host build tool's mutable configuration object.
///
/// Two layers: top-level entries keyed by names like `CC`/`CXX`, and a
/// nested string-to-string process-environment map passed to spawned
/// build subprocesses. Both use ordered maps so iteration and
/// serialized output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnv {
    entries: BTreeMap<String, CompilerCommand>,
    env: BTreeMap<String, String>,
}

impl BuildEnv {
    /// Create an empty build environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a top-level entry
    pub fn get(&self, key: &str) -> Option<&CompilerCommand> {
        self.entries.get(key)
    }

    /// Replace (or insert) a top-level entry
    pub fn replace(&mut self, key: impl Into<String>, value: impl Into<CompilerCommand>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a top-level entry
    pub fn remove(&mut self, key: &str) -> Option<CompilerCommand> {
        self.entries.remove(key)
    }

    /// Set a top-level entry, builder style
    pub fn with_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<CompilerCommand>,
    ) -> Self {
        self.replace(key, value);
        self
    }

    /// Get a process-environment variable
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Set a process-environment variable
    pub fn set_env_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Set a process-environment variable, builder style
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_env_var(key, value);
        self
    }

    /// Iterate process-environment variables in key order
    pub fn env_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of process-environment variables
    pub fn env_len(&self) -> usize {
        self.env.len()
    }
}

//! Toolchain rewriting
//!
//! The one pass this crate performs: write the cache tool's
//! configuration variables into the process environment, probe for the
//! tool executable, and if present route the `CC`/`CXX` compiler
//! commands through it. A missing tool is a supported degraded state,
//! not an error; the build proceeds uncached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CacheSettings;
use crate::env::{BuildEnv, CC, CXX};
use crate::probe::{probe_tool, ToolStatus};

/// Process-environment variable: cache storage directory
pub const ENV_CACHE_DIR: &str = "CCACHE_DIR";

/// Process-environment variable: temporary-file directory
pub const ENV_TEMP_DIR: &str = "CCACHE_TEMPDIR";

/// Process-environment variable: compression flag
pub const ENV_COMPRESS: &str = "CCACHE_COMPRESS";

/// Process-environment variable: maximum cache size
pub const ENV_MAX_SIZE: &str = "CCACHE_MAXSIZE";

/// Applies the cache tool rewrite to a build environment.
///
/// Repeated application is stable at the build-tool level: an entry
/// whose first token is already the tool path is left alone. The
/// process-environment `CC`/`CXX` string variables carry no guard of
/// their own; they are re-derived from the (guarded) command entries
/// on every pass.
#[derive(Debug, Clone)]
pub struct Rewriter {
    settings: CacheSettings,
}

impl Rewriter {
    /// Create a rewriter with resolved settings
    pub fn new(settings: CacheSettings) -> Self {
        Self { settings }
    }

    /// The settings this rewriter runs with
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Run the configuration pass against `env`, returning an audit
    /// record of what happened.
    ///
    /// Sequence:
    /// 1. Unconditionally set the four `CCACHE_*` variables in the
    ///    process environment.
    /// 2. Probe for the tool executable. If missing, stop; nothing
    ///    else is mutated.
    /// 3. Prepend the tool path to each of the `CC`/`CXX` entries that
    ///    is present, non-empty, and not already routed through the
    ///    tool. Then mirror the resulting entries into the
    ///    process-environment `CC`/`CXX` string variables
    ///    (space-joined), for toolchains that read compiler selection
    ///    from the environment instead of the build tool's settings.
    pub fn apply(&self, env: &mut BuildEnv) -> RewriteReport {
        env.set_env_var(ENV_CACHE_DIR, self.settings.cache_dir.clone());
        env.set_env_var(ENV_TEMP_DIR, self.settings.temp_dir.clone());
        env.set_env_var(ENV_COMPRESS, self.settings.compress.clone());
        env.set_env_var(ENV_MAX_SIZE, self.settings.max_size.clone());

        let status = probe_tool(&self.settings.tool_path);
        let mut report = RewriteReport::new(self.settings.tool_path.clone(), status);
        if !status.is_found() {
            return report;
        }

        self.rewrite_entry(env, CC);
        self.rewrite_entry(env, CXX);

        report.cc = self.mirror_to_env(env, CC);
        report.cxx = self.mirror_to_env(env, CXX);
        report.env_cc = env.env_var(CC).map(String::from);
        report.env_cxx = env.env_var(CXX).map(String::from);

        report
    }

    /// Run the configuration pass and print the operator lines to
    /// stdout, the way build logs expect them.
    pub fn apply_and_log(&self, env: &mut BuildEnv) -> RewriteReport {
        let report = self.apply(env);
        println!("{}", report.to_human());
        report
    }

    /// Prepend the tool path to one compiler entry, guarded against
    /// double-prepending. Absent and empty entries are left alone.
    fn rewrite_entry(&self, env: &mut BuildEnv, key: &str) {
        let tool = &self.settings.tool_path;
        let rewritten = match env.get(key) {
            Some(cmd) if !cmd.is_empty() && !cmd.starts_with(tool) => cmd.prepend(tool),
            _ => return,
        };
        env.replace(key, rewritten);
    }

    /// Re-read one (possibly just-rewritten) entry and set the
    /// process-environment string variable of the same name to its
    /// space-joined form. Returns the entry's tokens for the report.
    fn mirror_to_env(&self, env: &mut BuildEnv, key: &str) -> Option<Vec<String>> {
        let cmd = env.get(key)?.clone();
        if cmd.is_empty() {
            return None;
        }
        env.set_env_var(key, cmd.joined());
        Some(cmd.into_tokens())
    }
}

/// Audit record for one configuration pass
///
/// Serializable so hosts can persist what the hook did alongside other
/// build artifacts; `to_human()` renders the lines operators see in
/// build logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteReport {
    /// When this pass ran
    pub created_at: DateTime<Utc>,

    /// The probed cache tool path
    pub tool_path: String,

    /// Probe outcome
    pub tool_status: ToolStatus,

    /// Resulting CC command tokens (None if CC was absent/empty or the
    /// tool was missing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<String>>,

    /// Resulting CXX command tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxx: Option<Vec<String>>,

    /// String form written to the process-environment CC variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_cc: Option<String>,

    /// String form written to the process-environment CXX variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_cxx: Option<String>,
}

impl RewriteReport {
    fn new(tool_path: String, tool_status: ToolStatus) -> Self {
        Self {
            created_at: Utc::now(),
            tool_path,
            tool_status,
            cc: None,
            cxx: None,
            env_cc: None,
            env_cxx: None,
        }
    }

    /// True when the cache tool was found and compiler routing applied
    pub fn cache_active(&self) -> bool {
        self.tool_status.is_found()
    }

    /// Render the operator lines for build logs
    pub fn to_human(&self) -> String {
        if !self.cache_active() {
            return "⚠️  ccache not found, builds will not be cached".to_string();
        }

        let fmt = |cmd: &Option<Vec<String>>| match cmd {
            Some(tokens) => tokens.join(" "),
            None => "(unset)".to_string(),
        };

        format!(
            "✅ Configuring ccache for faster builds...\n  CC:  {}\n  CXX: {}",
            fmt(&self.cc),
            fmt(&self.cxx)
        )
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsOverlay;
    use crate::env::CompilerCommand;
    use std::fs;
    use tempfile::TempDir;

    /// Settings pointing at a fake tool inside `dir`; the tool file is
    /// created only when `present` is true.
    fn settings_with_tool(dir: &TempDir, present: bool) -> CacheSettings {
        let tool = dir.path().join("ccache");
        if present {
            fs::write(&tool, "#!/bin/sh\n").unwrap();
        }
        let overrides = SettingsOverlay {
            tool_path: Some(tool.to_string_lossy().to_string()),
            ..Default::default()
        };
        CacheSettings::load(None, Some(overrides)).unwrap()
    }

    fn tool_path(settings: &CacheSettings) -> String {
        settings.tool_path.clone()
    }

    #[test]
    fn test_unconditional_vars_always_set() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, false));
        let mut env = BuildEnv::new();

        rewriter.apply(&mut env);

        assert!(env.env_var(ENV_CACHE_DIR).is_some());
        assert_eq!(env.env_var(ENV_TEMP_DIR), Some("/tmp"));
        assert_eq!(env.env_var(ENV_COMPRESS), Some("1"));
        assert_eq!(env.env_var(ENV_MAX_SIZE), Some("2G"));
    }

    #[test]
    fn test_missing_tool_leaves_compilers_alone() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, false));
        let mut env = BuildEnv::new().with_entry(CC, "gcc").with_entry(CXX, "g++");

        let report = rewriter.apply(&mut env);

        assert!(!report.cache_active());
        assert_eq!(env.get(CC), Some(&CompilerCommand::from("gcc")));
        assert_eq!(env.get(CXX), Some(&CompilerCommand::from("g++")));
        assert_eq!(env.env_var(CC), None);
        assert_eq!(env.env_var(CXX), None);
        // Only the four unconditional variables were written
        assert_eq!(env.env_len(), 4);
    }

    #[test]
    fn test_prepend_single_string() {
        let dir = TempDir::new().unwrap();
        let settings = settings_with_tool(&dir, true);
        let tool = tool_path(&settings);
        let rewriter = Rewriter::new(settings);
        let mut env = BuildEnv::new().with_entry(CC, "gcc");

        let report = rewriter.apply(&mut env);

        assert!(report.cache_active());
        assert_eq!(
            env.get(CC).unwrap().tokens(),
            vec![tool.clone(), "gcc".to_string()]
        );
        assert_eq!(report.cc.unwrap(), vec![tool, "gcc".to_string()]);
    }

    #[test]
    fn test_prepend_sequence_matches_single_shape() {
        let dir = TempDir::new().unwrap();
        let settings = settings_with_tool(&dir, true);
        let tool = tool_path(&settings);
        let rewriter = Rewriter::new(settings);

        let mut env = BuildEnv::new()
            .with_entry(CC, &["gcc", "-std=c11"][..])
            .with_entry(CXX, "g++");

        rewriter.apply(&mut env);

        assert_eq!(
            env.get(CC).unwrap().tokens(),
            vec![tool.clone(), "gcc".to_string(), "-std=c11".to_string()]
        );
        assert_eq!(
            env.get(CXX).unwrap().tokens(),
            vec![tool, "g++".to_string()]
        );
    }

    #[test]
    fn test_idempotent_at_build_level() {
        let dir = TempDir::new().unwrap();
        let settings = settings_with_tool(&dir, true);
        let tool = tool_path(&settings);
        let rewriter = Rewriter::new(settings);
        let mut env = BuildEnv::new().with_entry(CC, "gcc");

        rewriter.apply(&mut env);
        let after_first = env.get(CC).unwrap().clone();

        rewriter.apply(&mut env);
        let after_second = env.get(CC).unwrap().clone();

        assert_eq!(after_first, after_second);
        assert_eq!(after_second.tokens(), vec![tool, "gcc".to_string()]);
    }

    #[test]
    fn test_missing_cc_entry_tolerated() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, true));
        let mut env = BuildEnv::new().with_entry(CXX, "g++");

        let report = rewriter.apply(&mut env);

        assert!(env.get(CC).is_none());
        assert_eq!(env.env_var(CC), None);
        assert!(report.cc.is_none());
        assert!(report.cxx.is_some());
    }

    #[test]
    fn test_empty_cc_entry_tolerated() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, true));
        let mut env = BuildEnv::new().with_entry(CC, CompilerCommand::Sequence(vec![]));

        let report = rewriter.apply(&mut env);

        assert_eq!(env.get(CC), Some(&CompilerCommand::Sequence(vec![])));
        assert_eq!(env.env_var(CC), None);
        assert!(report.cc.is_none());
    }

    #[test]
    fn test_env_string_form_space_joined() {
        let dir = TempDir::new().unwrap();
        let settings = settings_with_tool(&dir, true);
        let tool = tool_path(&settings);
        let rewriter = Rewriter::new(settings);
        let mut env = BuildEnv::new().with_entry(CC, &["gcc", "-Wall"][..]);

        let report = rewriter.apply(&mut env);

        let expected = format!("{} gcc -Wall", tool);
        assert_eq!(env.env_var(CC), Some(expected.as_str()));
        assert_eq!(report.env_cc.unwrap(), expected);
    }

    #[test]
    fn test_already_routed_entry_untouched() {
        let dir = TempDir::new().unwrap();
        let settings = settings_with_tool(&dir, true);
        let tool = tool_path(&settings);
        let rewriter = Rewriter::new(settings);

        let routed: CompilerCommand =
            CompilerCommand::Sequence(vec![tool.clone(), "gcc".to_string()]);
        let mut env = BuildEnv::new().with_entry(CC, routed.clone());

        rewriter.apply(&mut env);

        assert_eq!(env.get(CC), Some(&routed));
        // The string mirror is still written for the routed entry
        assert_eq!(env.env_var(CC), Some(format!("{} gcc", tool).as_str()));
    }

    #[test]
    fn test_report_human_found() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, true));
        let mut env = BuildEnv::new().with_entry(CC, "gcc").with_entry(CXX, "g++");

        let report = rewriter.apply(&mut env);
        let human = report.to_human();

        assert!(human.starts_with("✅ Configuring ccache"));
        assert!(human.contains("CC:"));
        assert!(human.contains("CXX:"));
        assert!(human.contains("gcc"));
    }

    #[test]
    fn test_report_human_missing() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, false));
        let mut env = BuildEnv::new();

        let report = rewriter.apply(&mut env);

        assert_eq!(
            report.to_human(),
            "⚠️  ccache not found, builds will not be cached"
        );
    }

    #[test]
    fn test_report_serialization_round_trip() {
        let dir = TempDir::new().unwrap();
        let rewriter = Rewriter::new(settings_with_tool(&dir, true));
        let mut env = BuildEnv::new().with_entry(CC, "gcc");

        let report = rewriter.apply(&mut env);
        let json = report.to_json().unwrap();
        let parsed: RewriteReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.tool_path, report.tool_path);
        assert_eq!(parsed.tool_status, report.tool_status);
        assert_eq!(parsed.cc, report.cc);
        assert_eq!(parsed.env_cc, report.env_cc);
    }

    #[test]
    fn test_builtin_settings_apply_never_fails() {
        // Probes the real default path; on hosts without ccache this is
        // the degraded branch, and either way the pass completes.
        let rewriter = Rewriter::new(CacheSettings::builtin());
        let mut env = BuildEnv::new().with_entry(CC, "gcc");

        let report = rewriter.apply(&mut env);
        assert!(env.env_len() >= 4);
        assert_eq!(report.tool_path, "/usr/local/bin/ccache");
    }
}

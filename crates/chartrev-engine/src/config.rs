// config.rs — Engine configuration, resolved once at startup.
//
// Loaded from `<project>/.chartrev/config.toml`; every key is optional and a
// missing file yields the defaults. The resulting EngineConfig is passed by
// reference into the components that need it.
//
// Example:
//   data_dir = ".chartrev"
//   default_actor = "ops"
//
//   [reindex]
//   job_kind = "file.reindex"
//   when_all_rejected = false

use std::path::{Path, PathBuf};

use chartrev_queue::REINDEX_JOB_KIND;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Directory under the project root holding config and data.
pub const CONFIG_DIR: &str = ".chartrev";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root for workspace snapshots, plans and the job outbox.
    pub data_dir: PathBuf,

    /// Actor used when a caller does not name one.
    pub default_actor: String,

    pub reindex: ReindexConfig,
}

/// Completion gate behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexConfig {
    /// Job kind submitted to the work queue for each file.
    #[serde(default = "default_job_kind")]
    pub job_kind: String,

    /// Reindex a plan revision even when every patch in it was rejected.
    #[serde(default = "default_when_all_rejected")]
    pub when_all_rejected: bool,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            job_kind: default_job_kind(),
            when_all_rejected: default_when_all_rejected(),
        }
    }
}

fn default_job_kind() -> String {
    REINDEX_JOB_KIND.to_string()
}

fn default_when_all_rejected() -> bool {
    true
}

fn default_actor() -> String {
    "system".to_string()
}

/// On-disk shape: everything optional, relative paths resolved against the project root.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    default_actor: Option<String>,
    #[serde(default)]
    reindex: ReindexConfig,
}

impl EngineConfig {
    /// Defaults for a project: data under `<root>/.chartrev`.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        Self {
            data_dir: project_root.as_ref().join(CONFIG_DIR),
            default_actor: default_actor(),
            reindex: ReindexConfig::default(),
        }
    }

    /// Load `<root>/.chartrev/config.toml`, falling back to defaults when absent.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, EngineError> {
        let root = project_root.as_ref();
        let path = Self::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::for_project(root));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| EngineError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::from_toml(root, &content).map_err(|reason| EngineError::Config { path, reason })
    }

    /// Parse config text, resolving relative paths against `project_root`.
    pub fn from_toml(project_root: impl AsRef<Path>, content: &str) -> Result<Self, String> {
        let root = project_root.as_ref();
        let file: ConfigFile = toml::from_str(content).map_err(|e| e.to_string())?;

        let data_dir = match file.data_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => root.join(dir),
            None => root.join(CONFIG_DIR),
        };
        if file.reindex.job_kind.trim().is_empty() {
            return Err("reindex.job_kind must not be empty".to_string());
        }

        Ok(Self {
            data_dir,
            default_actor: file.default_actor.unwrap_or_else(default_actor),
            reindex: file.reindex,
        })
    }

    pub fn config_path(project_root: impl AsRef<Path>) -> PathBuf {
        project_root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Workspace snapshots and content history.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("workspaces")
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.data_dir.join("plans")
    }

    /// Outbox file for reindex jobs.
    pub fn outbox_path(&self) -> PathBuf {
        self.data_dir.join("outbox").join("jobs.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_project_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::for_project(dir.path()));
        assert_eq!(config.reindex.job_kind, "file.reindex");
        assert!(config.reindex.when_all_rejected);
        assert_eq!(config.store_dir(), dir.path().join(".chartrev/workspaces"));
    }

    #[test]
    fn file_overrides_and_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(
            EngineConfig::config_path(dir.path()),
            r#"
data_dir = "state"
default_actor = "ops"

[reindex]
job_kind = "summary.recompute"
when_all_rejected = false
"#,
        )
        .unwrap();

        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.data_dir, dir.path().join("state"));
        assert_eq!(config.default_actor, "ops");
        assert_eq!(config.reindex.job_kind, "summary.recompute");
        assert!(!config.reindex.when_all_rejected);
    }

    #[test]
    fn partial_reindex_table_keeps_defaults() {
        let config = EngineConfig::from_toml("/srv/app", "[reindex]\nwhen_all_rejected = false\n").unwrap();
        assert_eq!(config.reindex.job_kind, "file.reindex");
        assert_eq!(config.data_dir, PathBuf::from("/srv/app/.chartrev"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(EngineConfig::config_path(dir.path()), "data_dir = [").unwrap();

        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn empty_job_kind_is_rejected() {
        assert!(EngineConfig::from_toml("/srv", "[reindex]\njob_kind = \" \"\n").is_err());
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::index::types::IndexConfig;
use crate::query::SearchConfig;

pub const APP_NAME: &str = "pathfinder";
const CONFIG_FILE: &str = "config.json";

/// Relocates the data directory.
pub const DATA_DIR_ENV: &str = "PATHFINDER_DATA_DIR";
/// Overrides `reindex_interval_secs`.
pub const REINDEX_SECS_ENV: &str = "PATHFINDER_REINDEX_SECS";

pub const LOG_FILE: &str = "paths.log";
pub const SNAPSHOT_FILE: &str = "trigrams.bin";
pub const META_FILE: &str = "meta.json";

/// Application configuration stored in the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Roots seeded into an empty root set
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Seconds between scheduled reindexes; 0 disables the timer
    #[serde(default = "default_reindex_interval_secs")]
    pub reindex_interval_secs: u64,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

fn default_reindex_interval_secs() -> u64 {
    3600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            reindex_interval_secs: default_reindex_interval_secs(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from `data_dir`, or return default if not found.
    /// Environment overrides are applied on top.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Save config to `data_dir`
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let config_path = data_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(REINDEX_SECS_ENV) {
            self.reindex_interval_secs = value
                .trim()
                .parse()
                .with_context(|| {
                    format!(
                        "{} must be a number of seconds, got {:?}",
                        REINDEX_SECS_ENV, value
                    )
                })?;
        }
        Ok(())
    }
}

/// Resolve the data directory: an explicit path wins, then
/// `PATHFINDER_DATA_DIR`, then the platform default. The directory is created.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_app_data_dir()?,
        },
    };

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

/// Platform data directory for pathfinder
fn default_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    Ok(base.join(APP_NAME))
}

/// Make a root absolute without requiring it to exist.
pub fn normalize_root(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| {
        if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.roots.is_empty());
        assert_eq!(config.reindex_interval_secs, 3600);
        assert_eq!(config.search.min_trigram_matches, 3);
        assert_eq!(config.search.shortlist_size, 100);
        assert_eq!(config.search.result_limit, 10);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"roots": ["/srv/share"], "search": {"result_limit": 5}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.roots, vec![PathBuf::from("/srv/share")]);
        assert_eq!(config.search.result_limit, 5);
        assert_eq!(config.search.shortlist_size, 100);
        assert_eq!(config.index, IndexConfig::default());
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.roots.push(PathBuf::from("/data"));
        config.index.include_hidden = true;
        config.save(dir.path()).unwrap();

        let json = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let loaded: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_resolve_explicit_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let resolved = resolve_data_dir(Some(&nested)).unwrap();
        assert_eq!(resolved, nested);
        assert!(nested.is_dir());
    }

    #[test]
    fn test_normalize_root_keeps_missing_absolute() {
        let missing = Path::new("/definitely/not/here");
        assert_eq!(normalize_root(missing), missing);
    }
}

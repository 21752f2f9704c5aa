use crate::paths::{expand_tilde, home_dir};
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const RECENT_LIMIT: usize = 10;

pub const ENV_TARGET_DIR: &str = "REPO_SYNC_TARGET_DIR";
pub const ENV_GITHUB_OWNER: &str = "REPO_SYNC_GITHUB_OWNER";
pub const ENV_SOURCE_DIRS: &str = "REPO_SYNC_SOURCE_DIRS";

/// Settings persisted between sessions.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_owners: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_templates: Vec<String>,
}

impl PersistedConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).context("read config")?;
        let config = serde_json::from_str(&data).context("parse config")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config directory")?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, data).context("write config")?;
        Ok(())
    }
}

/// Moves `value` to the front of `list`, dropping duplicates and anything
/// past [`RECENT_LIMIT`].
pub fn push_recent(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    list.retain(|existing| existing != value);
    list.insert(0, value.to_string());
    list.truncate(RECENT_LIMIT);
}

/// Read-modify-write access to the persisted config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<PersistedConfig> {
        PersistedConfig::load(&self.path)
    }

    pub fn record_recent_template(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let mut config = self.load()?;
        push_recent(&mut config.recent_templates, name);
        config.save(&self.path)?;
        Ok(config.recent_templates)
    }

    pub fn record_recent_owner(&self, owner: &str) -> anyhow::Result<Vec<String>> {
        let mut config = self.load()?;
        push_recent(&mut config.recent_owners, owner);
        config.save(&self.path)?;
        Ok(config.recent_owners)
    }

    /// Writes the editable settings, leaving the recent lists untouched.
    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<PersistedConfig> {
        let mut config = self.load()?;
        settings.apply(&mut config);
        config.save(&self.path)?;
        Ok(config)
    }
}

/// The user-editable part of the config, as entered in the settings form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    pub target_dir: String,
    /// Colon separated.
    pub source_dirs: String,
    pub default_owner: String,
}

impl Settings {
    pub fn from_persisted(config: &PersistedConfig) -> Self {
        Self {
            target_dir: config.target_dir.clone().unwrap_or_default(),
            source_dirs: config.source_dirs.join(":"),
            default_owner: config.default_owner.clone().unwrap_or_default(),
        }
    }

    fn apply(&self, config: &mut PersistedConfig) {
        let non_empty = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        config.target_dir = non_empty(&self.target_dir);
        config.source_dirs = split_dirs(&self.source_dirs);
        config.default_owner = non_empty(&self.default_owner);
    }
}

fn split_dirs(value: &str) -> Vec<String> {
    value
        .split(':')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let project =
        ProjectDirs::from("com", "reposync", "reposync").context("resolve project dirs")?;
    Ok(project.config_dir().join("config.json"))
}

/// Values taken from the process environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvOverrides {
    pub target_dir: Option<String>,
    pub github_owner: Option<String>,
    pub source_dirs: Vec<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            target_dir: non_empty(ENV_TARGET_DIR),
            github_owner: non_empty(ENV_GITHUB_OWNER),
            source_dirs: non_empty(ENV_SOURCE_DIRS)
                .map(|value| split_dirs(&value))
                .unwrap_or_default(),
        }
    }
}

/// Effective session settings: environment first, then the persisted file,
/// then built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub target_dir: PathBuf,
    pub github_owner: Option<String>,
    pub source_dirs: Vec<PathBuf>,
    pub recent_owners: Vec<String>,
    pub recent_templates: Vec<String>,
}

impl AppConfig {
    pub fn load(store: &ConfigStore) -> Self {
        let persisted = match store.load() {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %store.path().display(), error = %format!("{err:#}"), "Ignoring unreadable config");
                PersistedConfig::default()
            }
        };
        Self::resolve(&EnvOverrides::from_env(), &persisted, home_dir().as_deref())
    }

    pub fn resolve(env: &EnvOverrides, persisted: &PersistedConfig, home: Option<&Path>) -> Self {
        let target_dir = env
            .target_dir
            .clone()
            .or_else(|| persisted.target_dir.clone())
            .map(|raw| expand_tilde(&raw, home))
            .unwrap_or_else(|| match home {
                Some(home) => home.join("repos"),
                None => PathBuf::from("repos"),
            });
        let source_dirs = if env.source_dirs.is_empty() {
            &persisted.source_dirs
        } else {
            &env.source_dirs
        };
        let mut source_dirs: Vec<PathBuf> = source_dirs
            .iter()
            .map(|raw| expand_tilde(raw, home))
            .collect();
        if source_dirs.is_empty() {
            source_dirs.push(target_dir.clone());
        }
        Self {
            target_dir,
            github_owner: env
                .github_owner
                .clone()
                .or_else(|| persisted.default_owner.clone()),
            source_dirs,
            recent_owners: persisted.recent_owners.clone(),
            recent_templates: persisted.recent_templates.clone(),
        }
    }
}

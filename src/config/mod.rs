use crate::error::ConfigError;
use crate::providers::{ao3, atlas, fichub};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Process configuration, loaded from `config.toml`. Every section has
/// workable defaults; a missing file yields a default config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub atlas: AtlasConfig,

    #[serde(default)]
    pub fichub: FichubConfig,

    #[serde(default)]
    pub ao3: Ao3Config,

    #[serde(default)]
    pub browse: BrowseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite file path; defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    #[serde(default = "default_atlas_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FichubConfig {
    #[serde(default = "default_fichub_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ao3Config {
    #[serde(default = "default_ao3_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Idle seconds before a browse session stops accepting navigation.
    #[serde(default = "default_browse_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_atlas_base_url() -> String {
    atlas::DEFAULT_BASE_URL.to_string()
}

fn default_fichub_base_url() -> String {
    fichub::DEFAULT_BASE_URL.to_string()
}

fn default_ao3_base_url() -> String {
    ao3::DEFAULT_BASE_URL.to_string()
}

fn default_browse_timeout_secs() -> u64 {
    180
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            base_url: default_atlas_base_url(),
            login: None,
            password: None,
        }
    }
}

impl Default for FichubConfig {
    fn default() -> Self {
        Self {
            base_url: default_fichub_base_url(),
        }
    }
}

impl Default for Ao3Config {
    fn default() -> Self {
        Self {
            base_url: default_ao3_base_url(),
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_browse_timeout_secs(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or the platform config directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
    }

    /// SQLite connection URL, creating the data directory if needed.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        let path = match &self.database.path {
            Some(path) => path.clone(),
            None => default_database_path().ok_or_else(|| {
                ConfigError::Validation("no home directory; set database.path".into())
            })?,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(format!("sqlite://{}?mode=rwc", path.display()))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "ficscout")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

fn default_database_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("ficscout.db"))
}

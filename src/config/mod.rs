//! Configuration resolution for Weekbank.
//!
//! Settings come from an optional TOML file at
//! `~/.config/weekbank/config.toml`, overridden by environment variables,
//! overridden in turn by CLI flags:
//!
//! ```toml
//! backend = "file"            # file | memory | github
//! data_dir = "/var/lib/weekbank"
//!
//! [github]
//! owner = "someone"
//! repo = "tracker"
//! path = "weekbank-state.json"   # optional, this is the default
//! token = "ghp_..."              # or WB_GITHUB_TOKEN / GITHUB_TOKEN
//!
//! [sessions]
//! api_url = "https://api.focusmate.com"   # optional, this is the default
//! api_key = "..."                         # or WB_SESSIONS_API_KEY
//! ```
//!
//! Precedence: CLI flag > env var > config file > default.

use serde::Deserialize;
use std::path::PathBuf;

use crate::sessions::SessionsProxyConfig;
use crate::storage::{BackendType, GitHubBackendConfig};
use crate::{Error, Result};

/// Env var selecting the storage backend.
pub const BACKEND_ENV: &str = "WB_BACKEND";
/// Env var overriding the file backend's data directory.
pub const DATA_DIR_ENV: &str = "WB_DATA_DIR";
/// Weekbank-specific GitHub token (checked before the generic one).
pub const GITHUB_TOKEN_ENV: &str = "WB_GITHUB_TOKEN";
/// Generic GitHub token fallback.
pub const GITHUB_TOKEN_FALLBACK_ENV: &str = "GITHUB_TOKEN";
/// API key for the upstream session provider.
pub const SESSIONS_API_KEY_ENV: &str = "WB_SESSIONS_API_KEY";

/// Default state file name inside the data directory (and in the GitHub
/// repository when no path is configured).
pub const STATE_FILE_NAME: &str = "weekbank-state.json";

/// On-disk configuration schema.
#[derive(Debug, Default, Deserialize)]
pub struct WeekbankConfig {
    pub backend: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub github: Option<GitHubSection>,
    pub sessions: Option<SessionsSection>,
}

/// `[github]` section of the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSection {
    pub owner: String,
    pub repo: String,
    pub path: Option<String>,
    pub token: Option<String>,
}

/// `[sessions]` section of the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsSection {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

/// Values the CLI can force, taking precedence over env and file.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub backend: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved configuration, ready to open a store from.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub backend: BackendType,
    /// State file path used by the file backend
    pub state_path: PathBuf,
    /// Present and complete only when the GitHub backend is selected
    pub github: Option<GitHubBackendConfig>,
    /// Session-provider proxy settings; the key may be absent, in which
    /// case the proxy route reports itself unconfigured
    pub sessions: SessionsProxyConfig,
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("weekbank").join("config.toml"))
}

/// Load the config file if it exists. A present-but-invalid file is an
/// error surfaced at startup, not silently ignored.
fn load_config_file(path: Option<&PathBuf>) -> Result<WeekbankConfig> {
    let path = match path {
        Some(p) => p.clone(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(WeekbankConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(WeekbankConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))
}

/// Resolve the effective configuration from overrides, environment, and
/// the config file.
pub fn resolve(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = load_config_file(overrides.config_path.as_ref())?;

    let backend_name = overrides
        .backend
        .clone()
        .or_else(|| std::env::var(BACKEND_ENV).ok())
        .or_else(|| file.backend.clone())
        .unwrap_or_else(|| "file".to_string());
    let backend = BackendType::from_str(&backend_name)
        .ok_or_else(|| Error::Config(format!("unknown backend '{}'", backend_name)))?;

    let state_path = match overrides
        .data_dir
        .clone()
        .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
        .or_else(|| file.data_dir.clone())
    {
        Some(dir) => dir.join(STATE_FILE_NAME),
        None => crate::storage::FileBackend::default_path()?,
    };

    let github = match (&backend, &file.github) {
        (BackendType::GitHub, Some(section)) => {
            let token = std::env::var(GITHUB_TOKEN_ENV)
                .or_else(|_| std::env::var(GITHUB_TOKEN_FALLBACK_ENV))
                .ok()
                .or_else(|| section.token.clone())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "github backend needs a token ({} or [github].token)",
                        GITHUB_TOKEN_ENV
                    ))
                })?;
            Some(GitHubBackendConfig {
                owner: section.owner.clone(),
                repo: section.repo.clone(),
                path: section
                    .path
                    .clone()
                    .unwrap_or_else(|| STATE_FILE_NAME.to_string()),
                token,
            })
        }
        (BackendType::GitHub, None) => {
            return Err(Error::Config(
                "github backend selected but no [github] section configured".to_string(),
            ));
        }
        _ => None,
    };

    let sessions = SessionsProxyConfig {
        api_url: file
            .sessions
            .as_ref()
            .and_then(|s| s.api_url.clone())
            .unwrap_or_else(|| crate::sessions::DEFAULT_SESSIONS_API_URL.to_string()),
        api_key: std::env::var(SESSIONS_API_KEY_ENV)
            .ok()
            .or_else(|| file.sessions.as_ref().and_then(|s| s.api_key.clone())),
    };

    Ok(ResolvedConfig {
        backend,
        state_path,
        github,
        sessions,
    })
}

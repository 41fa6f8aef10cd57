//! Application configuration loaded from environment variables.
//!
//! The storage backend is chosen once at startup: a local data directory,
//! or a file in a hosted repository reached through its contents API.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Where user documents live
    pub store: StoreConfig,
    /// In-memory sessions unused this long are evicted
    pub session_idle_timeout: Duration,
}

/// Storage backend selection.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// One JSON file per user under `data_dir`.
    Local { data_dir: PathBuf },
    /// One JSON file per user in a hosted repository.
    Github(GithubConfig),
}

/// Settings for the remote contents-API store.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_base: String,
    /// Bearer credential
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository, without leading/trailing `/`
    pub data_dir: String,
}

impl Config {
    /// Config for tests: local store under `data`, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            store: StoreConfig::Local {
                data_dir: PathBuf::from("data"),
            },
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
        {
            "local" => StoreConfig::Local {
                data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
            },
            "github" => StoreConfig::Github(GithubConfig::from_env()?),
            other => return Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            store,
            session_idle_timeout: Duration::from_secs(
                env::var("SESSION_IDLE_SECS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
            ),
        })
    }
}

impl GithubConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: env::var("GITHUB_API_BASE")
                .unwrap_or_else(|_| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            token: env::var("GITHUB_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GITHUB_TOKEN"))?,
            owner: env::var("GITHUB_OWNER").map_err(|_| ConfigError::Missing("GITHUB_OWNER"))?,
            repo: env::var("GITHUB_REPO").map_err(|_| ConfigError::Missing("GITHUB_REPO"))?,
            branch: env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string()),
            data_dir: env::var("GITHUB_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string())
                .trim()
                .trim_matches('/')
                .to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

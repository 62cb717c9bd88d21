//! Application configuration for the link catalog bot.
//!
//! User config lives at `~/.linkcatalog/linkcatalog.toml`.
//! Missing fields take their defaults; `PORT` in the environment overrides `server.port`.
//! Secrets never live in the file: each integration names the environment
//! variable that holds its token.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinkCatalogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "linkcatalog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".linkcatalog";

/// Desktop browser identification sent with webpage fetches.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching linkcatalog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Content-analysis (OpenAI-compatible) settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Remote dataset (GitHub contents API) settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Webpage fetching and URL classification.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Health endpoint.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[telegram]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Name of the env var holding the bot token.
    #[serde(default = "default_telegram_token_env")]
    pub token_env: String,

    /// Bot API base URL.
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token_env: default_telegram_token_env(),
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

fn default_telegram_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".into()
}
fn default_telegram_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_poll_timeout() -> u64 {
    30
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// API base URL; `/chat/completions` is appended.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Chat model used for every analysis call.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout for a single analysis call.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            base_url: default_openai_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_request_timeout() -> u64 {
    30
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Name of the env var holding the personal access token.
    #[serde(default = "default_github_token_env")]
    pub token_env: String,

    /// REST API base URL.
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Repository owner.
    #[serde(default)]
    pub owner: String,

    /// Repository name.
    #[serde(default)]
    pub repo: String,

    /// Path of the catalog JSON document inside the repository.
    #[serde(default = "default_data_path")]
    pub path: String,

    /// Branch to read and commit to (repository default when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Request timeout for dataset reads and writes.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env: default_github_token_env(),
            api_base: default_github_api_base(),
            owner: String::new(),
            repo: String::new(),
            path: default_data_path(),
            branch: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

impl GitHubConfig {
    /// Whether a target repository has been configured.
    pub fn has_repository(&self) -> bool {
        !self.owner.trim().is_empty() && !self.repo.trim().is_empty()
    }
}

fn default_github_token_env() -> String {
    "GITHUB_PAT".into()
}
fn default_github_api_base() -> String {
    "https://api.github.com".into()
}
fn default_data_path() -> String {
    "ai-data.json".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for a single webpage fetch.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest page body read into memory, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// User-Agent header for webpage fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Allow fetching loopback/private addresses.
    #[serde(default)]
    pub allow_private_hosts: bool,

    /// Platforms whose posts are synthesized by the model instead of fetched.
    #[serde(default = "default_social_platforms")]
    pub social: Vec<SocialPlatform>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
            social: default_social_platforms(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_max_redirects() -> usize {
    5
}
fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}
fn default_social_platforms() -> Vec<SocialPlatform> {
    vec![SocialPlatform {
        name: "Twitter".into(),
        post_noun: "Tweet".into(),
        domains: vec!["x.com".into(), "twitter.com".into()],
    }]
}

/// `[[fetch.social]]` entry: a platform that blocks scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPlatform {
    /// Display name, used in the placeholder title ("Twitter Post").
    pub name: String,
    /// What a single post is called ("Tweet by @author").
    pub post_noun: String,
    /// Hosts (and their subdomains) belonging to the platform.
    pub domains: Vec<String>,
}

impl SocialPlatform {
    /// Whether `host` is one of this platform's domains or a subdomain of one.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        })
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the health endpoint.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the health endpoint (`PORT` env var overrides).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.linkcatalog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LinkCatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.linkcatalog/linkcatalog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LinkCatalogError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LinkCatalogError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| LinkCatalogError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LinkCatalogError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| LinkCatalogError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Read a secret from the named env var. Unset and empty are both `None`.
pub fn read_secret(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory when
//! it exists (every key has a default, so the file is optional), then applies
//! `PORT`, `DB_PATH`, `KAI_LOG_LEVEL` and `KAI_LLM_PROVIDER` overrides.
//! Secrets (`ADMIN_KEY`, `ANTHROPIC_API_KEY`) only ever come from the
//! environment.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    /// `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite file location (already expanded, no `~`).
    pub db_path: PathBuf,
}

/// Per-address question rate limit.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

/// Anthropic Messages API configuration (`[llm.anthropic]`).
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Full messages endpoint URL.
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Answer generator configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider: `"anthropic"` or `"dummy"`.
    pub provider: String,
    pub anthropic: AnthropicConfig,
}

/// Fully-resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub llm: LlmConfig,
    /// Admin bearer secret from `ADMIN_KEY`. Empty disables admin access.
    pub admin_key: String,
    /// From `ANTHROPIC_API_KEY`; `None` when unset or empty.
    pub llm_api_key: Option<String>,
}

/// Environment-sourced overrides. Tests build this directly instead of
/// mutating process env.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub db_path: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<String>,
    pub admin_key: Option<String>,
    pub llm_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT").ok(),
            db_path: env::var("DB_PATH").ok(),
            log_level: env::var("KAI_LOG_LEVEL").ok(),
            llm_provider: env::var("KAI_LLM_PROVIDER").ok(),
            admin_key: env::var("ADMIN_KEY").ok(),
            llm_api_key: env::var("ANTHROPIC_API_KEY").ok(),
        }
    }
}

/// Raw TOML shape: `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    rate_limit: RawRateLimit,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind_host")]
    bind_host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize)]
struct RawStore {
    #[serde(default = "default_db_path")]
    db_path: String,
}

impl Default for RawStore {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

#[derive(Deserialize)]
struct RawRateLimit {
    #[serde(default = "default_max_requests")]
    max_requests: usize,
    #[serde(default = "default_window_seconds")]
    window_seconds: u64,
}

impl Default for RawRateLimit {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    anthropic: RawAnthropic,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), anthropic: RawAnthropic::default() }
    }
}

#[derive(Deserialize)]
struct RawAnthropic {
    #[serde(default = "default_anthropic_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_anthropic_model")]
    model: String,
    #[serde(default = "default_anthropic_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_anthropic_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawAnthropic {
    fn default() -> Self {
        Self {
            api_base_url: default_anthropic_api_base_url(),
            model: default_anthropic_model(),
            max_tokens: default_anthropic_max_tokens(),
            timeout_seconds: default_anthropic_timeout_seconds(),
        }
    }
}

fn default_bind_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> String { "/data/kai.db".to_string() }
fn default_max_requests() -> usize { 3 }
fn default_window_seconds() -> u64 { 60 }
fn default_llm_provider() -> String { "anthropic".to_string() }
fn default_anthropic_api_base_url() -> String { "https://api.anthropic.com/v1/messages".to_string() }
fn default_anthropic_model() -> String { "claude-sonnet-4-20250514".to_string() }
fn default_anthropic_max_tokens() -> u32 { 300 }
fn default_anthropic_timeout_seconds() -> u64 { 60 }

/// Load config from `config/default.toml` (if present), then apply env overrides.
pub fn load() -> Result<Config, AppError> {
    load_from(Path::new("config/default.toml"), &Overrides::from_env())
}

/// Internal loader: accepts an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let parsed: RawConfig = if path.exists() {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?
    } else {
        RawConfig::default()
    };

    let port = match overrides.port.as_deref() {
        Some(p) => p
            .trim()
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("invalid PORT '{p}': {e}")))?,
        None => parsed.server.port,
    };

    let db_path_str = overrides.db_path.as_deref().unwrap_or(&parsed.store.db_path);
    let log_level = overrides
        .log_level
        .clone()
        .unwrap_or(parsed.server.log_level);
    crate::logger::parse_level(&log_level)?;
    let provider = overrides
        .llm_provider
        .clone()
        .unwrap_or(parsed.llm.provider);

    if parsed.rate_limit.max_requests == 0 || parsed.rate_limit.window_seconds == 0 {
        return Err(AppError::Config(
            "rate_limit.max_requests and rate_limit.window_seconds must be positive".into(),
        ));
    }

    Ok(Config {
        server: ServerConfig {
            bind_host: parsed.server.bind_host,
            port,
            log_level,
        },
        store: StoreConfig {
            db_path: expand_home(db_path_str),
        },
        rate_limit: RateLimitConfig {
            max_requests: parsed.rate_limit.max_requests,
            window: Duration::from_secs(parsed.rate_limit.window_seconds),
        },
        llm: LlmConfig {
            provider,
            anthropic: AnthropicConfig {
                api_base_url: parsed.llm.anthropic.api_base_url,
                model: parsed.llm.anthropic.model,
                max_tokens: parsed.llm.anthropic.max_tokens,
                timeout_seconds: parsed.llm.anthropic.timeout_seconds,
            },
        },
        admin_key: overrides.admin_key.clone().unwrap_or_default(),
        llm_api_key: overrides
            .llm_api_key
            .clone()
            .filter(|k| !k.trim().is_empty()),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Config for tests: dummy provider, no keys, database under `dir`.
    pub fn test_default(dir: &Path) -> Self {
        Self {
            server: ServerConfig {
                bind_host: "127.0.0.1".into(),
                port: 0,
                log_level: "info".into(),
            },
            store: StoreConfig { db_path: dir.join("kai.db") },
            rate_limit: RateLimitConfig {
                max_requests: default_max_requests(),
                window: Duration::from_secs(default_window_seconds()),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                anthropic: AnthropicConfig {
                    api_base_url: "http://localhost:0/v1/messages".into(),
                    model: "test-model".into(),
                    max_tokens: 16,
                    timeout_seconds: 1,
                },
            },
            admin_key: String::new(),
            llm_api_key: None,
        }
    }
}

//! TOML-based configuration for Sentinel
//!
//! This module loads `sentinel.toml`, which configures the HTTP server, the
//! tool-server boundary and the research agent.
//!
//! # Hot Reloading
//!
//! [`SentinelConfigManager`] keeps the current configuration behind an
//! [`ArcSwap`] so readers never block. [`SentinelConfigManager::start_watching`]
//! reloads the file whenever it changes on disk.
//!
//! Values read per request or per task apply immediately: `agent.max_concurrency`
//! for newly submitted tasks and `server.health_probe_timeout_ms` for the next
//! health check. The `[tools]` section and the listen address are read once
//! at startup; changing them logs a warning and needs a restart.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Accepted values for `server.log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Quiet period after a file event before reloading, so an editor's
/// write-rename sequence yields one reload.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Root configuration structure loaded from sentinel.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Upper bound on the tool server probe made by `GET /health`
    #[serde(default = "default_health_probe_timeout_ms")]
    pub health_probe_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_health_probe_timeout_ms() -> u64 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            health_probe_timeout_ms: default_health_probe_timeout_ms(),
        }
    }
}

// ============= Tool Server Configuration =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base URL of the tool server
    #[serde(default = "default_tools_base_url")]
    pub base_url: String,

    /// Environment variable that, when named, overrides `base_url`
    pub base_url_env: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_tools_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,

    /// Upper bound on scraped characters requested per page
    #[serde(default = "default_scrape_max_chars")]
    pub scrape_max_chars: usize,

    /// Refuse to start the server while the tool server's health probe fails
    #[serde(default)]
    pub require_healthy: bool,

    /// Endpoint paths, relative to `base_url`
    #[serde(default = "default_search_path")]
    pub search_path: String,

    #[serde(default = "default_scrape_path")]
    pub scrape_path: String,

    #[serde(default = "default_extract_path")]
    pub extract_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_tools_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tools_timeout_secs() -> u64 {
    60
}

fn default_search_max_results() -> usize {
    5
}

fn default_scrape_max_chars() -> usize {
    6000
}

fn default_search_path() -> String {
    "/mcp/search".to_string()
}

fn default_scrape_path() -> String {
    "/mcp/scrape".to_string()
}

fn default_extract_path() -> String {
    "/mcp/extract".to_string()
}

fn default_health_path() -> String {
    "/mcp/health".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tools_base_url(),
            base_url_env: None,
            timeout_secs: default_tools_timeout_secs(),
            search_max_results: default_search_max_results(),
            scrape_max_chars: default_scrape_max_chars(),
            require_healthy: false,
            search_path: default_search_path(),
            scrape_path: default_scrape_path(),
            extract_path: default_extract_path(),
            health_path: default_health_path(),
        }
    }
}

impl ToolsConfig {
    /// The base URL after applying the `base_url_env` override.
    pub fn resolved_base_url(&self) -> String {
        self.base_url_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of tool calls in flight for a single task
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("File watcher error: {0}")]
    WatchError(#[from] notify::Error),
}

impl SentinelConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: SentinelConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate value ranges and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref env) = self.tools.base_url_env {
            std::env::var(env).map_err(|_| ConfigError::MissingEnvVar(env.clone()))?;
        }

        let base_url = self.tools.resolved_base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "tools.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.tools.search_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "tools.search_max_results must be greater than 0".to_string(),
            ));
        }

        if self.agent.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_concurrency must be greater than 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.server.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "server.log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.server.log_level
            )));
        }

        if self.server.health_probe_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "server.health_probe_timeout_ms must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("search_path", &self.tools.search_path),
            ("scrape_path", &self.tools.scrape_path),
            ("extract_path", &self.tools.extract_path),
            ("health_path", &self.tools.health_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "tools.{} must start with '/', got '{}'",
                    key, value
                )));
            }
        }

        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        Ok(())
    }
}

// ============= Configuration Manager =============

/// Thread-safe holder for the current configuration, with optional
/// file watching.
pub struct SentinelConfigManager {
    config: ArcSwap<SentinelConfig>,
    config_path: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl SentinelConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute, so watcher events can be matched against it
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = SentinelConfig::load(&path)?;

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            config_path: path,
            watcher: Mutex::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing).
    /// There is no file behind it, so it cannot be watched or reloaded.
    pub fn from_config(config: SentinelConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            config_path: PathBuf::from("sentinel.toml"),
            watcher: Mutex::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<SentinelConfig> {
        self.config.load_full()
    }

    /// Re-read the configuration from disk. The old config stays active on error.
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = Arc::new(SentinelConfig::load(&self.config_path)?);
        let old_config = self.config.swap(Arc::clone(&new_config));

        if old_config.tools != new_config.tools {
            warn!("[tools] changed; the tool client keeps its startup settings until restart");
        }
        if old_config.server.host != new_config.server.host
            || old_config.server.port != new_config.server.port
        {
            warn!("server.host/port changed; the listener keeps its address until restart");
        }

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Reload whenever the config file changes. Must be called from within a
    /// tokio runtime. Watching stops when the manager is dropped or
    /// [`stop_watching`](Self::stop_watching) is called.
    pub fn start_watching(self: &Arc<Self>) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let file_name = self.config_path.file_name().map(|name| name.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory; editors often replace the file.
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }
        *self.watcher.lock() = Some(watcher);

        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(RELOAD_DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                if let Err(e) = manager.reload() {
                    warn!("Failed to hot-reload config: {}. Keeping previous config.", e);
                }
            }
        });

        info!(path = %self.config_path.display(), "Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        if self.watcher.lock().take().is_some() {
            info!("Configuration hot-reload watcher stopped");
        }
    }
}

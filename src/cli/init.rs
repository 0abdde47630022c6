//! Init command implementation
//!
//! Writes a commented default `sentinel.toml`.

use super::output::Output;
use std::fs;
use std::path::PathBuf;

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    Success,
    /// sentinel.toml already exists and `force` was not set
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    pub tools_url: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.header("Initializing Sentinel");

    if let Err(e) = fs::create_dir_all(&config.path) {
        output.error(&format!("Failed to create {}: {}", config.path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let config_path = config.path.join("sentinel.toml");
    if config_path.exists() && !config.force {
        output.warning("sentinel.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if let Err(e) = fs::write(&config_path, render_config(&config)) {
        output.error(&format!("Failed to write sentinel.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("file", &config_path.display().to_string());

    output.hint("Start the server with:");
    output.command(&format!("sentinel-server --config {}", config_path.display()));

    InitResult::Success
}

fn render_config(config: &InitConfig) -> String {
    format!(
        r#"# Sentinel configuration

[server]
host = "127.0.0.1"
port = {port}
# trace, debug, info, warn or error. RUST_LOG takes precedence when set.
log_level = "info"
# pretty or json
log_format = "pretty"
# Bound on the tool server probe made by GET /health
health_probe_timeout_ms = 2000

# Changes to this section take effect after a restart.
[tools]
base_url = "{tools_url}"
# base_url_env = "SENTINEL_TOOLS_URL"
timeout_secs = 60
search_max_results = 5
scrape_max_chars = 6000
require_healthy = false
search_path = "/mcp/search"
scrape_path = "/mcp/scrape"
extract_path = "/mcp/extract"
health_path = "/mcp/health"

# Reloaded while running; applies to newly submitted tasks.
[agent]
# Tool calls in flight per task
max_concurrency = 4
"#,
        port = config.port,
        tools_url = config.tools_url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::SentinelConfig;

    fn init_config(path: PathBuf, force: bool) -> InitConfig {
        InitConfig {
            path,
            force,
            tools_url: "http://tools:9000".to_string(),
            port: 4100,
        }
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(init_config(dir.path().to_path_buf(), false), &Output::no_color());
        assert_eq!(result, InitResult::Success);

        let config = SentinelConfig::load(dir.path().join("sentinel.toml")).unwrap();
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.tools.base_url, "http://tools:9000");
        assert_eq!(config.tools.search_path, "/mcp/search");
        assert_eq!(config.tools.health_path, "/mcp/health");
        assert_eq!(config.server.health_probe_timeout_ms, 2000);
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sentinel.toml"), "# mine\n").unwrap();

        let result = run(init_config(dir.path().to_path_buf(), false), &Output::no_color());
        assert_eq!(result, InitResult::AlreadyExists);
        assert_eq!(
            fs::read_to_string(dir.path().join("sentinel.toml")).unwrap(),
            "# mine\n"
        );

        let result = run(init_config(dir.path().to_path_buf(), true), &Output::no_color());
        assert_eq!(result, InitResult::Success);
    }
}

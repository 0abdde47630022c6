use anyhow::{Context, bail};
use sentinel::{
    AppState, HttpToolClient, SentinelConfigManager, ToolClient, build_app,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::Output,
    },
    utils::toml_config::{ConfigError, ServerConfig},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Init {
            path,
            force,
            tools_url,
            port,
        } => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    tools_url,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => bail!("init failed: {}", e),
            }
        }
        Commands::Check => check(&cli.config, &output).await,
        Commands::Serve => serve(&cli.config, cli.verbose, &output).await,
    }
}

fn load_config(path: &Path, output: &Output) -> anyhow::Result<SentinelConfigManager> {
    match SentinelConfigManager::new(path) {
        Ok(manager) => Ok(manager),
        Err(ConfigError::FileNotFound(missing)) => {
            output.error(&format!("Configuration file not found: {}", missing.display()));
            output.hint("Create one with:");
            output.command("sentinel-server init");
            bail!("missing configuration file {}", missing.display())
        }
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        server.log_level.to_ascii_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sentinel={level},sentinel_server={level},tower_http={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if server.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn check(path: &Path, output: &Output) -> anyhow::Result<()> {
    let manager = load_config(path, output)?;
    let config = manager.config();
    let tools = HttpToolClient::new(&config.tools)?;

    output.header("Tool Server");
    output.kv("base_url", tools.base_url());
    output.kv("timeout", &format!("{}s", config.tools.timeout_secs));

    match tools.health().await {
        Ok(()) => {
            output.success("Tool server is healthy");
            Ok(())
        }
        Err(failure) => {
            output.error(&format!("Tool server health probe failed: {}", failure));
            bail!("tool server unhealthy")
        }
    }
}

async fn serve(path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let manager = load_config(path, output)?;
    let config = manager.config();
    init_tracing(&config.server, verbose);
    output.banner();

    let tools = Arc::new(HttpToolClient::new(&config.tools)?);
    info!(base_url = %tools.base_url(), "Probing tool server");
    match tools.health().await {
        Ok(()) => info!("Tool server is healthy"),
        Err(failure) if config.tools.require_healthy => {
            bail!("tool server health probe failed: {}", failure)
        }
        Err(failure) => warn!(error = %failure, "Tool server health probe failed; accepting tasks anyway"),
    }

    let manager = Arc::new(manager);
    if let Err(e) = manager.start_watching() {
        warn!(error = %e, "Config hot reload unavailable");
    }

    let tools: Arc<dyn ToolClient> = tools;
    let state = AppState::new(Arc::clone(&manager), tools);
    let app = build_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    manager.stop_watching();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

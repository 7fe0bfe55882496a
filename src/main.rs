//! Decision tree API server entry point.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use decision_tree_api::api::{cors_layer, create_router, AppState};
use decision_tree_api::config::Config;
use decision_tree_api::metrics;
use decision_tree_api::tree::TreeStore;
use decision_tree_api::utils::shutdown_signal;

/// Decision tree API server.
#[derive(Parser, Debug)]
#[command(name = "decision-tree-api")]
#[command(about = "Serves a read-only decision tree document over HTTP")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format.
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Load the decision tree once and report whether it would be served.
    CheckTree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("decision_tree_api=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (text_layer, json_layer) = match args.log_format {
        LogFormat::Text => (Some(fmt::layer()), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::CheckTree) => cmd_check_tree().await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config(port_override: Option<u16>) -> anyhow::Result<Config> {
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("DECISION TREE API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Building CORS policy... ");
    if let Err(e) = cors_layer(&config.allowed_origins()) {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("CORS configuration invalid"));
    }
    println!("OK");

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen Address: {}", config.listen_addr());
    println!("  Tree File: {}", config.tree_file.display());
    println!(
        "  Static Dir: {} ({})",
        config.static_dir.display(),
        if config.static_dir_if_present().is_some() {
            "mounted"
        } else {
            "not found, skipped"
        }
    );
    println!(
        "  Metrics: {}",
        if config.metrics_enabled { "Enabled" } else { "Disabled" }
    );
    println!("  Allowed Origins:");
    for origin in config.allowed_origins() {
        println!("    - {}", origin);
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Load the tree file once, the same way `GET /api/tree` does.
async fn cmd_check_tree() -> anyhow::Result<()> {
    let config = load_config(None)?;
    let store = TreeStore::new(&config.tree_file);

    print!("Reading {}... ", store.path().display());
    match store.load().await {
        Ok(tree) => {
            println!("OK");
            println!("  Top-level kind: {}", tree.kind());
            println!("  Size: {} bytes", tree.len());
            Ok(())
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error [{}]: {}", e.code(), e);
            Err(anyhow::anyhow!("Decision tree check failed"))
        }
    }
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config(port_override)?;

    let store = TreeStore::new(&config.tree_file);
    info!("Tree file: {}", store.path().display());

    // The server starts either way; a bad tree only fails /api/tree.
    if let Err(e) = store.load().await {
        warn!("Decision tree is not currently servable: {}", e);
    }

    let mut app_state = AppState::new(store);

    if config.metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => app_state = app_state.with_metrics(handle),
            Err(e) => warn!("Metrics disabled, recorder install failed: {}", e),
        }
    }

    let origins = config.allowed_origins();
    info!("Allowed origins: {}", origins.join(", "));
    let cors = cors_layer(&origins)?;

    let static_dir = config.static_dir_if_present();
    if static_dir.is_none() {
        info!(
            "Static dir {} not found, static assets not mounted",
            config.static_dir.display()
        );
    }

    let router = create_router(app_state, cors, static_dir);

    let listener = config.bind_listener().await.map_err(|e| {
        error!("Failed to bind {}: {}", config.listen_addr(), e);
        e
    })?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

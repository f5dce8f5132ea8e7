use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userhub::api::create_router;
use userhub::build_state;
use userhub::config::AppConfig;
use userhub::db::Database;

#[derive(Parser, Debug)]
#[command(name = "userhub")]
#[command(about = "User management service with token-based authentication")]
#[command(version)]
struct Cli {
    /// Config file path (optional)
    #[arg(short, long, env = "USERHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "USERHUB_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "USERHUB_BIND")]
    bind: Option<String>,

    /// Database file path (overrides config)
    #[arg(short, long, env = "USERHUB_DATABASE")]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "USERHUB_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "userhub=debug,tower_http=debug"
    } else {
        "userhub=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    if config.auth.access_secret.is_empty() || config.auth.refresh_secret.is_empty() {
        bail!(
            "token secrets are not configured; set [auth] access_secret and refresh_secret \
             in the config file or USERHUB_AUTH__ACCESS_SECRET / USERHUB_AUTH__REFRESH_SECRET"
        );
    }

    let database = Database::new(&config.database.path).await?;
    info!(path = %config.database.path.display(), "database ready");

    let state = build_state(&config, &database);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("parsing bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("installing ctrl-c handler");
    info!("shutdown requested");
}

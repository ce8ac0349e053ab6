use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use univera::{AppConfig, AppState, AuthManager, Platform, build_router};

#[derive(Parser, Debug)]
#[command(name = "univera", version, about = "Multi-tenant schema-driven record server")]
struct Args {
    /// Address to listen on (overrides UNIVERA_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Snapshot directory (overrides UNIVERA_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = Some(data_dir);
    }

    let platform = match &config.data_dir {
        Some(dir) => Platform::open(dir, config.engine.clone())
            .await
            .with_context(|| format!("failed to open data directory {}", dir.display()))?,
        None => Platform::in_memory(config.engine.clone()),
    };

    let auth = AuthManager::with_admin(
        &config.admin_username,
        &config.admin_password,
        config.admin_tenant,
        config.bcrypt_cost,
        config.token_ttl,
    )
    .await
    .context("failed to bootstrap admin user")?;

    let app = build_router(AppState::new(platform, Arc::new(auth)));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        bind_addr = %config.bind_addr,
        durable = config.data_dir.is_some(),
        admin = %config.admin_username,
        admin_tenant = %config.admin_tenant,
        "univera started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("univera=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

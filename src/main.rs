use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reportdb::ReportDb;
use reportdb::web::{AppState, build_router};

/// Dynamic-schema report backend server.
#[derive(Debug, Parser)]
#[command(name = "reportdb", version, about)]
struct ServerArgs {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "REPORTDB_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "REPORTDB_PORT")]
    port: u16,

    /// Directory for engine snapshots; purely in-memory when omitted.
    #[arg(long, env = "REPORTDB_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reportdb=info,tower_http=info")),
        )
        .init();

    let args = ServerArgs::parse();

    let db = match &args.data_dir {
        Some(dir) => ReportDb::open(dir).await,
        None => ReportDb::in_memory().await,
    }
    .context("failed to bootstrap the database")?;

    let summary = db
        .registry
        .initialize_all_models()
        .await
        .context("model initialization failed")?;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "model registry ready"
    );

    let state = AppState {
        tables: db.tables.clone(),
        fields: db.fields.clone(),
        reports: db.reports.clone(),
        registry: db.registry.clone(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid bind address")?;
    info!(%addr, "reportdb listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! tutr-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `TUTR_*`
//! environment variables, opens the SQLite store, and serves the JSON API
//! under `/api`.

mod settings;
mod seed;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tutr_api::{AppState, AuthConfig};
use tutr_store_sqlite::SqliteStore;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Tutr marketplace server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert demo users and posts before serving.
  #[arg(long)]
  seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.seed {
    seed::seed(&store).await.context("failed to seed demo data")?;
  }

  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(AuthConfig { token_ttl: server_cfg.token_ttl()? }),
  };

  let app = Router::new()
    .nest("/api", tutr_api::api_router(state))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

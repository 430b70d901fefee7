//! folio-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `FOLIO_*` environment variables, opens the SQLite store and the asset
//! directory, and serves the Folio API over HTTP.
//!
//! # Identity secret hash generation
//!
//! To generate the argon2 PHC string for `identity_secret_hash`:
//!
//! ```text
//! cargo run -p folio-server -- --hash-secret
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use folio_api::AppState;
use folio_assets::{AssetJanitor, FsObjectStore};
use folio_server::{ServerConfig, expand_tilde, spawn_session_purger};
use folio_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Folio portfolio server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a secret entered on stdin and exit.
  #[arg(long)]
  hash_secret: bool,
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

  if cli.hash_secret {
    let secret = read_secret()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FOLIO"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  cfg.asset_root = expand_tilde(&cfg.asset_root);

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let store = Arc::new(store);

  tokio::fs::create_dir_all(&cfg.asset_root)
    .await
    .with_context(|| format!("failed to create asset root {:?}", cfg.asset_root))?;
  let objects = Arc::new(FsObjectStore::new(&cfg.asset_root, cfg.asset_base_url.clone()));
  let (janitor, _janitor_task) = AssetJanitor::spawn(objects.clone());

  let _purger = spawn_session_purger(
    store.clone(),
    Duration::from_secs(cfg.session_purge_secs.max(1)),
  );

  let state = AppState {
    store,
    objects,
    janitor,
    config: Arc::new(cfg.api_config()),
  };
  let app = folio_server::app(state, &cfg.asset_root);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a secret from stdin.
fn read_secret() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Secret: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

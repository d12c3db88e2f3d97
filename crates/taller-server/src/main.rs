//! taller-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers `TALLER_*`
//! environment variables over it, opens the SQLite store and serves the
//! auth, functions, admin and workshop APIs over HTTP.
//!
//! # Bootstrapping the first super admin
//!
//! ```
//! cargo run -p taller-server -- --create-admin admin@example.com
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use taller_core::directory::NewUser;
use taller_server::{AppState, ServerConfig, accounts};
use taller_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Taller studio server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a super admin with this email (password read from stdin) and exit.
  #[arg(long, value_name = "EMAIL")]
  create_admin: Option<String>,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(email) = cli.create_admin {
    let password = read_password()?;
    let created = accounts::create_user(&store, NewUser {
      email: Some(email),
      password: Some(password),
      nombre: Some("Super Admin".to_string()),
      role: Some("super_admin".to_string()),
      ..NewUser::default()
    })
    .await
    .map_err(|e| anyhow::anyhow!(e.in_band_message()))?;
    println!("{}", created.user.id);
    return Ok(());
  }

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = taller_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

//! KARA back-office server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the JSON API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! The API has no sign-up route. Create the first back-office account with:
//!
//! ```text
//! cargo run -p kara-server -- --create-admin admin@kara.ga
//! ```
//!
//! The password is read from stdin.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use kara_api::{AppState, api_router};
use kara_core::{
  identity::{IdentityProvider, NewAccount},
  member::UserRole,
};
use kara_server::ServerConfig;
use kara_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "KARA membership back office")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a back-office account for this email, then exit.
  #[arg(long, value_name = "EMAIL")]
  create_admin: Option<String>,

  /// Role of the account made by `--create-admin`.
  #[arg(long, default_value = "Admin", value_parser = UserRole::parse)]
  role: UserRole,
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
    .add_source(config::Environment::with_prefix("KARA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let identity = store.identity();

  if let Some(email) = cli.create_admin {
    anyhow::ensure!(cli.role.is_admin_like(), "{} is not a back-office role", cli.role);
    let password = read_password()?;
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let account = identity
      .create_account(NewAccount {
        uid: Uuid::new_v4().to_string(),
        email,
        password,
        role: Some(cli.role),
      })
      .await
      .context("failed to create account")?;
    println!("created {} account {} ({})", cli.role, account.email, account.uid);
    return Ok(());
  }

  let state = AppState::new(store, identity, server_cfg.api_config());
  let app = api_router(state).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
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

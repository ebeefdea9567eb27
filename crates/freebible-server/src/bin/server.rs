//! freebible server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `FREEBIBLE_*` environment variables, opens the SQLite store and serves the
//! REST API over HTTP.
//!
//! # Bootstrapping
//!
//! ```text
//! server create-superuser --email root@example.org --name Root --employee-number 1
//! server seed
//! server            # same as `server serve`
//! ```
//!
//! Passwords are read from stdin.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use freebible_api::password::hash_password;
use freebible_server::{
  AppState, ServerConfig,
  accounts::{NewSuperuser, create_superuser},
  seed::seed_defaults,
};
use freebible_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "FreeBible REST server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Create the default bible data and exit.
  Seed,
  /// Create an account with staff and superuser rights.
  CreateSuperuser {
    #[arg(long)]
    email:             String,
    #[arg(long)]
    name:              String,
    #[arg(long)]
    employee_number:   i64,
    /// Defaults to `--name`.
    #[arg(long)]
    collaborator_name: Option<String>,
  },
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {
      let (server_cfg, store) = open(&cli.config).await?;
      serve(store, server_cfg).await?;
    }
    Command::Seed => {
      let (_, store) = open(&cli.config).await?;
      let report = seed_defaults(&store).await.context("seeding failed")?;
      tracing::info!(created = report.created, existing = report.existing, "seed complete");
    }
    Command::CreateSuperuser { email, name, employee_number, collaborator_name } => {
      let (_, store) = open(&cli.config).await?;
      let password = read_password_line()?;
      let user = create_superuser(&store, NewSuperuser {
        email,
        password,
        employee_number,
        name,
        collaborator_name,
      })
      .await
      .context("failed to create superuser")?;
      println!("created superuser {} ({})", user.email, user.code);
    }
    Command::HashPassword => {
      let password = read_password_line()?;
      println!("{}", hash_password(&password)?);
    }
  }

  Ok(())
}

/// Load configuration and open the store it points at.
async fn open(config_path: &Path) -> anyhow::Result<(ServerConfig, SqliteStore)> {
  let settings = config::Config::builder()
    .add_source(config::File::from(config_path).required(false))
    .add_source(config::Environment::with_prefix("FREEBIBLE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  Ok((server_cfg, store))
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  if server_cfg.seed_defaults {
    let report = seed_defaults(&store).await.context("seeding failed")?;
    tracing::info!(created = report.created, "default data ready");
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState { store: Arc::new(store) };
  let app = freebible_server::router(state);

  tracing::info!("Listening on http://{address}/api/v1");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one password line from stdin.
fn read_password_line() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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

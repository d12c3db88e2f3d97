//! `taller`: command-line client for the Taller super-admin endpoints.
//!
//! # Usage
//!
//! ```
//! taller --url http://localhost:8080 login --email admin@example.com
//! export TALLER_TOKEN=...
//! taller create-user --email marta@example.com --password secreto --nombre "Marta Ruiz"
//! taller workshops
//! ```

mod client;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use taller_core::directory::NewUser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "taller", about = "Command-line client for a Taller server")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the server (default: http://localhost:8080).
  #[arg(long, env = "TALLER_URL")]
  url: Option<String>,

  /// Bearer token from `taller login`.
  #[arg(long, env = "TALLER_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and print an access token.
  Login {
    #[arg(long)]
    email:    String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password: Option<String>,
  },
  /// Create a user. Workshop owners also get a workshop.
  CreateUser {
    #[arg(long)]
    email:    String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    nombre:   String,
    /// `super_admin` or `tallerista`.
    #[arg(long)]
    role:     Option<String>,
    #[arg(long)]
    telefono: Option<String>,
    #[arg(long)]
    pais:     Option<String>,
    #[arg(long)]
    ciudad:   Option<String>,
  },
  /// Delete a user and everything their workshop holds.
  DeleteUser {
    user_id: Uuid,
  },
  /// List every workshop.
  Workshops,
  /// Print franchise-wide workshop figures.
  Report,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

fn api_config(url: Option<String>, token: Option<String>, file: ConfigFile) -> ApiConfig {
  // Flags and env override the config file, which overrides defaults.
  ApiConfig {
    base_url: url
      .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    token.or_else(|| (!file.token.is_empty()).then_some(file.token)),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let config = api_config(args.url, args.token, file_cfg);
  tracing::debug!(url = %config.base_url, "using server");
  let client = ApiClient::new(config)?;

  match args.command {
    Command::Login { email, password } => {
      let password = match password {
        Some(p) => p,
        None => read_password()?,
      };
      let session = client.login(&email, &password).await?;
      eprintln!(
        "signed in as {} (expires in {}s)",
        session.user.email, session.expires_in
      );
      println!("{}", session.access_token);
    }
    Command::CreateUser {
      email,
      password,
      nombre,
      role,
      telefono,
      pais,
      ciudad,
    } => {
      let created = client
        .create_user(&NewUser {
          email: Some(email),
          password: Some(password),
          nombre: Some(nombre),
          role,
          telefono,
          pais,
          ciudad,
        })
        .await?;
      println!("{}", serde_json::to_string_pretty(&created)?);
      if let Some(msg) = created["sede"]["error"].as_str() {
        eprintln!("warning: user created but workshop provisioning failed: {msg}");
      }
    }
    Command::DeleteUser { user_id } => {
      println!("{}", client.delete_user(user_id).await?);
    }
    Command::Workshops => {
      for w in client.list_workshops().await? {
        println!(
          "{}  {:<30} {:<24} {}/{}{}",
          w.id,
          w.name,
          w.slug,
          w.city.as_deref().unwrap_or("-"),
          w.country.as_deref().unwrap_or("-"),
          if w.is_active { "" } else { "  (inactive)" },
        );
      }
    }
    Command::Report => {
      let report = client.workshop_report().await?;
      println!("workshops:  {}", report.total);
      println!("active:     {} ({}%)", report.active, report.active_percent);
      println!("unassigned: {}", report.unassigned);
      println!("users:      {}", report.users);
      for (country, count) in &report.by_country {
        println!("  {country}: {count}");
        for city in report.by_city.iter().filter(|c| &c.country == country) {
          println!("    {}: {}", city.city, city.count);
        }
      }
    }
  }

  Ok(())
}

fn read_password() -> Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_override_config_file() {
    let file = ConfigFile {
      url:   "http://taller.example".to_string(),
      token: "from-file".to_string(),
    };
    let cfg = api_config(None, Some("from-env".to_string()), file);
    assert_eq!(cfg.base_url, "http://taller.example");
    assert_eq!(cfg.token.as_deref(), Some("from-env"));

    let cfg = api_config(None, None, ConfigFile::default());
    assert_eq!(cfg.base_url, "http://localhost:8080");
    assert!(cfg.token.is_none());
  }
}

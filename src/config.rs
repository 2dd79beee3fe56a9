use crate::services::expander::SkipPolicy;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub notify_on_upload: bool,
    pub skip_unsupported: bool,
}

/// What the binary does after loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Serve the HTTP API.
    Serve,
    /// Apply the schema and exit.
    Migrate,
    /// Run the expander once on the event stored in this file and exit.
    Event(PathBuf),
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Expands zip archives uploaded to an object store")]
pub struct Args {
    /// Host to bind to (overrides ARCHIVE_EXPANDER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ARCHIVE_EXPANDER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where object payloads are stored (overrides ARCHIVE_EXPANDER_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides ARCHIVE_EXPANDER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Trigger expansion after each uploaded .zip (or ARCHIVE_EXPANDER_NOTIFY_ON_UPLOAD)
    #[arg(long)]
    pub notify_on_upload: bool,

    /// Skip unsupported records instead of stopping the whole event
    /// (or ARCHIVE_EXPANDER_SKIP_UNSUPPORTED)
    #[arg(long)]
    pub skip_unsupported: bool,

    /// Process the notification event in this JSON file and exit
    #[arg(long, value_name = "FILE", conflicts_with = "migrate")]
    pub event: Option<PathBuf>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and run mode.
    pub fn from_env_and_args() -> Result<(Self, RunMode)> {
        Self::resolve(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed arguments over values looked up with `var`.
    pub fn resolve<F>(args: Args, var: F) -> Result<(Self, RunMode)>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let lookup = |name: &str| -> Result<Option<String>> {
            match var(name) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };

        let env_host = lookup("ARCHIVE_EXPANDER_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("ARCHIVE_EXPANDER_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing ARCHIVE_EXPANDER_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_storage =
            lookup("ARCHIVE_EXPANDER_STORAGE_DIR")?.unwrap_or_else(|| "./data/objects".into());
        let env_db = lookup("ARCHIVE_EXPANDER_DATABASE_URL")?
            .unwrap_or_else(|| "sqlite://./data/meta/archive_expander.db".into());
        let env_notify = match lookup("ARCHIVE_EXPANDER_NOTIFY_ON_UPLOAD")? {
            Some(value) => parse_flag("ARCHIVE_EXPANDER_NOTIFY_ON_UPLOAD", &value)?,
            None => false,
        };
        let env_skip = match lookup("ARCHIVE_EXPANDER_SKIP_UNSUPPORTED")? {
            Some(value) => parse_flag("ARCHIVE_EXPANDER_SKIP_UNSUPPORTED", &value)?,
            None => false,
        };

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            notify_on_upload: args.notify_on_upload || env_notify,
            skip_unsupported: args.skip_unsupported || env_skip,
        };

        let mode = match (args.event, args.migrate) {
            (Some(path), _) => RunMode::Event(path),
            (None, true) => RunMode::Migrate,
            (None, false) => RunMode::Serve,
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        if self.skip_unsupported {
            SkipPolicy::SkipRecord
        } else {
            SkipPolicy::AbortEvent
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("parsing {} value `{}` as a boolean", name, other),
    }
}

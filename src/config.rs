// ⚙️ Runtime configuration - database path, bind address, log filter
//
// Defaults, then environment, then command-line flags.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const ENV_DB: &str = "FINANCE_FLOW_DB";
pub const ENV_BIND: &str = "FINANCE_FLOW_BIND";
pub const ENV_LOG: &str = "FINANCE_FLOW_LOG";

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_LOG_FILTER: &str = "info";
const DB_FILE: &str = "finance-flow.db";
const LOG_FILE: &str = "finance-flow.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub log_filter: String,
}

impl Config {
    /// Read the process environment and arguments (program name excluded).
    /// Returns the config and the arguments that were not config flags.
    pub fn from_env_and_args(args: Vec<String>) -> Result<(Config, Vec<String>)> {
        Self::resolve(|key| std::env::var(key).ok(), args)
    }

    pub fn resolve<F>(env: F, args: Vec<String>) -> Result<(Config, Vec<String>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut db_path = env(ENV_DB).map(PathBuf::from).unwrap_or_else(default_db_path);
        let mut bind_raw = env(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let log_filter = env(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let mut rest = Vec::new();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => match iter.next() {
                    Some(path) => db_path = PathBuf::from(path),
                    None => bail!("--db needs a path"),
                },
                "--bind" => match iter.next() {
                    Some(addr) => bind_raw = addr,
                    None => bail!("--bind needs an address"),
                },
                _ => rest.push(arg),
            }
        }

        let bind: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", bind_raw))?;

        Ok((
            Config {
                db_path,
                bind,
                log_filter,
            },
            rest,
        ))
    }

    /// Log file used by the terminal UI, next to the database
    pub fn log_path(&self) -> PathBuf {
        self.db_path.with_file_name(LOG_FILE)
    }

    /// Falls back to `info` when the configured filter does not parse
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }

    /// Make sure the database directory exists
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(dir) = self.db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("finance-flow"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DB_FILE)
}

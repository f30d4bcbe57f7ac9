use anyhow::{bail, Context, Result};
use chrono::Duration;
use std::path::PathBuf;

use crate::reset::DEFAULT_TTL_SECS;

const DEFAULT_LOG_FILTER: &str = "nokri=warn";

/// Runtime configuration from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
    pub reset_ttl: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match get("NOKRI_DB") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_path(),
        };

        let reset_ttl = match get("NOKRI_RESET_TTL_SECS") {
            Some(raw) => {
                let secs: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("NOKRI_RESET_TTL_SECS must be a number, got '{raw}'"))?;
                if secs <= 0 {
                    bail!("NOKRI_RESET_TTL_SECS must be positive, got {secs}");
                }
                Duration::seconds(secs)
            }
            None => Duration::seconds(DEFAULT_TTL_SECS),
        };

        Ok(Self {
            db_path,
            log_filter: get("NOKRI_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            reset_ttl,
        })
    }
}

fn default_path() -> PathBuf {
    // XDG data directory, or the current directory
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "nokri") {
        proj_dirs.data_dir().join("nokri.db")
    } else {
        PathBuf::from("nokri.db")
    }
}

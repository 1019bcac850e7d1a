use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};

use shower_core::{LateSubmissions, RevealConfig};
use shower_types::Choice;

/// Special `SHOWER_DB_PATH` value for a throwaway in-memory database.
pub const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub reveal: RevealConfig,
    pub tick: Duration,
    pub rsvp_webhook: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses settings from any key/value source; unset and empty values
    /// are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("SHOWER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SHOWER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SHOWER_PORT must be a port number")?;
        let db_path: PathBuf = get("SHOWER_DB_PATH")
            .unwrap_or_else(|| "shower.db".into())
            .into();

        let target: DateTime<Utc> = get("SHOWER_REVEAL_AT")
            .ok_or_else(|| anyhow!("SHOWER_REVEAL_AT must be set (RFC 3339, e.g. 2025-07-05T18:05:00-09:00)"))?
            .parse::<DateTime<chrono::FixedOffset>>()
            .context("SHOWER_REVEAL_AT must be an RFC 3339 timestamp")?
            .with_timezone(&Utc);

        let outcome_raw = get("SHOWER_OUTCOME").ok_or_else(|| anyhow!("SHOWER_OUTCOME must be set"))?;
        let outcome: Choice = outcome_raw
            .trim()
            .to_ascii_lowercase()
            .parse()
            .with_context(|| format!("SHOWER_OUTCOME must be one of boy, girl (got {:?})", outcome_raw))?;

        let late_submissions: LateSubmissions = match get("SHOWER_LATE_SUBMISSIONS") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow!("SHOWER_LATE_SUBMISSIONS: {}", e))?,
            None => LateSubmissions::default(),
        };

        let tick_ms: u64 = get("SHOWER_TICK_MS")
            .unwrap_or_else(|| "1000".into())
            .parse()
            .context("SHOWER_TICK_MS must be a number of milliseconds")?;
        if tick_ms == 0 {
            return Err(anyhow!("SHOWER_TICK_MS must be greater than zero"));
        }

        Ok(Self {
            host,
            port,
            db_path,
            reveal: RevealConfig {
                target,
                outcome,
                late_submissions,
            },
            tick: Duration::from_millis(tick_ms),
            rsvp_webhook: get("SHOWER_RSVP_WEBHOOK"),
        })
    }

    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == MEMORY_DB
    }
}

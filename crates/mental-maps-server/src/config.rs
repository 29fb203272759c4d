//! Runtime configuration, read from the environment (and `.env`, if present).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MENTAL_MAPS_HOST` | `0.0.0.0` |
//! | `MENTAL_MAPS_PORT` | `3000` |
//! | `MENTAL_MAPS_DB_PATH` | `mental-maps.db` |
//! | `MENTAL_MAPS_DB_READERS` | `4` |
//! | `MENTAL_MAPS_SEED_USERS` | unset; `id:role,id:role` |

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use mental_maps_db::DEFAULT_READER_POOL_SIZE;
use mental_maps_types::models::Role;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub seed_users: Vec<(String, Role)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("MENTAL_MAPS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("MENTAL_MAPS_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("MENTAL_MAPS_PORT must be a port number")?;
        let db_path: PathBuf = lookup("MENTAL_MAPS_DB_PATH")
            .unwrap_or_else(|| "mental-maps.db".into())
            .into();
        let db_readers = lookup("MENTAL_MAPS_DB_READERS")
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_READER_POOL_SIZE);
        let seed_users = match lookup("MENTAL_MAPS_SEED_USERS") {
            Some(raw) => parse_seed_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            host,
            port,
            db_path,
            db_readers,
            seed_users,
        })
    }
}

fn parse_seed_users(raw: &str) -> Result<Vec<(String, Role)>> {
    let mut users = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((id, role)) = entry.split_once(':') else {
            bail!("seed user '{}' is not in id:role form", entry);
        };
        let id = id.trim();
        if id.is_empty() {
            bail!("seed user '{}' has an empty id", entry);
        }
        let role = Role::parse(role.trim())
            .with_context(|| format!("seed user '{}' has an unknown role", entry))?;
        users.push((id.to_string(), role));
    }
    Ok(users)
}

//! Runtime configuration: where the database and the log file live, and
//! whether a fresh database gets the demo registries.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".ticket-desk";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "tickets.sqlite";
const LOG_FILE_NAME: &str = "ticket-desk.log";

pub const DB_ENV: &str = "TICKET_DESK_DB";
pub const LOG_ENV: &str = "TICKET_DESK_LOG";
pub const SEED_ENV: &str = "TICKET_DESK_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub seed_demo_data: bool,
}

impl Config {
    /// Defaults under `~/.ticket-desk`, overridden by the `TICKET_DESK_*`
    /// environment variables.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|name| env::var(name).ok())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup(DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_path = match lookup(LOG_ENV) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(LOG_FILE_NAME),
        };
        let seed_demo_data = lookup(SEED_ENV).map_or(true, |value| parse_flag(&value));

        Ok(Self {
            db_path,
            log_path,
            seed_demo_data,
        })
    }
}

fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn environment_overrides_paths() {
        let config = resolve(&[(DB_ENV, "/tmp/desk.sqlite"), (LOG_ENV, "/tmp/desk.log")]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/desk.sqlite"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/desk.log"));
        assert!(config.seed_demo_data);
    }

    #[test]
    fn seed_flag_accepts_common_spellings() {
        let base = [(DB_ENV, "/tmp/a"), (LOG_ENV, "/tmp/b")];
        for off in ["0", "false", "No", " off "] {
            let mut vars = base.to_vec();
            vars.push((SEED_ENV, off));
            assert!(!resolve(&vars).seed_demo_data, "{off} should disable seeding");
        }
        let mut vars = base.to_vec();
        vars.push((SEED_ENV, "1"));
        assert!(resolve(&vars).seed_demo_data);
    }
}

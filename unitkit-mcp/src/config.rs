//! Server configuration from the environment

use std::env;
use std::path::PathBuf;
use tracing::warn;
use unitkit_core::{DISPLAY_DECIMALS, MAX_DECIMALS};
use unitkit_history::DEFAULT_CAPACITY;

pub const DATA_PATH_VAR: &str = "UNITKIT_DATA_PATH";
pub const HISTORY_LIMIT_VAR: &str = "UNITKIT_HISTORY_LIMIT";
pub const DECIMALS_VAR: &str = "UNITKIT_DECIMALS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the persisted history and favorites
    pub data_path: PathBuf,
    pub history_limit: usize,
    pub decimals: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data"),
            history_limit: DEFAULT_CAPACITY,
            decimals: DISPLAY_DECIMALS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source. Unparseable or out-of-range values
    /// fall back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_path = lookup(DATA_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let history_limit = match lookup(HISTORY_LIMIT_VAR) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    warn!(var = HISTORY_LIMIT_VAR, value = %raw, "expected a positive integer, using default");
                    defaults.history_limit
                }
            },
            None => defaults.history_limit,
        };

        let decimals = match lookup(DECIMALS_VAR) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n <= MAX_DECIMALS => n,
                _ => {
                    warn!(var = DECIMALS_VAR, value = %raw, max = MAX_DECIMALS, "invalid decimal places, using default");
                    defaults.decimals
                }
            },
            None => defaults.decimals,
        };

        Self { data_path, history_limit, decimals }
    }
}

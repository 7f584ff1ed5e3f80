// Process-level settings: where the state file lives and where to listen.
// Every value has a default; environment variables override them.

use std::{net::SocketAddr, path::PathBuf};

use crate::error::{PlannerError, Result};

pub const DATA_PATH_VAR: &str = "PLANNER_DATA_PATH";
pub const ADDR_VAR: &str = "PLANNER_ADDR";
pub const STATIC_DIR_VAR: &str = "PLANNER_STATIC_DIR";

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_STATIC_DIR: &str = "static";
// Used when the platform has no per-user data directory
pub const FALLBACK_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_path = lookup(DATA_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_path);

        let addr_text = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_text.parse().map_err(|e| PlannerError::Config {
            key: ADDR_VAR.to_string(),
            message: format!("'{addr_text}' is not a socket address: {e}"),
        })?;

        let static_dir = lookup(STATIC_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Self { data_path, addr, static_dir })
    }
}

pub fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("day-planner").join("state.json"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(s.static_dir, PathBuf::from("static"));
        assert_eq!(s.data_path, default_data_path());
    }

    #[test]
    fn overrides_are_applied() {
        let s = Settings::from_lookup(lookup(&[
            (DATA_PATH_VAR, "/tmp/planner.json"),
            (ADDR_VAR, "0.0.0.0:8080"),
            (STATIC_DIR_VAR, "web"),
        ]))
        .unwrap();
        assert_eq!(s.data_path, PathBuf::from("/tmp/planner.json"));
        assert_eq!(s.addr.port(), 8080);
        assert_eq!(s.static_dir, PathBuf::from("web"));
    }

    #[test]
    fn bad_address_is_a_config_error() {
        let err = Settings::from_lookup(lookup(&[(ADDR_VAR, "localhost")])).unwrap_err();
        assert!(matches!(err, PlannerError::Config { ref key, .. } if key == ADDR_VAR));
    }
}

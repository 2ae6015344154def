use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::StoreConfig;

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TICKETPAD_HOME";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no data directory: set TICKETPAD_HOME or HOME, or pass --data-dir")]
    NoDataDir,
}

/// Resolve the data directory: explicit flag, then `TICKETPAD_HOME`, then
/// `$XDG_DATA_HOME/ticketpad`, then `$HOME/.local/share/ticketpad`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    resolve_data_dir_with(explicit, |key| std::env::var(key).ok())
}

fn resolve_data_dir_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(home) = env(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    if let Some(xdg) = env("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("ticketpad"));
    }
    env("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".local/share/ticketpad"))
        .ok_or(ConfigError::NoDataDir)
}

/// Load `config.toml` from the data directory; a missing file means defaults.
pub fn read_config(data_dir: &Path) -> Result<StoreConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreConfig::default()),
        Err(e) => return Err(ConfigError::Read { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::BoardConfig;

/// Name of the optional config file inside the data directory
pub const CONFIG_FILE: &str = "taskboard.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("invalid {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read `taskboard.toml` from `data_dir`. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<BoardConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BoardConfig::default()),
        Err(source) => return Err(ConfigError::ReadError { path, source }),
    };
    toml::from_str(&text).map_err(|source| ConfigError::ParseError { path, source })
}

/// Pick the data directory: the explicit flag, then `$TB_DATA_DIR`, then
/// `$XDG_DATA_HOME/taskboard`, then `~/.local/share/taskboard`.
pub fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    resolve_data_dir_with(flag, |key| std::env::var(key).ok())
}

/// `resolve_data_dir` with an injectable environment lookup
pub fn resolve_data_dir_with(flag: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
    if let Some(dir) = non_empty("TB_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = non_empty("XDG_DATA_HOME") {
        return PathBuf::from(dir).join("taskboard");
    }
    let home = non_empty("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/"));
    home.join(".local").join("share").join("taskboard")
}

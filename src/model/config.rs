use serde::{Deserialize, Serialize};

/// Default number of undo steps kept
pub const DEFAULT_UNDO_DEPTH: usize = 10;
/// Smallest allowed undo depth
pub const MIN_UNDO_DEPTH: usize = 1;
/// Largest allowed undo depth
pub const MAX_UNDO_DEPTH: usize = 100;

/// Clamp an undo depth into the supported range
pub fn clamp_undo_depth(depth: usize) -> usize {
    depth.clamp(MIN_UNDO_DEPTH, MAX_UNDO_DEPTH)
}

/// Configuration from taskboard.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub overdue: OverdueConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Used when the store holds no undo-depth setting
    #[serde(default = "default_depth")]
    pub default_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            default_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueConfig {
    /// Flag overdue tasks important on every refresh
    #[serde(default = "default_true")]
    pub auto_mark: bool,
}

impl Default for OverdueConfig {
    fn default() -> Self {
        OverdueConfig { auto_mark: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing-subscriber filter directive, e.g. "warn" or "taskboard=debug"
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_filter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_depth() -> usize {
    DEFAULT_UNDO_DEPTH
}

fn default_filter() -> String {
    "warn".to_string()
}

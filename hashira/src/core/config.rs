use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 100;
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/hashira.sock";
pub const RULES_FILE_NAME: &str = "rules.json";

/// Daemon runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rules_path: PathBuf,
    pub socket_path: PathBuf,
    /// Delay between a window's creation and its first evaluation.
    pub debounce_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.rules_path = path;
        }
        self
    }

    pub fn with_debounce_ms(mut self, ms: Option<u64>) -> Self {
        if let Some(ms) = ms {
            self.debounce_delay = Duration::from_millis(ms);
        }
        self
    }
}

/// `$XDG_CONFIG_HOME/hashira/rules.json`, or the working directory when no
/// config directory can be determined.
pub fn default_rules_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("hashira"))
        .unwrap_or_default()
        .join(RULES_FILE_NAME)
}

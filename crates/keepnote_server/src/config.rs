//! Environment-driven server configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `KEEPNOTE_BIND_ADDR` | `127.0.0.1:8080` |
//! | `KEEPNOTE_DB_PATH` | `keepnote.sqlite3` |
//! | `KEEPNOTE_LOG_LEVEL` | `debug` (debug builds) / `info` (release) |
//! | `KEEPNOTE_LOG_DIR` | `<cwd>/logs` |

use keepnote_core::{default_log_level, LoggingError, LoggingSettings};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const ENV_BIND_ADDR: &str = "KEEPNOTE_BIND_ADDR";
const ENV_DB_PATH: &str = "KEEPNOTE_DB_PATH";
const ENV_LOG_LEVEL: &str = "KEEPNOTE_LOG_LEVEL";
const ENV_LOG_DIR: &str = "KEEPNOTE_LOG_DIR";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_PATH: &str = "keepnote.sqlite3";
const DEFAULT_LOG_SUBDIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Always absolute.
    pub log_dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBindAddr { value: String, reason: String },
    Blank(&'static str),
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddr { value, reason } => {
                write!(f, "{ENV_BIND_ADDR}=`{value}` is not a socket address: {reason}")
            }
            Self::Blank(variable) => write!(f, "{variable} must not be blank"),
            Self::CurrentDir(err) => write!(f, "cannot resolve working directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            _ => None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_value = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidBindAddr {
                value: bind_value.clone(),
                reason: err.to_string(),
            })?;

        let db_path = non_blank(lookup(ENV_DB_PATH), ENV_DB_PATH)?
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);
        let log_level = non_blank(lookup(ENV_LOG_LEVEL), ENV_LOG_LEVEL)?
            .unwrap_or_else(|| default_log_level().to_string());

        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        let log_dir = match non_blank(lookup(ENV_LOG_DIR), ENV_LOG_DIR)? {
            Some(dir) => absolutize(&cwd, Path::new(&dir)),
            None => cwd.join(DEFAULT_LOG_SUBDIR),
        };

        Ok(Self {
            bind_addr,
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Logging settings for the server process (mirrored to stderr).
    pub fn logging_settings(&self) -> Result<LoggingSettings, LoggingError> {
        LoggingSettings::new(&self.log_level, &self.log_dir.to_string_lossy(), true)
    }
}

fn non_blank(value: Option<String>, variable: &'static str) -> Result<Option<String>, ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Blank(variable)),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_path.to_str(), Some("keepnote.sqlite3"));
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("logs"));
    }

    #[test]
    fn relative_log_dir_is_made_absolute() {
        let config =
            ServerConfig::from_lookup(lookup(&[("KEEPNOTE_LOG_DIR", "var/log")])).unwrap();
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("var/log"));
    }

    #[test]
    fn bad_bind_addr_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&[("KEEPNOTE_BIND_ADDR", "localhost")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    }

    #[test]
    fn blank_db_path_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("KEEPNOTE_DB_PATH", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Blank("KEEPNOTE_DB_PATH")));
    }

    #[test]
    fn log_level_is_validated_by_logging_settings() {
        let config =
            ServerConfig::from_lookup(lookup(&[("KEEPNOTE_LOG_LEVEL", "chatty")])).unwrap();
        assert!(config.logging_settings().is_err());
    }
}

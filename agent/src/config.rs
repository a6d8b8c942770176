//! Agent configuration: target database, monitored role, polling, logging.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Connection to the monitored database
    pub database: DatabaseConfig,
    /// Role, polling interval and state file
    pub monitor: MonitorConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database to connect to
    pub name: String,
    /// Give up on the initial connection after this many seconds
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Role whose privileges are tracked
    pub role: String,
    /// Pause between the end of one cycle and the start of the next (seconds).
    /// Zero runs a single cycle and exits.
    pub interval_secs: u64,
    /// Deadline for one collection (seconds); zero disables it
    pub cycle_timeout_secs: u64,
    /// Where the last snapshot is persisted
    pub state_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "admin".to_string(),
            password: "admin".to_string(),
            name: "testdb".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            role: "monitorado".to_string(),
            interval_secs: 10,
            cycle_timeout_secs: 0,
            state_file: PathBuf::from("permissions_state.json"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl DatabaseConfig {
    /// Driver options; TLS is disabled.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(PgSslMode::Disable)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        (self.cycle_timeout_secs > 0).then(|| Duration::from_secs(self.cycle_timeout_secs))
    }
}

impl AgentConfig {
    /// Load from JSON file if present; a missing file yields the defaults.
    /// An unreadable or malformed file is an error, never a silent fallback.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"monitor": {"role": "auditor", "interval_secs": 30}}"#).unwrap();
        let c = AgentConfig::load(&path).unwrap();
        assert_eq!(c.monitor.role, "auditor");
        assert_eq!(c.monitor.interval(), Duration::from_secs(30));
        assert_eq!(c.monitor.state_file, PathBuf::from("permissions_state.json"));
        assert_eq!(c.database.port, 5432);
        assert!(c.log.json);
    }

    #[test]
    fn wrongly_typed_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"monitor": {"role": "auditor", "interval_secs": "30"}}"#).unwrap();
        assert!(matches!(AgentConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = AgentConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(c.monitor.role, "monitorado");
    }

    #[test]
    fn unreadable_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        assert!(matches!(AgentConfig::load(dir.path()), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let mut m = MonitorConfig::default();
        assert_eq!(m.cycle_timeout(), None);
        m.cycle_timeout_secs = 5;
        assert_eq!(m.cycle_timeout(), Some(Duration::from_secs(5)));
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestConfig {
    /// Interface every simulated client binds to
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Number of simulated clients
    #[serde(default = "default_clients")]
    pub clients: usize,
    /// Pause between two client launches, in seconds
    #[serde(default = "default_delay")]
    pub delay_secs: f64,
    /// Bound on each wait for a server reply, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
    /// Log a progress line for every Nth client that gets a lease (0 = never)
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
    /// Seed for identity generation; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Exit with a non-zero status when any transaction fails
    #[serde(default)]
    pub strict: bool,
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_clients() -> usize {
    50
}

fn default_delay() -> f64 {
    0.1
}

fn default_timeout() -> f64 {
    5.0
}

fn default_progress_every() -> usize {
    10
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            clients: default_clients(),
            delay_secs: default_delay(),
            timeout_secs: default_timeout(),
            progress_every: default_progress_every(),
            seed: None,
            strict: false,
        }
    }
}

impl LoadTestConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interface.trim().is_empty() {
            return Err(ConfigError::Invalid("interface must not be empty".into()));
        }
        seconds("delay", self.delay_secs)?;
        if seconds("timeout", self.timeout_secs)?.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_secs
            )));
        }
        Ok(())
    }

    /// Inter-launch pause. Only meaningful once `validate` has passed.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Per-reply wait bound. Only meaningful once `validate` has passed.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }
}

/// Negative, NaN, infinite and out-of-range values have no `Duration`.
fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Invalid(format!(
            "{} must be a non-negative number of seconds within range, got {}",
            name, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoadTestConfig::default();
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.clients, 50);
        assert_eq!(config.delay(), Duration::from_millis(100));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.progress_every, 10);
        assert!(!config.strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "interface": "dhcp",
            "clients": 200,
            "delay_secs": 0
        }"#;
        let config: LoadTestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interface, "dhcp");
        assert_eq!(config.clients, 200);
        assert_eq!(config.delay(), Duration::ZERO);
        assert_eq!(config.timeout_secs, 5.0);
    }

    #[test]
    fn test_empty_json_matches_default() {
        let config: LoadTestConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoadTestConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            LoadTestConfig {
                interface: " ".into(),
                ..Default::default()
            },
            LoadTestConfig {
                delay_secs: -0.5,
                ..Default::default()
            },
            LoadTestConfig {
                delay_secs: f64::NAN,
                ..Default::default()
            },
            LoadTestConfig {
                delay_secs: 1e20,
                ..Default::default()
            },
            LoadTestConfig {
                timeout_secs: 0.0,
                ..Default::default()
            },
            LoadTestConfig {
                timeout_secs: f64::INFINITY,
                ..Default::default()
            },
            LoadTestConfig {
                timeout_secs: 1e20,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_accepted_values_keep_their_duration() {
        let config = LoadTestConfig {
            delay_secs: 3600.0,
            timeout_secs: 86_400.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.delay(), Duration::from_secs(3600));
        assert_eq!(config.timeout(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_load_missing_file() {
        let err = LoadTestConfig::load(Path::new("/nonexistent/loadtest.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("dhcp-loadtest-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"clients": 7, "strict": true}"#).unwrap();
        let config = LoadTestConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.clients, 7);
        assert!(config.strict);
        assert_eq!(config.interface, "eth0");
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, LoadTestConfig};

/// Concurrent DHCP lease acquisition load tester.
///
/// Simulates many clients with random locally administered MAC addresses,
/// each tagged with an option 82 circuit id, and reports how many got a lease.
#[derive(Debug, Parser)]
#[command(name = "dhcp-loadtest", version)]
pub struct Cli {
    /// Network interface to bind all simulated clients to [default: eth0]
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Number of simulated clients [default: 50]
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Delay between client launches, in seconds [default: 0.1]
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// Per-stage reply timeout, in seconds [default: 5]
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// JSON config file; flags given on the command line take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible client identities
    #[arg(long)]
    pub seed: Option<u64>,

    /// Exit with status 1 if any transaction failed
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Merge flags over the config file (or defaults) and validate the result.
    pub fn into_config(self) -> Result<LoadTestConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => LoadTestConfig::load(path)?,
            None => LoadTestConfig::default(),
        };

        if let Some(interface) = self.interface {
            config.interface = interface;
        }
        if let Some(count) = self.count {
            config.clients = count;
        }
        if let Some(delay) = self.delay {
            config.delay_secs = delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.strict |= self.strict;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dhcp-loadtest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config, LoadTestConfig::default());
    }

    #[test]
    fn test_short_flags() {
        let config = parse(&["-i", "dhcp", "-n", "10", "-d", "0", "-t", "1.5"])
            .into_config()
            .unwrap();
        assert_eq!(config.interface, "dhcp");
        assert_eq!(config.clients, 10);
        assert_eq!(config.delay_secs, 0.0);
        assert_eq!(config.timeout_secs, 1.5);
    }

    #[test]
    fn test_long_flags() {
        let config = parse(&["--interface", "lan0", "--count", "0", "--seed", "9", "--strict"])
            .into_config()
            .unwrap();
        assert_eq!(config.interface, "lan0");
        assert_eq!(config.clients, 0);
        assert_eq!(config.seed, Some(9));
        assert!(config.strict);
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("dhcp-loadtest-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"interface": "vlan10", "clients": 500, "delay_secs": 0.5}"#).unwrap();

        let config = parse(&["-c", path.to_str().unwrap(), "-n", "20"])
            .into_config()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.interface, "vlan10");
        assert_eq!(config.clients, 20);
        assert_eq!(config.delay_secs, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse(&["-t", "0"]).into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = parse(&["-t", "1e20"]).into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        assert!(Cli::try_parse_from(["dhcp-loadtest", "-n", "many"]).is_err());
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dhcp_loadtest::cli::Cli;
use dhcp_loadtest::{report, run_load_test};
use dhcp_wire::DhcpClient;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "info,dhcp_loadtest=info,dhcp_wire=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Cli::parse()
        .into_config()
        .context("Invalid load test configuration")?;

    let mut rng = match config.seed {
        Some(seed) => {
            info!("Using identity seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let result = run_load_test(&config, Arc::new(DhcpClient::new()), &mut rng).await;

    println!("{}", result);
    report::log_breakdown(&result);

    if config.strict && result.failures() > 0 {
        warn!("{} failed transactions in strict mode, exiting with status 1", result.failures());
        std::process::exit(1);
    }

    Ok(())
}

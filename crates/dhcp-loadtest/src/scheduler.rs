use std::sync::Arc;

use dhcp_wire::LeaseExchange;
use rand::Rng;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::LoadTestConfig;
use crate::executor::execute_transaction;
use crate::identity::ClientIdentity;
use crate::stats::{AggregateResult, LeaseStats};

/// Launch `config.clients` lease transactions, one every `config.delay()`,
/// and wait for all of them.
///
/// Identities are drawn from `rng` in launch order. Each client runs as its own
/// task; a failing or panicking client is counted and never affects the others.
pub async fn run_load_test<E, R>(
    config: &LoadTestConfig,
    exchange: Arc<E>,
    rng: &mut R,
) -> AggregateResult
where
    E: LeaseExchange,
    R: Rng,
{
    let total = config.clients;
    let delay = config.delay();
    let timeout = config.timeout();
    let progress_every = config.progress_every;
    let interface: Arc<str> = Arc::from(config.interface.as_str());

    info!(
        "--- Starting Load Test: {} clients on {} ---",
        total, interface
    );

    let stats = Arc::new(LeaseStats::new(total));
    let mut tasks = JoinSet::new();
    let start = Instant::now();

    for index in 0..total {
        let identity = ClientIdentity::generate(rng);
        let exchange = exchange.clone();
        let stats = stats.clone();
        let interface = interface.clone();

        tasks.spawn(async move {
            let tx = execute_transaction(&*exchange, index, identity, &interface, timeout).await;

            if let Some(lease) = tx.lease() {
                if progress_every > 0 && (index + 1) % progress_every == 0 {
                    info!(
                        "[{}/{}] Success ({}) -> Assigned IP: {}",
                        index + 1,
                        total,
                        tx.identity.tag,
                        lease.assigned
                    );
                }
            }

            stats.record(&tx);
        });

        if !delay.is_zero() && index + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    info!("--- Sending Complete. Waiting for remaining transactions... ---");

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Client task aborted: {}", e);
            stats.record_aborted();
        }
    }

    let elapsed = start.elapsed();
    debug_assert_eq!(stats.recorded(), stats.requested());
    stats.finish(elapsed)
}

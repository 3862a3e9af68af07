use std::time::Duration;

use dhcp_wire::{
    ExchangeError, ExchangeState, FailureKind, Lease, LeaseExchange, LeaseHandle, RelayAgentInfo,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::identity::ClientIdentity;

#[derive(Debug)]
pub enum TransactionOutcome {
    Acked(Lease),
    Failed {
        kind: FailureKind,
        error: ExchangeError,
    },
}

/// One lease acquisition attempt for one simulated client. Never retried.
#[derive(Debug)]
pub struct LeaseTransaction {
    pub index: usize,
    pub identity: ClientIdentity,
    pub elapsed: Duration,
    pub outcome: TransactionOutcome,
}

impl LeaseTransaction {
    pub fn lease(&self) -> Option<&Lease> {
        match &self.outcome {
            TransactionOutcome::Acked(lease) => Some(lease),
            TransactionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_acked(&self) -> bool {
        self.lease().is_some()
    }

    pub fn terminal_state(&self) -> ExchangeState {
        match &self.outcome {
            TransactionOutcome::Acked(_) => ExchangeState::AckReceived,
            TransactionOutcome::Failed { error, .. } => error.terminal_state(),
        }
    }
}

/// Drive `identity` through a full DORA exchange.
///
/// The exchange handle is closed before returning on every path. Errors are
/// logged with the client index and returned inside the transaction.
pub async fn execute_transaction<E: LeaseExchange>(
    exchange: &E,
    index: usize,
    identity: ClientIdentity,
    interface: &str,
    timeout: Duration,
) -> LeaseTransaction {
    let started_at = Instant::now();
    let relay = RelayAgentInfo::circuit_id(identity.tag_bytes());

    let result = match exchange.open(interface, identity.mac, timeout).await {
        Ok(mut handle) => {
            let result = handle.request_lease(&relay).await;
            handle.close();
            if let Err(e) = &result {
                warn!("[{}] DORA failed: {}", index, e);
            }
            result
        }
        Err(e) => {
            warn!("[{}] Error creating client: {}", index, e);
            Err(e)
        }
    };

    let outcome = match result {
        Ok(lease) => {
            debug!(
                client = index,
                mac = %identity.mac_str(),
                tag = identity.tag,
                ip = %lease.assigned,
                "Lease acquired"
            );
            TransactionOutcome::Acked(lease)
        }
        Err(error) => TransactionOutcome::Failed {
            kind: error.kind(),
            error,
        },
    };

    LeaseTransaction {
        index,
        identity,
        elapsed: started_at.elapsed(),
        outcome,
    }
}

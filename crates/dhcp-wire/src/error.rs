use std::net::Ipv4Addr;
use thiserror::Error;

use crate::exchange::ExchangeState;

/// How a failed exchange is counted by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Socket or interface could not be set up, or the socket failed mid-exchange.
    Setup,
    /// No reply within the per-stage timeout.
    TimedOut,
    /// Server answered DHCPNAK, or the exchange was otherwise invalid.
    Rejected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Setup => write!(f, "setup"),
            FailureKind::TimedOut => write!(f, "timed out"),
            FailureKind::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Failed to open DHCP socket on '{interface}': {source}")]
    Setup {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {waited_ms}ms in state {state}")]
    Timeout { state: ExchangeState, waited_ms: u128 },

    #[error("DHCPNAK from {server}")]
    Rejected { server: Ipv4Addr },

    #[error("Invalid exchange: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExchangeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExchangeError::Setup { .. } | ExchangeError::Io(_) => FailureKind::Setup,
            ExchangeError::Timeout { .. } => FailureKind::TimedOut,
            ExchangeError::Rejected { .. } | ExchangeError::Protocol(_) => FailureKind::Rejected,
        }
    }

    /// Terminal state of the transaction that produced this error.
    pub fn terminal_state(&self) -> ExchangeState {
        match self.kind() {
            FailureKind::TimedOut => ExchangeState::TimedOut,
            FailureKind::Setup | FailureKind::Rejected => ExchangeState::Rejected,
        }
    }
}

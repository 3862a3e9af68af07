//! Capability interface for one DORA lease exchange.
//!
//! Callers open a handle per simulated client, ask it for a lease, and close
//! it. The trait seam lets the load tester run against [`crate::DhcpClient`]
//! on a real interface or against a scripted fake in tests.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExchangeError;
use crate::options::RelayAgentInfo;

/// A lease granted by a DHCPACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub assigned: Ipv4Addr,
    pub server: Ipv4Addr,
    pub lease_time_secs: Option<u32>,
}

/// Progress of a single DORA exchange.
///
/// `INIT → DISCOVER_SENT → OFFER_RECEIVED → REQUEST_SENT → {ACK_RECEIVED | TIMED_OUT | REJECTED}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Init,
    DiscoverSent,
    OfferReceived,
    RequestSent,
    AckReceived,
    TimedOut,
    Rejected,
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExchangeState::AckReceived | ExchangeState::TimedOut | ExchangeState::Rejected
        )
    }

    /// Next state on the success path, `None` once terminal.
    pub fn advance(self) -> Option<ExchangeState> {
        match self {
            ExchangeState::Init => Some(ExchangeState::DiscoverSent),
            ExchangeState::DiscoverSent => Some(ExchangeState::OfferReceived),
            ExchangeState::OfferReceived => Some(ExchangeState::RequestSent),
            ExchangeState::RequestSent => Some(ExchangeState::AckReceived),
            _ => None,
        }
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExchangeState::Init => "INIT",
            ExchangeState::DiscoverSent => "DISCOVER_SENT",
            ExchangeState::OfferReceived => "OFFER_RECEIVED",
            ExchangeState::RequestSent => "REQUEST_SENT",
            ExchangeState::AckReceived => "ACK_RECEIVED",
            ExchangeState::TimedOut => "TIMED_OUT",
            ExchangeState::Rejected => "REJECTED",
        };
        f.write_str(name)
    }
}

/// Opens exchange contexts, one per simulated client.
#[async_trait]
pub trait LeaseExchange: Send + Sync + 'static {
    type Handle: LeaseHandle;

    /// Acquire an exchange context (e.g. a bound socket) for `mac` on `interface`.
    /// `timeout` bounds every wait for a server reply made through the handle.
    async fn open(
        &self,
        interface: &str,
        mac: [u8; 6],
        timeout: Duration,
    ) -> Result<Self::Handle, ExchangeError>;
}

/// An open exchange context for one client identity.
#[async_trait]
pub trait LeaseHandle: Send {
    /// Run discover → offer → request → ack, attaching `relay` to every outgoing message.
    async fn request_lease(&mut self, relay: &RelayAgentInfo) -> Result<Lease, ExchangeError>;

    /// Release the context. Dropping the handle releases it as well.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

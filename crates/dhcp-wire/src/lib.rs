pub mod client;
pub mod error;
pub mod exchange;
pub mod options;
pub mod packet;

pub use client::{DhcpClient, DhcpSession};
pub use error::{ExchangeError, FailureKind};
pub use exchange::{ExchangeState, Lease, LeaseExchange, LeaseHandle};
pub use options::RelayAgentInfo;

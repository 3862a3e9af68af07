//! Scripted in-memory exchange for executor and scheduler tests.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dhcp_wire::options::AGENT_CIRCUIT_ID;
use dhcp_wire::{ExchangeError, ExchangeState, Lease, LeaseExchange, LeaseHandle, RelayAgentInfo};

const SERVER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Ack,
    SetupFailure,
    Timeout,
    Nak,
    Panic,
}

#[derive(Default)]
struct Shared {
    open_handles: AtomicUsize,
    next_host: AtomicU32,
    circuit_ids: Mutex<Vec<([u8; 6], Vec<u8>)>>,
    opened_with: Mutex<Vec<(String, Duration)>>,
}

pub struct FakeExchange {
    default: Script,
    overrides: HashMap<[u8; 6], Script>,
    latency: Duration,
    shared: Arc<Shared>,
}

impl FakeExchange {
    pub fn new(default: Script) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            latency: Duration::ZERO,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Use `script` for the client with hardware address `mac`.
    pub fn with_script(mut self, mac: [u8; 6], script: Script) -> Self {
        self.overrides.insert(mac, script);
        self
    }

    pub fn open_handles(&self) -> usize {
        self.shared.open_handles.load(Ordering::SeqCst)
    }

    pub fn circuit_ids(&self) -> Vec<([u8; 6], Vec<u8>)> {
        self.shared.circuit_ids.lock().unwrap().clone()
    }

    pub fn opened_with(&self) -> Vec<(String, Duration)> {
        self.shared.opened_with.lock().unwrap().clone()
    }
}

pub struct FakeHandle {
    mac: [u8; 6],
    script: Script,
    latency: Duration,
    shared: Arc<Shared>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.shared.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LeaseExchange for FakeExchange {
    type Handle = FakeHandle;

    async fn open(
        &self,
        interface: &str,
        mac: [u8; 6],
        timeout: Duration,
    ) -> Result<FakeHandle, ExchangeError> {
        self.shared
            .opened_with
            .lock()
            .unwrap()
            .push((interface.to_string(), timeout));

        let script = self.overrides.get(&mac).copied().unwrap_or(self.default);
        if script == Script::SetupFailure {
            return Err(ExchangeError::Setup {
                interface: interface.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
            });
        }

        self.shared.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            mac,
            script,
            latency: self.latency,
            shared: self.shared.clone(),
        })
    }
}

#[async_trait]
impl LeaseHandle for FakeHandle {
    async fn request_lease(&mut self, relay: &RelayAgentInfo) -> Result<Lease, ExchangeError> {
        let circuit = relay.get(AGENT_CIRCUIT_ID).unwrap_or_default().to_vec();
        self.shared.circuit_ids.lock().unwrap().push((self.mac, circuit));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.script {
            Script::Ack | Script::SetupFailure => {
                let host = self.shared.next_host.fetch_add(1, Ordering::SeqCst);
                Ok(Lease {
                    assigned: Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 1, 0)) + host),
                    server: SERVER,
                    lease_time_secs: Some(3600),
                })
            }
            Script::Timeout => Err(ExchangeError::Timeout {
                state: ExchangeState::RequestSent,
                waited_ms: 5000,
            }),
            Script::Nak => Err(ExchangeError::Rejected { server: SERVER }),
            Script::Panic => panic!("scripted panic for {:02x?}", self.mac),
        }
    }
}

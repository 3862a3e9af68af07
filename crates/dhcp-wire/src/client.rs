use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::ExchangeError;
use crate::exchange::{ExchangeState, Lease, LeaseExchange, LeaseHandle};
use crate::options::{DHCPACK, DHCPNAK, DHCPOFFER, RelayAgentInfo, msg_type_name};
use crate::packet::{DhcpPacket, format_mac};

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;

/// DHCPv4 client that runs one DORA exchange per opened session.
///
/// Sessions share the client port, so each socket is opened with
/// SO_REUSEADDR/SO_REUSEPORT and filters replies by xid and chaddr.
#[derive(Debug, Clone)]
pub struct DhcpClient {
    bind: SocketAddr,
    server: SocketAddr,
}

impl DhcpClient {
    /// Broadcast client: binds 0.0.0.0:68 and sends to 255.255.255.255:67.
    pub fn new() -> Self {
        Self {
            bind: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DHCP_CLIENT_PORT).into(),
            server: SocketAddrV4::new(Ipv4Addr::BROADCAST, DHCP_SERVER_PORT).into(),
        }
    }

    /// Client with explicit local and server endpoints.
    pub fn with_endpoints(bind: SocketAddr, server: SocketAddr) -> Self {
        Self { bind, server }
    }
}

impl Default for DhcpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn open_socket(interface: &str, bind: SocketAddr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(target_os = "linux")]
    socket.set_reuse_port(true)?;
    socket.set_broadcast(true)?;

    #[cfg(target_os = "linux")]
    if !interface.is_empty() {
        socket.bind_device(Some(interface.as_bytes()))?;
    }
    #[cfg(not(target_os = "linux"))]
    let _ = interface;

    socket.bind(&bind.into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

#[async_trait]
impl LeaseExchange for DhcpClient {
    type Handle = DhcpSession;

    async fn open(
        &self,
        interface: &str,
        mac: [u8; 6],
        timeout: Duration,
    ) -> Result<DhcpSession, ExchangeError> {
        let socket = open_socket(interface, self.bind).map_err(|source| ExchangeError::Setup {
            interface: interface.to_string(),
            source,
        })?;

        trace!(mac = %format_mac(&mac), interface, "DHCP session opened");

        Ok(DhcpSession {
            socket,
            server: self.server,
            mac,
            timeout,
            state: ExchangeState::Init,
        })
    }
}

/// One client's exchange context. The socket is released when the session is dropped.
#[derive(Debug)]
pub struct DhcpSession {
    socket: UdpSocket,
    server: SocketAddr,
    mac: [u8; 6],
    timeout: Duration,
    state: ExchangeState,
}

impl DhcpSession {
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    fn transition(&mut self, next: ExchangeState) {
        trace!(mac = %format_mac(&self.mac), from = %self.state, to = %next, "DHCP state");
        self.state = next;
    }

    /// Follow the success path to the next state.
    fn step(&mut self) {
        if let Some(next) = self.state.advance() {
            self.transition(next);
        }
    }

    /// Move to the failure terminal matching `err` and hand it back.
    fn fail(&mut self, err: ExchangeError) -> ExchangeError {
        self.transition(err.terminal_state());
        err
    }

    async fn send(&mut self, packet: &DhcpPacket) -> Result<(), ExchangeError> {
        let bytes = packet.to_bytes();
        if let Err(e) = self.socket.send_to(&bytes, self.server).await {
            return Err(self.fail(e.into()));
        }
        Ok(())
    }

    async fn recv_reply(&self, xid: u32) -> Result<DhcpPacket, ExchangeError> {
        let mut buf = [0u8; 1500];
        loop {
            let (len, src) = self.socket.recv_from(&mut buf).await?;
            match DhcpPacket::parse(&buf[..len]) {
                Ok(pkt) if pkt.is_reply_to(xid, &self.mac) => return Ok(pkt),
                Ok(_) => continue,
                Err(e) => {
                    trace!("Ignoring invalid DHCP packet from {}: {}", src, e);
                    continue;
                }
            }
        }
    }

    /// Wait for the reply to `xid`, bounded by the session timeout.
    async fn await_reply(&mut self, xid: u32) -> Result<DhcpPacket, ExchangeError> {
        let waited = self.timeout;
        match timeout(waited, self.recv_reply(xid)).await {
            Ok(Ok(pkt)) => Ok(pkt),
            Ok(Err(e)) => Err(self.fail(e)),
            Err(_) => {
                let state = self.state;
                Err(self.fail(ExchangeError::Timeout {
                    state,
                    waited_ms: waited.as_millis(),
                }))
            }
        }
    }
}

#[async_trait]
impl LeaseHandle for DhcpSession {
    async fn request_lease(&mut self, relay: &RelayAgentInfo) -> Result<Lease, ExchangeError> {
        if self.state != ExchangeState::Init {
            return Err(ExchangeError::Protocol(format!(
                "session already used (state {})",
                self.state
            )));
        }

        let xid: u32 = rand::rng().random();
        let mac = self.mac;

        self.send(&DhcpPacket::discover(xid, mac, relay)).await?;
        self.step();
        debug!(xid = %format!("{:#010x}", xid), mac = %format_mac(&mac), "DHCPDISCOVER sent");

        let offer = self.await_reply(xid).await?;
        let server = match (offer.msg_type(), offer.server_id()) {
            (Some(DHCPOFFER), Some(server)) => server,
            (Some(DHCPOFFER), None) => {
                return Err(self.fail(ExchangeError::Protocol(
                    "DHCPOFFER without server identifier".to_string(),
                )));
            }
            (Some(DHCPNAK), server) => {
                return Err(self.fail(ExchangeError::Rejected {
                    server: server.unwrap_or(offer.siaddr),
                }));
            }
            (other, _) => {
                return Err(self.fail(ExchangeError::Protocol(format!(
                    "expected DHCPOFFER, got {}",
                    other.map(msg_type_name).unwrap_or("no message type")
                ))));
            }
        };
        self.step();
        debug!(offered = %offer.yiaddr, %server, mac = %format_mac(&mac), "DHCPOFFER received");

        self.send(&DhcpPacket::request(xid, mac, offer.yiaddr, server, relay))
            .await?;
        self.step();

        let reply = self.await_reply(xid).await?;
        match reply.msg_type() {
            Some(DHCPACK) => {
                self.step();
                Ok(Lease {
                    assigned: reply.yiaddr,
                    server: reply.server_id().unwrap_or(server),
                    lease_time_secs: reply.lease_time(),
                })
            }
            Some(DHCPNAK) => Err(self.fail(ExchangeError::Rejected {
                server: reply.server_id().unwrap_or(server),
            })),
            other => Err(self.fail(ExchangeError::Protocol(format!(
                "expected DHCPACK, got {}",
                other.map(msg_type_name).unwrap_or("no message type")
            )))),
        }
    }
}

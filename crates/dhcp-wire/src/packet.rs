//! DHCPv4 packet parser/serializer (RFC 2131), client side

use std::net::Ipv4Addr;
use thiserror::Error;

use crate::options::{
    self, DHCPDISCOVER, DHCPREQUEST, DhcpOption, HTYPE_ETHERNET, OPT_LEASE_TIME, OPT_MSG_TYPE,
    OPT_RELAY_AGENT_INFO, OPT_SERVER_ID, RelayAgentInfo,
};

/// DHCP magic cookie
pub const MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// BOOTP op codes
pub const BOOTREQUEST: u8 = 1;
pub const BOOTREPLY: u8 = 2;

/// Broadcast bit of the flags field (RFC 2131 §2)
pub const FLAG_BROADCAST: u16 = 0x8000;

#[derive(Error, Debug)]
pub enum DhcpParseError {
    #[error("Packet too short: {0} bytes (minimum 240)")]
    TooShort(usize),
    #[error("Invalid magic cookie")]
    InvalidMagic,
}

/// Parsed DHCPv4 packet
#[derive(Debug, Clone)]
pub struct DhcpPacket {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: [u8; 16],
    pub sname: [u8; 64],
    pub file: [u8; 128],
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Build a client BOOTREQUEST with the broadcast flag set, so the server
    /// answers to 255.255.255.255 before the client owns an address.
    fn client_message(msg_type: u8, xid: u32, mac: [u8; 6], extra: Vec<DhcpOption>) -> Self {
        let mut chaddr = [0u8; 16];
        chaddr[..6].copy_from_slice(&mac);

        let mut options = vec![
            DhcpOption::msg_type(msg_type),
            DhcpOption::client_id(&mac),
        ];
        options.extend(extra);
        options.push(DhcpOption::param_request());

        DhcpPacket {
            op: BOOTREQUEST,
            htype: HTYPE_ETHERNET,
            hlen: 6,
            hops: 0,
            xid,
            secs: 0,
            flags: FLAG_BROADCAST,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr,
            sname: [0u8; 64],
            file: [0u8; 128],
            options,
        }
    }

    /// DHCPDISCOVER for `mac`, tagged with relay agent information.
    pub fn discover(xid: u32, mac: [u8; 6], relay: &RelayAgentInfo) -> Self {
        Self::client_message(DHCPDISCOVER, xid, mac, vec![DhcpOption::relay_agent_info(relay)])
    }

    /// DHCPREQUEST in SELECTING state: selects `offered` from `server` (RFC 2131 §4.3.2).
    pub fn request(
        xid: u32,
        mac: [u8; 6],
        offered: Ipv4Addr,
        server: Ipv4Addr,
        relay: &RelayAgentInfo,
    ) -> Self {
        Self::client_message(
            DHCPREQUEST,
            xid,
            mac,
            vec![
                DhcpOption::requested_ip(offered),
                DhcpOption::server_id(server),
                DhcpOption::relay_agent_info(relay),
            ],
        )
    }

    /// Parse a DHCP packet from raw bytes
    pub fn parse(data: &[u8]) -> Result<Self, DhcpParseError> {
        if data.len() < 240 {
            return Err(DhcpParseError::TooShort(data.len()));
        }

        // Verify magic cookie at offset 236
        if data[236..240] != MAGIC_COOKIE {
            return Err(DhcpParseError::InvalidMagic);
        }

        let mut chaddr = [0u8; 16];
        chaddr.copy_from_slice(&data[28..44]);
        let mut sname = [0u8; 64];
        sname.copy_from_slice(&data[44..108]);
        let mut file = [0u8; 128];
        file.copy_from_slice(&data[108..236]);

        let ip_at = |off: usize| Ipv4Addr::new(data[off], data[off + 1], data[off + 2], data[off + 3]);

        Ok(DhcpPacket {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: ip_at(12),
            yiaddr: ip_at(16),
            siaddr: ip_at(20),
            giaddr: ip_at(24),
            chaddr,
            sname,
            file,
            options: options::parse_options(&data[240..]),
        })
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(576);

        buf.push(self.op);
        buf.push(self.htype);
        buf.push(self.hlen);
        buf.push(self.hops);
        buf.extend_from_slice(&self.xid.to_be_bytes());
        buf.extend_from_slice(&self.secs.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&self.ciaddr.octets());
        buf.extend_from_slice(&self.yiaddr.octets());
        buf.extend_from_slice(&self.siaddr.octets());
        buf.extend_from_slice(&self.giaddr.octets());
        buf.extend_from_slice(&self.chaddr);
        buf.extend_from_slice(&self.sname);
        buf.extend_from_slice(&self.file);
        buf.extend_from_slice(&MAGIC_COOKIE);
        buf.extend_from_slice(&options::encode_options(&self.options));

        // BOOTP minimum message size (RFC 1542 §2.1)
        if buf.len() < 300 {
            buf.resize(300, 0);
        }

        buf
    }

    /// Get MAC address as a formatted string (aa:bb:cc:dd:ee:ff)
    pub fn mac_str(&self) -> String {
        format_mac(self.mac_bytes())
    }

    /// Get MAC address as bytes
    pub fn mac_bytes(&self) -> &[u8] {
        let len = self.hlen.min(16) as usize;
        &self.chaddr[..len]
    }

    /// Find option by code
    pub fn get_option(&self, code: u8) -> Option<&DhcpOption> {
        self.options.iter().find(|o| o.code == code)
    }

    /// Get DHCP message type
    pub fn msg_type(&self) -> Option<u8> {
        self.get_option(OPT_MSG_TYPE)?.as_u8()
    }

    /// Get server identifier
    pub fn server_id(&self) -> Option<Ipv4Addr> {
        self.get_option(OPT_SERVER_ID)?.as_ipv4()
    }

    /// Get lease time in seconds
    pub fn lease_time(&self) -> Option<u32> {
        self.get_option(OPT_LEASE_TIME)?.as_u32()
    }

    /// Get relay agent information (option 82)
    pub fn relay_agent_info(&self) -> Option<RelayAgentInfo> {
        let opt = self.get_option(OPT_RELAY_AGENT_INFO)?;
        Some(RelayAgentInfo::parse(&opt.data))
    }

    /// Whether this is a server reply to the transaction `xid` of client `mac`.
    /// Every simulated client shares the client port, so both must match.
    pub fn is_reply_to(&self, xid: u32, mac: &[u8; 6]) -> bool {
        self.op == BOOTREPLY && self.xid == xid && self.chaddr[..6] == mac[..]
    }
}

/// Format a hardware address as aa:bb:cc:dd:ee:ff
pub fn format_mac(mac: &[u8]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

use std::net::Ipv4Addr;

/// DHCP option codes (RFC 2132, RFC 3046)
pub const OPT_PAD: u8 = 0;
pub const OPT_SUBNET_MASK: u8 = 1;
pub const OPT_ROUTER: u8 = 3;
pub const OPT_DNS_SERVER: u8 = 6;
pub const OPT_REQUESTED_IP: u8 = 50;
pub const OPT_LEASE_TIME: u8 = 51;
pub const OPT_MSG_TYPE: u8 = 53;
pub const OPT_SERVER_ID: u8 = 54;
pub const OPT_PARAM_REQUEST: u8 = 55;
pub const OPT_CLIENT_ID: u8 = 61;
pub const OPT_RELAY_AGENT_INFO: u8 = 82;
pub const OPT_END: u8 = 255;

/// Relay agent information sub-option codes (RFC 3046 §3)
pub const AGENT_CIRCUIT_ID: u8 = 1;
pub const AGENT_REMOTE_ID: u8 = 2;

/// DHCP message types
pub const DHCPDISCOVER: u8 = 1;
pub const DHCPOFFER: u8 = 2;
pub const DHCPREQUEST: u8 = 3;
pub const DHCPACK: u8 = 5;
pub const DHCPNAK: u8 = 6;

/// Hardware type for Ethernet (RFC 1700)
pub const HTYPE_ETHERNET: u8 = 1;

/// Options a simulated client asks the server for.
const REQUESTED_PARAMS: [u8; 4] = [OPT_SUBNET_MASK, OPT_ROUTER, OPT_DNS_SERVER, OPT_LEASE_TIME];

/// Human-readable name of a DHCP message type, for logs.
pub fn msg_type_name(t: u8) -> &'static str {
    match t {
        DHCPDISCOVER => "DHCPDISCOVER",
        DHCPOFFER => "DHCPOFFER",
        DHCPREQUEST => "DHCPREQUEST",
        DHCPACK => "DHCPACK",
        DHCPNAK => "DHCPNAK",
        _ => "UNKNOWN",
    }
}

/// A parsed DHCP option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Vec<u8>,
}

impl DhcpOption {
    pub fn new(code: u8, data: Vec<u8>) -> Self {
        Self { code, data }
    }

    pub fn msg_type(t: u8) -> Self {
        Self::new(OPT_MSG_TYPE, vec![t])
    }

    pub fn requested_ip(ip: Ipv4Addr) -> Self {
        Self::new(OPT_REQUESTED_IP, ip.octets().to_vec())
    }

    pub fn server_id(ip: Ipv4Addr) -> Self {
        Self::new(OPT_SERVER_ID, ip.octets().to_vec())
    }

    /// Client identifier: hardware type followed by the hardware address (RFC 2132 §9.14).
    pub fn client_id(mac: &[u8]) -> Self {
        let mut data = Vec::with_capacity(mac.len() + 1);
        data.push(HTYPE_ETHERNET);
        data.extend_from_slice(mac);
        Self::new(OPT_CLIENT_ID, data)
    }

    pub fn param_request() -> Self {
        Self::new(OPT_PARAM_REQUEST, REQUESTED_PARAMS.to_vec())
    }

    pub fn relay_agent_info(info: &RelayAgentInfo) -> Self {
        Self::new(OPT_RELAY_AGENT_INFO, info.to_bytes())
    }

    /// Extract IPv4 address from option data
    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        let octets: [u8; 4] = self.data.as_slice().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    /// Extract u32 from option data
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.as_slice().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Extract u8 from option data
    pub fn as_u8(&self) -> Option<u8> {
        self.data.first().copied()
    }
}

/// Relay agent information (option 82): an ordered list of sub-options.
///
/// A real relay inserts this block on behalf of the client; the load tester
/// attaches it directly so the server sees a distinct circuit per simulated client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayAgentInfo {
    pub sub_options: Vec<DhcpOption>,
}

impl RelayAgentInfo {
    /// Relay information carrying only an agent circuit identifier.
    pub fn circuit_id(id: impl Into<Vec<u8>>) -> Self {
        Self {
            sub_options: vec![DhcpOption::new(AGENT_CIRCUIT_ID, id.into())],
        }
    }

    pub fn get(&self, code: u8) -> Option<&[u8]> {
        self.sub_options
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.data.as_slice())
    }

    /// Sub-options use the same code/length/value layout as top-level options,
    /// without PAD or END markers.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for sub in &self.sub_options {
            push_tlv(&mut buf, sub);
        }
        buf
    }

    pub fn parse(data: &[u8]) -> Self {
        Self {
            sub_options: walk_tlv(data, false),
        }
    }
}

fn push_tlv(buf: &mut Vec<u8>, opt: &DhcpOption) {
    // Length is a single octet; anything longer is cut to fit.
    let len = opt.data.len().min(u8::MAX as usize);
    buf.push(opt.code);
    buf.push(len as u8);
    buf.extend_from_slice(&opt.data[..len]);
}

fn walk_tlv(data: &[u8], markers: bool) -> Vec<DhcpOption> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let code = data[i];
        if markers && code == OPT_END {
            break;
        }
        if markers && code == OPT_PAD {
            i += 1;
            continue;
        }

        let Some(&len) = data.get(i + 1) else {
            break;
        };
        let start = i + 2;
        let end = start + len as usize;
        if end > data.len() {
            break;
        }

        out.push(DhcpOption::new(code, data[start..end].to_vec()));
        i = end;
    }

    out
}

/// Parse DHCP options from bytes (after magic cookie).
pub fn parse_options(data: &[u8]) -> Vec<DhcpOption> {
    walk_tlv(data, true)
}

/// Encode DHCP options to bytes, terminated by END.
pub fn encode_options(options: &[DhcpOption]) -> Vec<u8> {
    let mut buf = Vec::new();
    for opt in options {
        push_tlv(&mut buf, opt);
    }
    buf.push(OPT_END);
    buf
}

use rand::Rng;

use dhcp_wire::packet::format_mac;

/// Location names used as the relay agent circuit identifier.
pub const LOCATIONS: [&str; 15] = [
    "Bratislava",
    "Kosice",
    "Presov",
    "Zilina",
    "Banska Bystrica",
    "Nitra",
    "Trnava",
    "Trencin",
    "Martin",
    "Poprad",
    "Prievidza",
    "Zvolen",
    "Povazska Bystrica",
    "Nove Zamky",
    "Michalovce",
];

/// First octet of every generated address: locally administered (bit 1 set), unicast (bit 0 clear).
pub const LOCAL_UNICAST_PREFIX: u8 = 0x02;

/// Synthetic identity of one simulated client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub mac: [u8; 6],
    pub tag: &'static str,
}

impl ClientIdentity {
    /// Draw a new identity from `rng`: five random address octets and a uniformly chosen location.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut mac = [0u8; 6];
        mac[0] = LOCAL_UNICAST_PREFIX;
        rng.fill(&mut mac[1..]);

        let tag = LOCATIONS[rng.random_range(0..LOCATIONS.len())];

        Self { mac, tag }
    }

    pub fn mac_str(&self) -> String {
        format_mac(&self.mac)
    }

    /// Circuit identifier bytes carried in option 82.
    pub fn tag_bytes(&self) -> &'static [u8] {
        self.tag.as_bytes()
    }
}

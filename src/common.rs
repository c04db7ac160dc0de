use pnet::util::MacAddr;

pub const BROADCAST_MAC: [u8; 6] = [ 0xff, 0xff, 0xff, 0xff, 0xff, 0xff ];

pub const MAC_REPETITIONS: usize = 16;
pub const MAGIC_PACKET_LEN: usize = BROADCAST_MAC.len() + MAC_REPETITIONS * 6;

pub fn mac_octets(mac: MacAddr) -> [u8; 6] {
    [ mac.0, mac.1, mac.2, mac.3, mac.4, mac.5 ]
}

/// Wake-on-LAN payload: six bytes of 0xff followed by the target MAC sixteen times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket {
    target: MacAddr,
    payload: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    pub fn new(target: MacAddr) -> Self {
        let mut payload = [0u8; MAGIC_PACKET_LEN];
        payload[..6].copy_from_slice(&BROADCAST_MAC);

        let octets = mac_octets(target);
        for block in payload[6..].chunks_exact_mut(6) {
            block.copy_from_slice(&octets);
        }

        Self { target, payload }
    }

    pub fn target(&self) -> MacAddr {
        self.target
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }
}

pub fn check_wol_payload(payload: &[u8]) -> bool {
    if payload.len() < MAGIC_PACKET_LEN { return false; }

    let blocks: Vec<&[u8]> = payload[..MAGIC_PACKET_LEN].chunks(6).collect();
    if blocks[0] != BROADCAST_MAC {
        return false;
    }

    for i in 2..blocks.len() {
        if blocks[i] != blocks[1] {
            return false;
        }
    }

    true
}

/// Target MAC of a magic packet, or `None` if `payload` is not one.
pub fn wol_payload_get_target_mac(payload: &[u8]) -> Option<MacAddr> {
    if !check_wol_payload(payload) { return None; }
    Some(MacAddr::new(payload[6], payload[7], payload[8], payload[9], payload[10], payload[11]))
}

use std::net::IpAddr;

use pnet::util::MacAddr;

use crate::common::MagicPacket;
use crate::error::WolError;
use crate::mac::parse_mac;
use crate::profile::Profile;

/// One wake attempt: who to wake and where to send the packet.
#[derive(Debug, Clone, PartialEq)]
pub struct WakeRequest {
    pub mac: MacAddr,
    pub broadcast: IpAddr,
    pub port: u16,
}

impl WakeRequest {
    /// The MAC address is validated first, so a malformed one is reported
    /// regardless of the other arguments.
    pub fn parse(mac: &str, broadcast: &str, port: u16) -> Result<Self, WolError> {
        let mac = parse_mac(mac)?;
        let broadcast: IpAddr = broadcast
            .parse()
            .map_err(|_| WolError::invalid_broadcast(broadcast))?;

        Ok(Self { mac, broadcast, port })
    }

    pub fn from_profile(profile: &Profile, default_broadcast: &str, default_port: u16) -> Result<Self, WolError> {
        Self::parse(
            &profile.mac_address,
            profile.broadcast.as_deref().unwrap_or(default_broadcast),
            profile.port.unwrap_or(default_port),
        )
    }

    pub fn packet(&self) -> MagicPacket {
        MagicPacket::new(self.mac)
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_parse_request() {
        let req = WakeRequest::parse("AA:BB:CC:DD:EE:FF", "192.168.1.255", 9).unwrap();
        assert_eq!(req.mac, MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff));
        assert_eq!(req.broadcast, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 255)));
        assert_eq!(req.port, 9);
        assert_eq!(req.packet().len(), 102);
    }

    #[test]
    fn test_mac_is_checked_before_broadcast() {
        let err = WakeRequest::parse("AA:BB:CC", "not-an-ip", 9).unwrap_err();
        assert!(matches!(err, WolError::Format(_)));
    }

    #[test]
    fn test_invalid_broadcast_is_network_error() {
        let err = WakeRequest::parse("AA:BB:CC:DD:EE:FF", "192.168.1", 9).unwrap_err();
        match err {
            WolError::Network(e) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_from_profile_overrides() {
        let mut profile = Profile {
            name: "nas".to_string(),
            group: String::new(),
            mac_address: "00-11-22-33-44-55".to_string(),
            broadcast: None,
            port: None,
            enabled: true,
        };

        let req = WakeRequest::from_profile(&profile, "255.255.255.255", 9).unwrap();
        assert_eq!(req.broadcast, IpAddr::V4(Ipv4Addr::BROADCAST));
        assert_eq!(req.port, 9);

        profile.broadcast = Some("10.0.0.255".to_string());
        profile.port = Some(7);
        let req = WakeRequest::from_profile(&profile, "255.255.255.255", 9).unwrap();
        assert_eq!(req.broadcast, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 255)));
        assert_eq!(req.port, 7);
    }
}

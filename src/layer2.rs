use std::io;
use std::time::Duration;

use pnet::datalink::{
    self,
    Channel,
    Config,
    NetworkInterface
};
use pnet::packet::{
    ethernet::{EtherType, EthernetPacket, MutableEthernetPacket},
    Packet
};
use pnet::util::MacAddr;

use crate::common::{self, MagicPacket};
use crate::error::WolError;
use crate::mac::format_mac;

pub const ETHERTYPE_WOL: u16 = 0x0842;

pub fn l2_wol_check(pkt: &EthernetPacket) -> bool {
    pkt.get_ethertype().0 == ETHERTYPE_WOL && 
        pkt.get_destination().is_broadcast() &&
        common::check_wol_payload(pkt.payload())
}

/// Broadcast Ethernet frame carrying `pkt` with EtherType 0x0842.
pub fn build_frame(source: MacAddr, pkt: &MagicPacket) -> Vec<u8> {
    let mut buf = vec![0u8; EthernetPacket::minimum_packet_size() + pkt.len()];

    // buffer is sized for header plus payload, so this cannot fail
    if let Some(mut eth) = MutableEthernetPacket::new(&mut buf) {
        eth.set_destination(MacAddr::broadcast());
        eth.set_source(source);
        eth.set_ethertype(EtherType(ETHERTYPE_WOL));
        eth.set_payload(pkt.as_bytes());
    }

    buf
}

fn find_interface(name: &str) -> Result<NetworkInterface, WolError> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no interface named '{}'", name)).into())
}

/// Sends `pkt` once as a raw Ethernet frame on `iface_name`.
///
/// Blocks on the datalink channel; async callers go through
/// [`send_frame_async`].
pub fn send_frame(iface_name: &str, pkt: &MagicPacket) -> Result<(), WolError> {
    let iface = find_interface(iface_name)?;
    if iface.is_loopback() || !iface.is_up() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("interface '{}' is down or loopback", iface.name),
        ).into());
    }

    let mut dl_cfg = Config::default();
    dl_cfg.write_timeout = Some(Duration::from_millis(500));

    let mut tx = match datalink::channel(&iface, dl_cfg) {
        Ok(Channel::Ethernet(tx, _)) => tx,
        Ok(_) => return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("interface '{}' has no Ethernet channel", iface.name),
        ).into()),
        Err(e) => return Err(e.into()),
    };

    let source = iface.mac.unwrap_or_else(MacAddr::zero);
    let frame = build_frame(source, pkt);
    if !EthernetPacket::new(&frame).map_or(false, |eth| l2_wol_check(&eth)) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "malformed Wake-on-LAN frame").into());
    }
    log::debug!("[layer2][{}] frame from {} for {}", iface.name, source, format_mac(pkt.target()));

    match tx.send_to(&frame, None) {
        Some(res) => res.map_err(WolError::from),
        None => Err(io::Error::new(io::ErrorKind::Other, "datalink sender refused the frame").into()),
    }
}

pub async fn send_frame_async(iface_name: String, pkt: MagicPacket) -> Result<(), WolError> {
    tokio::task::spawn_blocking(move || send_frame(&iface_name, &pkt))
        .await
        .map_err(|e| WolError::Network(io::Error::new(io::ErrorKind::Other, e)))?
}

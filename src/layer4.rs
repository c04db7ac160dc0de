use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use anyhow::{Context, Result};
use pnet::util::MacAddr;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::common::wol_payload_get_target_mac;
use crate::config::ListenConfig;
use crate::error::WolError;
use crate::mac::format_mac;
use crate::request::WakeRequest;

/// Sends the magic packet for `req` as a single UDP datagram.
///
/// A fresh socket is bound per call and dropped afterwards. Wake-on-LAN has
/// no acknowledgement, so one attempt is all there is.
pub async fn send(req: &WakeRequest) -> Result<usize, WolError> {
    let bind_addr: SocketAddr = match req.broadcast {
        IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };

    let socket = UdpSocket::bind(bind_addr).await?;
    if req.broadcast.is_ipv4() {
        socket.set_broadcast(true)?;
    }

    let pkt = req.packet();
    let target = SocketAddr::new(req.broadcast, req.port);
    log::debug!("[sender] {} -> {} ({} bytes)", socket.local_addr()?, target, pkt.len());

    let sent = socket.send_to(pkt.as_bytes(), target).await?;
    if sent != pkt.len() {
        return Err(io::Error::new(io::ErrorKind::WriteZero, "magic packet truncated").into());
    }

    Ok(sent)
}

pub async fn l4_worker(cfg: &ListenConfig, token: CancellationToken) -> Result<()> {
    let socket = UdpSocket::bind((cfg.listen_addr, cfg.listen_port))
        .await
        .with_context(|| format!("binding {}:{}", cfg.listen_addr, cfg.listen_port))?;
    log::info!("listening for magic packets on {}", socket.local_addr()?);

    serve(socket, token, |target, from| {
        log::info!("[listener] magic packet for {} from {}", format_mac(target), from);
    }).await;

    Ok(())
}

/// Receives datagrams until `token` is cancelled, handing every valid magic
/// packet's target to `on_packet`.
pub async fn serve<F>(socket: UdpSocket, token: CancellationToken, mut on_packet: F)
where
    F: FnMut(MacAddr, SocketAddr),
{
    let mut buf = [0u8; 1500];

    loop {
        tokio::select! {
            _ = token.cancelled() => { log::trace!("[listener] exit"); break; }
            res = socket.recv_from(&mut buf) => {
                let (len, from) = match res {
                    Ok(r) => r,
                    Err(e) => { log::warn!("[listener] receive failed: {}", e); continue; },
                };
                log::trace!("[listener] {} bytes from {}", len, from);

                if let Some(target) = wol_payload_get_target_mac(&buf[..len]) {
                    on_packet(target, from);
                }
            }
        }
    }
}

use std::net::IpAddr;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

mod common;
mod config;
mod error;
mod history;
mod layer2;
mod layer4;
mod mac;
mod profile;
mod request;

use config::Config;
use error::WolError;
use history::History;
use mac::format_mac;
use request::WakeRequest;

#[derive(Parser)]
#[command(version, about = "Send Wake-on-LAN magic packets")]
struct Cli {
    /// Config file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// More output, repeat for trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a magic packet to a MAC address or stored profile
    Wake {
        #[arg(required_unless_present = "profile", conflicts_with = "profile")]
        mac: Option<String>,

        #[arg(short, long)]
        profile: Option<String>,

        #[arg(short, long)]
        broadcast: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Send a raw Ethernet frame on this interface instead of UDP
        #[arg(short, long)]
        interface: Option<String>,

        #[arg(long, default_value_t = false)]
        no_history: bool,
    },
    /// List enabled profiles, optionally filtered by name or MAC
    Profiles {
        search: Option<String>,
    },
    /// Show recently used MAC and broadcast addresses
    History {
        #[arg(long, default_value_t = false)]
        clear: bool,
    },
    /// Log magic packets arriving over UDP until interrupted
    Listen {
        #[arg(long)]
        addr: Option<IpAddr>,

        #[arg(long)]
        port: Option<u16>,
    },
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet { return LevelFilter::Warn; }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn parse_broadcast(addr: &str) -> Result<IpAddr, WolError> {
    addr.parse().map_err(|_| WolError::invalid_broadcast(addr))
}

/// An unreadable history file is left alone rather than overwritten.
fn record_history(cfg: &Config, req: &WakeRequest) -> Result<()> {
    let path = cfg.history_path()?;
    let mut history = History::load(&path, cfg.history_entries)?;
    history.record(&format_mac(req.mac), &req.broadcast.to_string());
    history.save(&path)
}

async fn wake(
    cfg: &Config,
    mac: Option<String>,
    profile: Option<String>,
    broadcast: Option<String>,
    port: Option<u16>,
    interface: Option<String>,
    no_history: bool,
) -> Result<()> {
    let (req, manual) = match profile {
        Some(name) => {
            let p = profile::find(&cfg.profiles, &name)?;
            let mut req = WakeRequest::from_profile(p, &cfg.broadcast, cfg.port)?;
            if let Some(b) = &broadcast { req.broadcast = parse_broadcast(b)?; }
            if let Some(port) = port { req.port = port; }
            log::debug!("resolved profile '{}'", p.name);
            (req, false)
        },
        None => {
            let mac = mac.context("a MAC address or --profile is required")?;
            let broadcast = broadcast.as_deref().unwrap_or(&cfg.broadcast);
            (WakeRequest::parse(&mac, broadcast, port.unwrap_or(cfg.port))?, true)
        },
    };

    // only manual entries feed the history, profiles are already stored
    if manual && !no_history {
        if let Err(e) = record_history(cfg, &req) {
            log::warn!("history not updated: {:#}", e);
        }
    }

    let target = format_mac(req.mac);
    match interface {
        Some(iface) => {
            layer2::send_frame_async(iface.clone(), req.packet()).await?;
            log::info!("magic packet for {} sent on {}", target, iface);
        },
        None => {
            layer4::send(&req).await?;
            log::info!("magic packet for {} sent to {}:{}", target, req.broadcast, req.port);
        },
    }

    Ok(())
}

fn list_profiles(cfg: &Config, search: Option<&str>) {
    for p in profile::filter(&cfg.profiles, search) {
        let broadcast = p.broadcast.as_deref().unwrap_or(&cfg.broadcast);
        let port = p.port.unwrap_or(cfg.port);
        println!("{:<16} {:<24} {:<18} {}:{}", p.group, p.name, p.mac_address, broadcast, port);
    }
}

fn show_history(cfg: &Config, clear: bool) -> Result<()> {
    let path = cfg.history_path()?;
    let mut history = History::load(&path, cfg.history_entries)?;

    if clear {
        history.clear();
        history.save(&path)?;
        log::info!("history cleared");
        return Ok(());
    }

    if history.mac_addresses.is_empty() && history.broadcasts.is_empty() {
        println!("history is empty");
        return Ok(());
    }

    println!("MAC addresses ({}):", history.mac_addresses.len());
    history.mac_addresses.entries().iter().for_each(|e| println!("  {}", e));
    println!("Broadcast addresses ({}):", history.broadcasts.len());
    history.broadcasts.entries().iter().for_each(|e| println!("  {}", e));
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Wake { mac, profile, broadcast, port, interface, no_history } => {
            wake(&cfg, mac, profile, broadcast, port, interface, no_history).await
        },
        Command::Profiles { search } => {
            list_profiles(&cfg, search.as_deref());
            Ok(())
        },
        Command::History { clear } => show_history(&cfg, clear),
        Command::Listen { addr, port } => {
            let mut listen = cfg.listen.take().unwrap_or_default();
            if let Some(addr) = addr { listen.listen_addr = addr; }
            if let Some(port) = port { listen.listen_port = port; }

            let cancel_token: CancellationToken = CancellationToken::new();
            let sigint_token = cancel_token.clone();

            ctrlc::set_handler(move || {
                log::info!("received SIGINT");
                sigint_token.cancel();
            }).expect("Failed to install SIGINT handler");

            layer4::l4_worker(&listen, cancel_token).await
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new().with_level(log_level(cli.verbose, cli.quiet)).init() {
        eprintln!("failed to initialize logger: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wake_requires_target() {
        assert!(Cli::try_parse_from([ "wol-send", "wake" ]).is_err());
        assert!(Cli::try_parse_from([ "wol-send", "wake", "AABBCCDDEEFF", "--profile", "nas" ]).is_err());

        let cli = Cli::try_parse_from([ "wol-send", "-vv", "wake", "AA:BB:CC:DD:EE:FF", "--port", "7" ]).unwrap();
        assert_eq!(log_level(cli.verbose, cli.quiet), LevelFilter::Trace);
        match cli.command {
            Command::Wake { mac, port, .. } => {
                assert_eq!(mac.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
                assert_eq!(port, Some(7));
            },
            _ => panic!("expected wake"),
        }
    }

    #[tokio::test]
    async fn test_wake_records_history_and_sends() {
        let dir = tempfile::tempdir().unwrap();
        let rx = tokio::net::UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = rx.local_addr().unwrap().port();

        let cfg = Config {
            history_file: dir.path().join("history.yml").to_string_lossy().into_owned(),
            broadcast: "127.0.0.1".to_string(),
            ..Config::default()
        };

        wake(&cfg, Some("aa-bb-cc-dd-ee-ff".to_string()), None, None, Some(port), None, false)
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = rx.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 102);

        let history = History::load(&cfg.history_path().unwrap(), cfg.history_entries).unwrap();
        assert_eq!(history.mac_addresses.entries(), &[ "AA:BB:CC:DD:EE:FF" ]);
        assert_eq!(history.broadcasts.entries(), &[ "127.0.0.1" ]);
    }

    #[tokio::test]
    async fn test_wake_malformed_mac_leaves_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            history_file: dir.path().join("history.yml").to_string_lossy().into_owned(),
            ..Config::default()
        };

        let err = wake(&cfg, Some("AA:BB:CC".to_string()), None, None, None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<WolError>(), Some(WolError::Format(_))));
        assert!(!dir.path().join("history.yml").exists());
    }

    #[tokio::test]
    async fn test_wake_unknown_profile() {
        let cfg = Config::default();
        let err = wake(&cfg, None, Some("nas".to_string()), None, None, None, true)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<WolError>(), Some(WolError::UnknownProfile(_))));
    }

    fn profile_config(dir: &std::path::Path) -> Config {
        Config {
            history_file: dir.join("history.yml").to_string_lossy().into_owned(),
            profiles: vec![ profile::Profile {
                name: "nas".to_string(),
                group: "storage".to_string(),
                mac_address: "00-11-22-33-44-55".to_string(),
                broadcast: Some("10.255.255.255".to_string()),
                port: Some(7),
                enabled: true,
            } ],
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_wake_profile_with_overrides_skips_history() {
        let dir = tempfile::tempdir().unwrap();
        let rx = tokio::net::UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = rx.local_addr().unwrap().port();
        let cfg = profile_config(dir.path());

        wake(&cfg, None, Some("NAS".to_string()), Some("127.0.0.1".to_string()), Some(port), None, false)
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(len, 102);
        assert_eq!(&buf[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert!(!dir.path().join("history.yml").exists());
    }

    #[tokio::test]
    async fn test_wake_no_history_flag() {
        let dir = tempfile::tempdir().unwrap();
        let rx = tokio::net::UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = rx.local_addr().unwrap().port();
        let cfg = profile_config(dir.path());

        wake(&cfg, Some("AABBCCDDEEFF".to_string()), None, Some("127.0.0.1".to_string()), Some(port), None, true)
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = rx.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 102);
        assert!(!dir.path().join("history.yml").exists());
    }

    #[tokio::test]
    async fn test_wake_sends_despite_corrupt_history() {
        let dir = tempfile::tempdir().unwrap();
        let history_path = dir.path().join("history.yml");
        std::fs::write(&history_path, "mac_addresses: [unterminated").unwrap();

        let rx = tokio::net::UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let port = rx.local_addr().unwrap().port();
        let cfg = profile_config(dir.path());

        wake(&cfg, Some("AA:BB:CC:DD:EE:FF".to_string()), None, Some("127.0.0.1".to_string()), Some(port), None, false)
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(len, 102);

        // the unreadable file is kept as it was
        assert_eq!(std::fs::read_to_string(&history_path).unwrap(), "mac_addresses: [unterminated");
    }
}

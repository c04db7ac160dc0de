use std::fs;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::profile::Profile;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/wol-send/config.yml";

/// Deserializes an absent field as None and an unset field as T::default. 
/// 
/// This avoid having Option<Option<T>> as in serde_with::rust::double_option
pub fn deserialize_absent_or_null<'de, D, T: Default>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.or(Some(T::default())))
}

pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("expanding path '{}'", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[derive(Debug, Deserialize)]
pub struct ListenConfig {
    pub listen_addr: IpAddr,
    pub listen_port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            listen_port: 9,
        }
    }
}

fn default_port() -> u16 { 9 }
fn default_broadcast() -> String { Ipv4Addr::BROADCAST.to_string() }
fn default_history_entries() -> usize { 10 }
fn default_history_file() -> String { "~/.config/wol-send/history.yml".to_string() }

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_broadcast")]
    pub broadcast: String,

    #[serde(default = "default_history_entries")]
    pub history_entries: usize,

    #[serde(default = "default_history_file")]
    pub history_file: String,

    #[serde(default)]
    pub profiles: Vec<Profile>,

    #[serde(default, deserialize_with = "deserialize_absent_or_null")]
    pub listen: Option<ListenConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            broadcast: default_broadcast(),
            history_entries: default_history_entries(),
            history_file: default_history_file(),
            profiles: Vec::new(),
            listen: None,
        }
    }
}

impl Config {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self> {
        let path = expand_path(path)?;

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no config at '{}', using defaults", path.display());
                return Ok(Self::default());
            },
            Err(e) => return Err(e).with_context(|| format!("reading config '{}'", path.display())),
        };

        Self::parse(&raw).with_context(|| format!("parsing config '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // an empty document deserializes as null
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(raw)?)
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        expand_path(&self.history_file)
    }
}

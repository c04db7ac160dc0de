use serde::Deserialize;

use crate::error::WolError;

fn default_enabled() -> bool {
    true
}

/// A stored wake target, read from the `profiles` list of the config file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,

    #[serde(default)]
    pub group: String,

    pub mac_address: String,

    /// Falls back to the configured default broadcast address when absent.
    #[serde(default)]
    pub broadcast: Option<String>,

    /// Falls back to the configured default port when absent.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

pub fn find<'a>(profiles: &'a [Profile], name: &str) -> Result<&'a Profile, WolError> {
    profiles
        .iter()
        .filter(|p| p.enabled)
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| WolError::UnknownProfile(name.to_string()))
}

/// Enabled profiles ordered by group, then name, optionally narrowed by a
/// case-insensitive search on name or MAC address.
pub fn filter<'a>(profiles: &'a [Profile], search: Option<&str>) -> Vec<&'a Profile> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matches: Vec<&Profile> = profiles
        .iter()
        .filter(|p| p.enabled)
        .filter(|p| match &needle {
            Some(n) => p.name.to_lowercase().contains(n) || p.mac_address.to_lowercase().contains(n),
            None => true,
        })
        .collect();

    matches.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));
    matches
}

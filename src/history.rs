use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Bounded most-recently-used list. Index 0 is the newest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RecencyList {
    entries: Vec<String>,
    capacity: usize,
}

impl RecencyList {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::new(), capacity }
    }

    pub fn from_entries(mut entries: Vec<String>, capacity: usize) -> Self {
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Moves `value` to the front, inserting it if it is new, and evicts the
    /// oldest entries beyond capacity.
    pub fn insert(&mut self, value: &str) {
        if let Some(pos) = self.entries.iter().position(|e| e == value) {
            let existing = self.entries.remove(pos);
            self.entries.insert(0, existing);
        } else {
            self.entries.insert(0, value.to_string());
        }

        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    mac_addresses: Vec<String>,
    #[serde(default)]
    broadcasts: Vec<String>,
}

/// Previously used MAC and broadcast addresses.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub mac_addresses: RecencyList,
    pub broadcasts: RecencyList,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            mac_addresses: RecencyList::new(capacity),
            broadcasts: RecencyList::new(capacity),
        }
    }

    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no history at '{}'", path.display());
                return Ok(Self::new(capacity));
            },
            Err(e) => return Err(e).with_context(|| format!("reading history '{}'", path.display())),
        };

        let file: HistoryFile = serde_yml::from_str(&raw)
            .with_context(|| format!("parsing history '{}'", path.display()))?;

        Ok(Self {
            mac_addresses: RecencyList::from_entries(file.mac_addresses, capacity),
            broadcasts: RecencyList::from_entries(file.broadcasts, capacity),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating '{}'", dir.display()))?;
        }

        let file = HistoryFile {
            mac_addresses: self.mac_addresses.entries().to_vec(),
            broadcasts: self.broadcasts.entries().to_vec(),
        };
        let raw = serde_yml::to_string(&file).context("serializing history")?;
        fs::write(path, raw).with_context(|| format!("writing history '{}'", path.display()))?;

        log::debug!("history saved to '{}'", path.display());
        Ok(())
    }

    pub fn record(&mut self, mac: &str, broadcast: &str) {
        self.mac_addresses.insert(mac);
        self.broadcasts.insert(broadcast);
    }

    pub fn clear(&mut self) {
        self.mac_addresses.clear();
        self.broadcasts.clear();
    }
}

use std::io;

use thiserror::Error;

/// Errors surfaced while preparing or sending a Wake-on-LAN request.
#[derive(Error, Debug)]
pub enum WolError {
    /// Malformed MAC address. Always raised before any socket is opened.
    #[error("invalid MAC address '{0}'")]
    Format(String),

    /// Socket creation, address or send failure.
    #[error("network error: {0}")]
    Network(#[from] io::Error),

    #[error("no enabled profile named '{0}'")]
    UnknownProfile(String),
}

impl WolError {
    pub fn invalid_broadcast(addr: &str) -> Self {
        WolError::Network(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid broadcast address '{}'", addr),
        ))
    }
}

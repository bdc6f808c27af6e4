/*! Settings: the JSON-backed configuration record consumed by
Transport construction, plus per-OS serial device path resolution.
*/
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Host OS classes the source's OS-detection collaborator
/// distinguished, used as the key into `serial_paths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsClass {
    /// Microsoft Windows.
    Windows,
    /// Any Linux distribution.
    Linux,
    /// macOS.
    Osx,
    /// Anything `std::env::consts::OS` doesn't map to one of the above.
    Unrecognized,
}

impl OsClass {
    /// Detect the running host's OS class from `std::env::consts::OS`.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => OsClass::Windows,
            "linux" => OsClass::Linux,
            "macos" => OsClass::Osx,
            _ => OsClass::Unrecognized,
        }
    }
}

/// Which transport a session should use by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TransportSelector {
    /// Point-to-point serial link.
    Serial,
    /// UDP datagram channel.
    Wifi,
}

/// The configuration record the protocol core consumes: peer
/// address, UDP port, baud rate, per-byte timeout, default transport,
/// and per-OS serial device paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Peer IPv4 address, as four octets.
    pub peer_ip: [u8; 4],
    /// UDP port on the peer.
    pub udp_port: u16,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Per-byte read timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Which transport to use absent an explicit override.
    pub default_transport: TransportSelector,
    /// Serial device path per host OS class.
    pub serial_paths: HashMap<OsClass, String>,
}

impl Settings {
    /// Load settings from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        Ok(settings)
    }

    /// Resolve the serial device path for the currently running host
    /// OS, failing if none is configured.
    pub fn resolve_serial_path(&self) -> Result<&str, ConfigError> {
        let class = OsClass::detect();
        self.serial_paths
            .get(&class)
            .map(String::as_str)
            .ok_or(ConfigError::MissingSerialPath(class))
    }

    /// The peer address as a [`std::net::SocketAddr`].
    pub fn peer_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from((self.peer_ip, self.udp_port))
    }

    /// The configured per-byte timeout as a [`std::time::Duration`].
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

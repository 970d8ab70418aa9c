//! Session options.
//! Parsed from a TOML file or built in code; savedata is supplied separately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use tox4rs_protocol::{ProxyType, MAX_HOSTNAME_LENGTH, SECRET_KEY_SIZE};

use crate::codes::NewCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default = "default_true")]
    pub ipv6_enabled: bool,
    #[serde(default = "default_true")]
    pub udp_enabled: bool,
    #[serde(default = "default_true")]
    pub local_discovery_enabled: bool,
    #[serde(default = "default_true")]
    pub hole_punching_enabled: bool,
    /// UDP port range to bind in. Both 0 picks the engine default range;
    /// a reversed range is swapped.
    #[serde(default)]
    pub start_port: u16,
    #[serde(default)]
    pub end_port: u16,
    /// TCP relay server port. 0 disables the relay server.
    #[serde(default)]
    pub tcp_port: u16,
    #[serde(default)]
    pub proxy: ProxyOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProxyOptions {
    #[serde(default, rename = "type")]
    pub kind: ProxyType,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ipv6_enabled: true,
            udp_enabled: true,
            local_discovery_enabled: true,
            hole_punching_enabled: true,
            start_port: 0,
            end_port: 0,
            tcp_port: 0,
            proxy: ProxyOptions::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl SessionOptions {
    /// Load options from file, or use defaults if missing.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let options: SessionOptions = toml::from_str(&content)?;
            Ok(options)
        } else {
            Ok(Self::default())
        }
    }

    /// Shape checks that need no engine: proxy host and port when a proxy is
    /// enabled.
    pub fn validate(&self) -> Result<(), NewCode> {
        if self.proxy.kind != ProxyType::None {
            let host = &self.proxy.host;
            if host.is_empty() || host.len() > MAX_HOSTNAME_LENGTH || host.contains('\0') {
                return Err(NewCode::ProxyBadHost);
            }
            if self.proxy.port == 0 {
                return Err(NewCode::ProxyBadPort);
            }
        }
        Ok(())
    }

    /// The UDP port range in ascending order, or `None` for the engine
    /// default.
    pub fn port_range(&self) -> Option<(u16, u16)> {
        match (self.start_port, self.end_port) {
            (0, 0) => None,
            (a, b) if a <= b => Some((a, b)),
            (a, b) => Some((b, a)),
        }
    }
}

/// State handed to the engine at construction.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Savedata {
    /// Fresh identity.
    #[default]
    None,
    /// A blob previously returned by `save`, passed through unchanged.
    ToxSave(Vec<u8>),
    /// Fresh session reusing an existing long-term secret key.
    SecretKey([u8; SECRET_KEY_SIZE]),
}

impl Savedata {
    pub fn is_none(&self) -> bool {
        matches!(self, Savedata::None)
    }
}

// Secret material stays out of logs.
impl fmt::Debug for Savedata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Savedata::None => f.write_str("None"),
            Savedata::ToxSave(blob) => write!(f, "ToxSave({} bytes)", blob.len()),
            Savedata::SecretKey(_) => f.write_str("SecretKey(..)"),
        }
    }
}

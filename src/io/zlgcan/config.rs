// src/io/zlgcan/config.rs
//
// Bus configuration, as stored in profiles or TOML files.
//
// Example (TOML):
//   channels = "0,1"
//   device_type = 41
//   bitrate = 500000
//   data_bitrate = 2000000
//   resistor_enable = true

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::io::error::IoError;

use super::capability;
use super::device_type::USBCANFD_200U;
use super::TransmitType;

// ============================================================================
// Channel List
// ============================================================================

/// Channel selection as written by users
#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelSpec {
    One(u8),
    Many(Vec<u8>),
    Text(String),
}

/// Validated logical channel ids, ascending and without duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChannelSpec", into = "Vec<u8>")]
pub struct ChannelList(Vec<u8>);

impl ChannelList {
    pub fn new(ids: impl IntoIterator<Item = u8>) -> Result<Self, IoError> {
        let mut ids: Vec<u8> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(IoError::configuration("at least one channel is required"));
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(Self(ids))
    }

    /// Parse `"0"`, `"0,1"` or `"0, 1, 2"`.
    pub fn parse(text: &str) -> Result<Self, IoError> {
        let ids = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u8>()
                    .map_err(|_| IoError::configuration(format!("invalid channel '{}'", part)))
            })
            .collect::<Result<Vec<u8>, IoError>>()?;
        Self::new(ids)
    }

    pub fn ids(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<ChannelSpec> for ChannelList {
    type Error = IoError;

    fn try_from(spec: ChannelSpec) -> Result<Self, IoError> {
        match spec {
            ChannelSpec::One(id) => Self::new([id]),
            ChannelSpec::Many(ids) => Self::new(ids),
            ChannelSpec::Text(text) => Self::parse(&text),
        }
    }
}

impl From<ChannelList> for Vec<u8> {
    fn from(list: ChannelList) -> Self {
        list.0
    }
}

// ============================================================================
// Channel Options
// ============================================================================

/// Per-channel settings applied to every configured channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOptions {
    /// Nominal (arbitration) bitrate in bit/s
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
    /// FD data-phase bitrate; defaults to `bitrate`
    #[serde(default)]
    pub data_bitrate: Option<u32>,
    /// Internal 120 ohm termination (USBCANFD devices)
    #[serde(default)]
    pub resistor_enable: Option<bool>,
    /// TCP devices: act as server (true) or client (false)
    #[serde(default)]
    pub is_server: Option<bool>,
    #[serde(default)]
    pub destination_address: Option<String>,
    #[serde(default)]
    pub destination_port: Option<u16>,
    #[serde(default)]
    pub local_port: Option<u16>,
    /// Init the controller in listen-only mode (no ACKs, no transmit)
    #[serde(default)]
    pub listen_only: bool,
}

fn default_bitrate() -> u32 {
    500_000
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            data_bitrate: None,
            resistor_enable: None,
            is_server: None,
            destination_address: None,
            destination_port: None,
            local_port: None,
            listen_only: false,
        }
    }
}

// ============================================================================
// Bus Configuration
// ============================================================================

/// Configuration for one ZLG bus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZlgcanConfig {
    pub channels: ChannelList,
    #[serde(default = "default_device_type")]
    pub device_type: u32,
    #[serde(default)]
    pub device_index: u32,
    /// CAN FD mode; defaults to what the device supports
    #[serde(default)]
    pub fd: Option<bool>,
    #[serde(default)]
    pub transmit_type: TransmitType,
    #[serde(flatten)]
    pub options: ChannelOptions,
}

fn default_device_type() -> u32 {
    USBCANFD_200U
}

impl ZlgcanConfig {
    /// Defaults for the given channels
    pub fn new(channels: ChannelList) -> Self {
        Self {
            channels,
            device_type: default_device_type(),
            device_index: 0,
            fd: None,
            transmit_type: TransmitType::default(),
            options: ChannelOptions::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, IoError> {
        toml::from_str(text)
            .map_err(|e| IoError::configuration(format!("invalid zlgcan config: {}", e)))
    }

    /// Build from a profile connection map
    pub fn from_connection(connection: &HashMap<String, serde_json::Value>) -> Result<Self, IoError> {
        let map: serde_json::Map<String, serde_json::Value> = connection
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| IoError::configuration(format!("invalid zlgcan connection: {}", e)))
    }

    /// Whether channels are initialised in CAN FD mode
    pub fn is_fd(&self) -> bool {
        self.fd
            .unwrap_or_else(|| capability::lookup(self.device_type).supports_fd)
    }
}

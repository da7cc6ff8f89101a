// src/io/mod.rs
//
// IO abstraction for CAN data sources.
// Provides the generic frame type and bus trait shared by device drivers,
// and the ZLG driver that multiplexes several device channels into one bus.

// Core modules
pub mod codec; // Frame codec trait and implementations
mod error;
pub mod traits; // Bus contract used by application code

// Device drivers
pub mod zlgcan;

pub use codec::FrameCodec;
pub use error::IoError;
pub use traits::CanBus;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// Shared Types
// ============================================================================

/// Maximum payload of a classic CAN frame
pub const CAN_MAX_DLEN: usize = 8;

/// Maximum payload of a CAN FD frame
pub const CANFD_MAX_DLEN: usize = 64;

/// Generic CAN message - produced by decode and consumed by encode.
///
/// Classic frames carry at most 8 bytes and ignore `bitrate_switch` and
/// `error_state_indicator`. FD frames carry at most 64 bytes and are never
/// remote frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Device timestamp in microseconds (host time for frames built locally).
    pub timestamp_us: u64,
    pub arbitration_id: u32,
    pub is_extended: bool,
    pub is_remote: bool,
    pub is_error: bool,
    /// Logical channel. `None` on transmit means "first configured channel".
    #[serde(default)]
    pub channel: Option<u8>,
    /// Declared data length (0..=64).
    pub dlc: u8,
    pub data: Vec<u8>,
    pub is_fd: bool,
    #[serde(default)]
    pub bitrate_switch: bool,
    #[serde(default)]
    pub error_state_indicator: bool,
}

impl FrameMessage {
    /// Build a classic data frame. `dlc` is taken from the payload length.
    pub fn classic(arbitration_id: u32, data: &[u8]) -> Self {
        Self {
            timestamp_us: now_us(),
            arbitration_id,
            is_extended: false,
            is_remote: false,
            is_error: false,
            channel: None,
            dlc: data.len().min(u8::MAX as usize) as u8,
            data: data.to_vec(),
            is_fd: false,
            bitrate_switch: false,
            error_state_indicator: false,
        }
    }

    /// Build a CAN FD data frame. `dlc` is taken from the payload length.
    pub fn fd(arbitration_id: u32, data: &[u8]) -> Self {
        Self {
            is_fd: true,
            ..Self::classic(arbitration_id, data)
        }
    }

    /// Build a classic remote frame requesting `dlc` bytes.
    pub fn remote(arbitration_id: u32, dlc: u8) -> Self {
        Self {
            is_remote: true,
            dlc,
            data: Vec::new(),
            ..Self::classic(arbitration_id, &[])
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_extended_id(mut self) -> Self {
        self.is_extended = true;
        self
    }

    pub fn with_bitrate_switch(mut self, brs: bool) -> Self {
        self.bitrate_switch = brs;
        self
    }

    /// Payload bytes covered by `dlc`.
    pub fn payload(&self) -> &[u8] {
        let len = (self.dlc as usize).min(self.data.len());
        &self.data[..len]
    }

    /// Largest `dlc` the frame's format allows.
    pub fn max_dlen(&self) -> usize {
        if self.is_fd {
            CANFD_MAX_DLEN
        } else {
            CAN_MAX_DLEN
        }
    }
}

impl fmt::Display for FrameMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = if self.is_extended {
            format!("{:08X}", self.arbitration_id)
        } else {
            format!("{:03X}", self.arbitration_id)
        };
        let channel = self
            .channel
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{:>16} ch{} {} [{}]{}{}{} {}",
            self.timestamp_us,
            channel,
            id,
            self.dlc,
            if self.is_fd { " FD" } else { "" },
            if self.bitrate_switch { " BRS" } else { "" },
            if self.is_remote { " R" } else { "" },
            hex::encode_upper(self.payload())
        )
    }
}

/// Get current time in microseconds since UNIX epoch
pub fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

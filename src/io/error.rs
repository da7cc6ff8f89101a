// src/io/error.rs
//
// Error taxonomy shared by the bus, the channel manager and the codecs.

use thiserror::Error;

/// Errors surfaced by the ZLG bus adapter.
///
/// A receive timeout is not an error; `recv` reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// The driver returned the invalid device handle.
    #[error("failed to open device type {device_type} index {device_index}")]
    DeviceOpenFailed { device_type: u32, device_index: u32 },

    /// A bitrate, network, start or resistor step failed for a channel.
    #[error("channel {channel} configuration failed: {reason}")]
    ConfigurationFailed { channel: u8, reason: String },

    /// The session has no configured channel to send on.
    #[error("no channel available to send")]
    NoChannelAvailable,

    /// The frame names a channel that is not configured.
    #[error("channel {0} is not configured")]
    UnknownChannel(u8),

    /// The driver accepted a different number of frames than requested.
    #[error("transmit on channel {channel} failed: driver accepted {accepted} of 1 frame")]
    TransmitFailed { channel: u8, accepted: u32 },

    /// An FD frame was routed to a channel initialised in classic mode.
    #[error("channel {0} is not in CAN FD mode")]
    FdNotEnabled(u8),

    /// The declared data length exceeds what the wire format can carry.
    #[error("payload too long: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },

    /// The arbitration id does not fit its 11-bit or 29-bit format.
    #[error(
        "arbitration id 0x{id:X} out of range for {kind} frame",
        kind = if *extended { "extended" } else { "standard" }
    )]
    InvalidArbitrationId { id: u32, extended: bool },

    /// Invalid configuration input.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl IoError {
    pub fn configuration(message: impl Into<String>) -> Self {
        IoError::Configuration(message.into())
    }

    pub fn channel_config(channel: u8, reason: impl Into<String>) -> Self {
        IoError::ConfigurationFailed {
            channel,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = IoError::channel_config(1, "start failed");
        assert_eq!(err.to_string(), "channel 1 configuration failed: start failed");

        let err = IoError::PayloadTooLong { len: 9, max: 8 };
        assert_eq!(err.to_string(), "payload too long: 9 bytes (max 8)");

        let err = IoError::InvalidArbitrationId {
            id: 0x800,
            extended: false,
        };
        assert_eq!(
            err.to_string(),
            "arbitration id 0x800 out of range for standard frame"
        );
    }
}

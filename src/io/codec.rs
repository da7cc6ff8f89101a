// src/io/codec.rs
//
// Unified frame codec trait and re-exports of device-specific implementations.
//
// A codec translates between the generic FrameMessage and one device wire
// frame. Devices with several wire formats (classic and FD) provide one codec
// per format so the transmit and receive paths can dispatch on `is_fd`.

use crate::io::error::IoError;
use crate::io::FrameMessage;

// ============================================================================
// Frame Codec Trait
// ============================================================================

/// Trait for CAN frame codecs.
///
/// The associated types define the device-specific received and transmitted
/// frame structures.
pub trait FrameCodec {
    /// Frame as handed back by the driver's receive call (frame + timestamp)
    type RxFrame;

    /// Frame as handed to the driver's transmit call
    type TxFrame;

    /// Largest payload the wire format carries
    const MAX_DLEN: usize;

    /// Decode a received wire frame into a FrameMessage tagged with `channel`.
    fn decode(raw: &Self::RxFrame, channel: u8) -> FrameMessage;

    /// Encode a frame for transmission.
    ///
    /// Returns `Err(IoError::PayloadTooLong)` before touching any wire buffer
    /// when `frame.dlc` exceeds `MAX_DLEN`.
    fn encode(frame: &FrameMessage) -> Result<Self::TxFrame, IoError>;
}

// ============================================================================
// Re-exports from driver modules
// ============================================================================

pub use super::zlgcan::codec::{ClassicCodec, FdCodec};

// ============================================================================
// Tests
// ============================================================================

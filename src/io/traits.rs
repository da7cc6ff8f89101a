// src/io/traits.rs
//
// Bus contract used by application code.

use std::time::Duration;

use super::{FrameMessage, IoError};

/// Generic CAN bus: send, blocking receive and shutdown.
///
/// Implementations are single-owner; share one behind a lock if several
/// threads need it.
pub trait CanBus {
    /// Transmit one frame. `timeout` bounds the call where the device allows it.
    fn send(&mut self, frame: &FrameMessage, timeout: Option<Duration>) -> Result<(), IoError>;

    /// Receive one frame.
    ///
    /// `None` or a zero timeout waits forever. `Ok(None)` means the timeout
    /// expired without a frame.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<FrameMessage>, IoError>;

    /// Release the device. Calling it more than once is a no-op.
    fn shutdown(&mut self);
}

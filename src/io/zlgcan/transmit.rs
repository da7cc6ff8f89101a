// src/io/zlgcan/transmit.rs
//
// Transmit path: route a frame to a configured channel, encode it for the
// channel's mode and hand exactly one frame to the driver.

use crate::io::codec::FrameCodec;
use crate::io::error::IoError;
use crate::io::FrameMessage;

use super::codec::{ClassicCodec, FdCodec};
use super::session::{Channel, DeviceSession};
use super::{TransmitType, ZcanTransmitData, ZcanTransmitFdData};

/// Pick the target channel. Never touches the driver.
fn route<'a>(session: &'a DeviceSession, frame: &FrameMessage) -> Result<&'a Channel, IoError> {
    match frame.channel {
        None => session
            .channels()
            .first()
            .ok_or(IoError::NoChannelAvailable),
        Some(id) => {
            if session.channels().is_empty() {
                return Err(IoError::NoChannelAvailable);
            }
            session.channel(id).ok_or(IoError::UnknownChannel(id))
        }
    }
}

/// Send one frame. The driver must accept exactly one frame.
pub(crate) fn send(
    session: &DeviceSession,
    frame: &FrameMessage,
    transmit_type: TransmitType,
) -> Result<(), IoError> {
    let channel = route(session, frame)?;
    let driver = session.driver.as_ref();

    let accepted = if frame.is_fd {
        if !channel.is_fd {
            return Err(IoError::FdNotEnabled(channel.logical_id));
        }
        let wire = ZcanTransmitFdData {
            frame: FdCodec::encode(frame)?,
            transmit_type,
        };
        driver.transmit_fd(channel.handle, &[wire])
    } else {
        let wire = ZcanTransmitData {
            frame: ClassicCodec::encode(frame)?,
            transmit_type,
        };
        driver.transmit(channel.handle, &[wire])
    };

    if accepted != 1 {
        tlog!(
            "[zlgcan] Transmit of 0x{:X} on channel {} failed (accepted {})",
            frame.arbitration_id,
            channel.logical_id,
            accepted
        );
        return Err(IoError::TransmitFailed {
            channel: channel.logical_id,
            accepted,
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

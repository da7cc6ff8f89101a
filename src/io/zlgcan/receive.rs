// src/io/zlgcan/receive.rs
//
// Multi-channel receive engine.
//
// A call first asks every channel how many frames are pending. When one has
// something waiting it is read straight away; otherwise the engine sweeps
// all channels with zero driver wait, sleeping at most 1 ms between sweeps,
// until a frame arrives or the deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use crate::io::codec::FrameCodec;
use crate::io::error::IoError;
use crate::io::FrameMessage;

use super::codec::{ClassicCodec, FdCodec};
use super::session::{Channel, DeviceSession};
use super::FrameKind;

/// Longest sleep between two polling sweeps
const POLL_INTERVAL: Duration = Duration::from_millis(1);

enum RecvState {
    /// A channel reported a pending frame of this kind
    Immediate { channel: Channel, kind: FrameKind },
    /// Nothing pending; poll until the deadline (`None` = forever)
    Polling { deadline: Option<Instant> },
}

/// First channel with a pending frame, classic before FD on each channel.
fn recv_check(session: &DeviceSession) -> Option<(Channel, FrameKind)> {
    let driver = session.driver.as_ref();
    for channel in session.channels() {
        if driver.pending_count(channel.handle, FrameKind::Can) > 0 {
            return Some((*channel, FrameKind::Can));
        }
        if channel.is_fd && driver.pending_count(channel.handle, FrameKind::CanFd) > 0 {
            return Some((*channel, FrameKind::CanFd));
        }
    }
    None
}

/// Read at most one frame of `kind` from `channel` without waiting.
fn read_one(session: &DeviceSession, channel: &Channel, kind: FrameKind) -> Option<FrameMessage> {
    let driver = session.driver.as_ref();
    match kind {
        FrameKind::Can => driver
            .receive(channel.handle, 1, 0)
            .first()
            .map(|raw| ClassicCodec::decode(raw, channel.logical_id)),
        FrameKind::CanFd => driver
            .receive_fd(channel.handle, 1, 0)
            .first()
            .map(|raw| FdCodec::decode(raw, channel.logical_id)),
    }
}

/// One pass over every channel in configuration order.
fn sweep(session: &DeviceSession) -> Option<FrameMessage> {
    for channel in session.channels() {
        if let Some(frame) = read_one(session, channel, FrameKind::Can) {
            return Some(frame);
        }
        if channel.is_fd {
            if let Some(frame) = read_one(session, channel, FrameKind::CanFd) {
                return Some(frame);
            }
        }
    }
    None
}

/// Receive one frame from any configured channel.
///
/// `None` or a zero timeout waits forever. `Ok(None)` is a timeout.
pub(crate) fn receive(
    session: &DeviceSession,
    timeout: Option<Duration>,
) -> Result<Option<FrameMessage>, IoError> {
    if !session.is_open() {
        return Err(IoError::configuration("device session is closed"));
    }
    if session.channels().is_empty() {
        return Err(IoError::NoChannelAvailable);
    }

    let deadline = timeout
        .filter(|t| !t.is_zero())
        .map(|t| Instant::now() + t);

    let mut state = match recv_check(session) {
        Some((channel, kind)) => RecvState::Immediate { channel, kind },
        None => RecvState::Polling { deadline },
    };

    loop {
        match state {
            RecvState::Immediate { channel, kind } => {
                if let Some(frame) = read_one(session, &channel, kind) {
                    return Ok(Some(frame));
                }
                // Pending count raced with another reader
                state = RecvState::Polling { deadline };
            }
            RecvState::Polling { deadline } => {
                if let Some(frame) = sweep(session) {
                    return Ok(Some(frame));
                }
                let nap = match deadline {
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero() {
                            return Ok(None);
                        }
                        remaining.min(POLL_INTERVAL)
                    }
                    None => POLL_INTERVAL,
                };
                thread::sleep(nap);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

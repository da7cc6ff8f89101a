// src/io/zlgcan/codec.rs
//
// ZLG classic and FD frame codecs.
//
// Classic frames carry up to 8 bytes and a remote flag. FD frames carry up
// to 64 bytes, BRS and ESI, and are never remote frames. The declared length
// goes on the wire unchanged; the driver picks the DLC code.

use crate::io::codec::FrameCodec;
use crate::io::error::IoError;
use crate::io::{FrameMessage, CANFD_MAX_DLEN, CAN_MAX_DLEN};

use super::{id_flags, ZcanFdFrame, ZcanFrame, ZcanReceiveData, ZcanReceiveFdData};

fn check_id(frame: &FrameMessage) -> Result<u32, IoError> {
    let mask = if frame.is_extended {
        id_flags::ID_MASK
    } else {
        id_flags::SFF_MASK
    };
    if frame.arbitration_id & !mask != 0 {
        return Err(IoError::InvalidArbitrationId {
            id: frame.arbitration_id,
            extended: frame.is_extended,
        });
    }
    Ok(frame.arbitration_id)
}

fn check_len(frame: &FrameMessage, max: usize) -> Result<usize, IoError> {
    let len = frame.dlc as usize;
    if len > max {
        return Err(IoError::PayloadTooLong { len, max });
    }
    Ok(len)
}

/// Copy the first `len` payload bytes into `dst`; missing bytes stay zero.
fn copy_payload(dst: &mut [u8], src: &[u8], len: usize) {
    let n = len.min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

// ============================================================================
// Classic Codec
// ============================================================================

/// Classic CAN codec (`ZCAN_CAN_FRAME`)
pub struct ClassicCodec;

impl FrameCodec for ClassicCodec {
    type RxFrame = ZcanReceiveData;
    type TxFrame = ZcanFrame;
    const MAX_DLEN: usize = CAN_MAX_DLEN;

    fn decode(raw: &ZcanReceiveData, channel: u8) -> FrameMessage {
        let frame = &raw.frame;
        let len = (frame.can_dlc as usize).min(CAN_MAX_DLEN);
        FrameMessage {
            timestamp_us: raw.timestamp,
            arbitration_id: frame.can_id,
            is_extended: frame.eff,
            is_remote: frame.rtr,
            is_error: frame.err,
            channel: Some(channel),
            dlc: len as u8,
            data: if frame.rtr {
                Vec::new()
            } else {
                frame.data[..len].to_vec()
            },
            is_fd: false,
            bitrate_switch: false,
            error_state_indicator: false,
        }
    }

    fn encode(frame: &FrameMessage) -> Result<ZcanFrame, IoError> {
        let can_id = check_id(frame)?;
        let len = check_len(frame, CAN_MAX_DLEN)?;

        let mut wire = ZcanFrame {
            can_id,
            err: false,
            rtr: frame.is_remote,
            eff: frame.is_extended,
            can_dlc: len as u8,
            data: [0; 8],
        };
        if !frame.is_remote {
            copy_payload(&mut wire.data, &frame.data, len);
        }
        Ok(wire)
    }
}

// ============================================================================
// FD Codec
// ============================================================================

/// CAN FD codec (`ZCAN_CANFD_FRAME`)
pub struct FdCodec;

impl FrameCodec for FdCodec {
    type RxFrame = ZcanReceiveFdData;
    type TxFrame = ZcanFdFrame;
    const MAX_DLEN: usize = CANFD_MAX_DLEN;

    fn decode(raw: &ZcanReceiveFdData, channel: u8) -> FrameMessage {
        let frame = &raw.frame;
        let len = (frame.len as usize).min(CANFD_MAX_DLEN);
        FrameMessage {
            timestamp_us: raw.timestamp,
            arbitration_id: frame.can_id,
            is_extended: frame.eff,
            is_remote: false,
            is_error: frame.err,
            channel: Some(channel),
            dlc: len as u8,
            data: frame.data[..len].to_vec(),
            is_fd: true,
            bitrate_switch: frame.brs,
            error_state_indicator: frame.esi,
        }
    }

    fn encode(frame: &FrameMessage) -> Result<ZcanFdFrame, IoError> {
        let can_id = check_id(frame)?;
        let len = check_len(frame, CANFD_MAX_DLEN)?;

        let mut wire = ZcanFdFrame {
            can_id,
            err: false,
            rtr: false,
            eff: frame.is_extended,
            len: len as u8,
            brs: frame.bitrate_switch,
            esi: frame.error_state_indicator,
            data: [0; 64],
        };
        copy_payload(&mut wire.data, &frame.data, len);
        Ok(wire)
    }
}

// ============================================================================
// Tests
// ============================================================================

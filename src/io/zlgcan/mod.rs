// src/io/zlgcan/mod.rs
//
// ZLG (zlgcan) USB/PCIe/network CAN interface support.
//
// The vendor library itself is an external collaborator reached through the
// `ZlgDriver` trait. This module holds the vendor constants and the logical
// form of the vendor frame structures, plus the channel manager, codecs,
// receive engine and transmit path built on top of the driver.
//
// Supported devices (see capability.rs):
// - USBCAN-E-U / 2E-U / 4E-U / 8E-U, USBCAN-I / II (classic CAN)
// - USBCANFD-100U / 200U / MINI, PCIE-CANFD-100U / 200U / 400U (CAN FD)
// - CANET, WIFICAN, CANFDNET, CANFDWIFI (TCP/UDP network devices)

pub mod bus;
pub mod capability;
pub mod codec;
pub mod config;
pub mod driver;
mod receive;
pub mod session;
mod transmit;

#[cfg(test)]
pub(crate) mod mock;

pub use bus::{Frames, ZlgcanBus};
pub use capability::{lookup, DeviceCapability, Transport};
pub use config::{ChannelList, ChannelOptions, ZlgcanConfig};
pub use driver::{PropertyGuard, ZlgDriver};
pub use session::{Channel, DeviceSession};

use serde::{Deserialize, Serialize};

// ============================================================================
// Vendor Constants
// ============================================================================

/// Device type codes accepted by the vendor `OpenDevice` call
pub mod device_type {
    pub const PCI5121: u32 = 1;
    pub const PCI9810: u32 = 2;
    pub const USBCAN1: u32 = 3;
    pub const USBCAN2: u32 = 4;
    pub const PCI9820: u32 = 5;
    pub const CANETUDP: u32 = 12;
    pub const PCI9840: u32 = 14;
    pub const CANETTCP: u32 = 17;
    pub const USBCAN_E_U: u32 = 20;
    pub const USBCAN_2E_U: u32 = 21;
    pub const WIFICAN_TCP: u32 = 25;
    pub const WIFICAN_UDP: u32 = 26;
    pub const USBCAN_4E_U: u32 = 31;
    pub const USBCAN_8E_U: u32 = 34;
    pub const PCIE_CANFD_100U: u32 = 38;
    pub const PCIE_CANFD_200U: u32 = 39;
    pub const PCIE_CANFD_400U: u32 = 40;
    pub const USBCANFD_200U: u32 = 41;
    pub const USBCANFD_100U: u32 = 42;
    pub const USBCANFD_MINI: u32 = 43;
    pub const CANFDNET_TCP: u32 = 48;
    pub const CANFDNET_UDP: u32 = 49;
    pub const CANFDWIFI_TCP: u32 = 50;
    pub const CANFDWIFI_UDP: u32 = 51;
    pub const CANFDNET_400U_TCP: u32 = 52;
    pub const CANFDNET_400U_UDP: u32 = 53;
    pub const VIRTUAL_DEVICE: u32 = 99;
}

/// Handle value the vendor library returns when opening a device fails
pub const INVALID_DEVICE_HANDLE: u64 = 0;

/// Handle value the vendor library returns when channel init fails
pub const INVALID_CHANNEL_HANDLE: u64 = 0;

/// Opaque device handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub u64);

impl DeviceHandle {
    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_DEVICE_HANDLE
    }
}

/// Opaque channel handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

impl ChannelHandle {
    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_CHANNEL_HANDLE
    }
}

/// Opaque property accessor handle (vendor `IProperty`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyHandle(pub u64);

/// Interface return status, with the vendor's return codes
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Err = 0,
    Ok = 1,
    Online = 2,
    Offline = 3,
    Unsupported = 4,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        *self == Status::Ok
    }
}

/// Frame kind used by `GetReceiveNum` and channel init
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Can = 0,
    CanFd = 1,
}

/// Transmit type field of the vendor transmit structures
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmitType {
    /// Retry until acknowledged
    #[default]
    Normal = 0,
    /// Send once, no retry
    Single = 1,
    /// Send and receive own frame
    SelfReception = 2,
    /// Send once and receive own frame
    SingleSelfReception = 3,
}

/// ID word flags (vendor bit-field: can_id:29, err:1, rtr:1, eff:1)
pub mod id_flags {
    pub const EFF: u32 = 0x8000_0000;
    pub const RTR: u32 = 0x4000_0000;
    pub const ERR: u32 = 0x2000_0000;
    pub const ID_MASK: u32 = 0x1FFF_FFFF;
    /// Largest 11-bit standard id
    pub const SFF_MASK: u32 = 0x7FF;
}

/// FD flags byte
pub mod fd_flags {
    pub const BRS: u8 = 0x01;
    pub const ESI: u8 = 0x02;
}

/// Property names written during channel configuration
pub mod property {
    pub const BAUD_RATE: &str = "baud_rate";
    pub const CANFD_ABIT_BAUD_RATE: &str = "canfd_abit_baud_rate";
    pub const CANFD_DBIT_BAUD_RATE: &str = "canfd_dbit_baud_rate";
    // Vendor spelling
    pub const INTERNAL_RESISTANCE: &str = "initenal_resistance";
    pub const WORK_MODE: &str = "work_mode";
    pub const IP: &str = "ip";
    pub const WORK_PORT: &str = "work_port";
    pub const LOCAL_PORT: &str = "local_port";
}

/// Build a `"<channel>/<name>"` property path
pub fn property_path(channel: u8, name: &str) -> String {
    format!("{}/{}", channel, name)
}

// ============================================================================
// Channel Init Configuration
// ============================================================================

/// Channel operating mode
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelMode {
    #[default]
    Normal = 0,
    ListenOnly = 1,
}

/// Logical form of `ZCAN_CHANNEL_INIT_CONFIG`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelInitConfig {
    pub kind: FrameKind,
    pub acc_code: u32,
    pub acc_mask: u32,
    pub mode: ChannelMode,
}

impl ChannelInitConfig {
    /// Accept-all filter in normal mode
    pub fn open_filter(kind: FrameKind) -> Self {
        Self {
            kind,
            acc_code: 0,
            acc_mask: 0xFFFF_FFFF,
            mode: ChannelMode::Normal,
        }
    }
}

// ============================================================================
// Wire Frame Structures
// ============================================================================

fn pack_id_word(can_id: u32, err: bool, rtr: bool, eff: bool) -> u32 {
    let mut word = can_id & id_flags::ID_MASK;
    if err {
        word |= id_flags::ERR;
    }
    if rtr {
        word |= id_flags::RTR;
    }
    if eff {
        word |= id_flags::EFF;
    }
    word
}

/// Classic CAN wire frame (`ZCAN_CAN_FRAME`, 16 bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZcanFrame {
    pub can_id: u32,
    pub err: bool,
    pub rtr: bool,
    pub eff: bool,
    pub can_dlc: u8,
    pub data: [u8; 8],
}

impl Default for ZcanFrame {
    fn default() -> Self {
        Self {
            can_id: 0,
            err: false,
            rtr: false,
            eff: false,
            can_dlc: 0,
            data: [0; 8],
        }
    }
}

impl ZcanFrame {
    pub const SIZE: usize = 16;

    /// Pack into the vendor byte layout:
    /// id_word(4, LE) + can_dlc(1) + pad(1) + res0(1) + res1(1) + data(8)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let word = pack_id_word(self.can_id, self.err, self.rtr, self.eff);
        buf[0..4].copy_from_slice(&word.to_le_bytes());
        buf[4] = self.can_dlc;
        buf[8..16].copy_from_slice(&self.data);
        buf
    }

    /// Parse the vendor byte layout. Returns None if the slice is too short.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::SIZE {
            return None;
        }
        let word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let mut data = [0u8; 8];
        data.copy_from_slice(&raw[8..16]);
        Some(Self {
            can_id: word & id_flags::ID_MASK,
            err: word & id_flags::ERR != 0,
            rtr: word & id_flags::RTR != 0,
            eff: word & id_flags::EFF != 0,
            can_dlc: raw[4],
            data,
        })
    }
}

/// CAN FD wire frame (`ZCAN_CANFD_FRAME`, 72 bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZcanFdFrame {
    pub can_id: u32,
    pub err: bool,
    pub rtr: bool,
    pub eff: bool,
    pub len: u8,
    pub brs: bool,
    pub esi: bool,
    pub data: [u8; 64],
}

impl Default for ZcanFdFrame {
    fn default() -> Self {
        Self {
            can_id: 0,
            err: false,
            rtr: false,
            eff: false,
            len: 0,
            brs: false,
            esi: false,
            data: [0; 64],
        }
    }
}

impl ZcanFdFrame {
    pub const SIZE: usize = 72;

    /// Pack into the vendor byte layout:
    /// id_word(4, LE) + len(1) + flags(1) + res0(1) + res1(1) + data(64)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let word = pack_id_word(self.can_id, self.err, self.rtr, self.eff);
        buf[0..4].copy_from_slice(&word.to_le_bytes());
        buf[4] = self.len;
        if self.brs {
            buf[5] |= fd_flags::BRS;
        }
        if self.esi {
            buf[5] |= fd_flags::ESI;
        }
        buf[8..72].copy_from_slice(&self.data);
        buf
    }

    /// Parse the vendor byte layout. Returns None if the slice is too short.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::SIZE {
            return None;
        }
        let word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let mut data = [0u8; 64];
        data.copy_from_slice(&raw[8..72]);
        Some(Self {
            can_id: word & id_flags::ID_MASK,
            err: word & id_flags::ERR != 0,
            rtr: word & id_flags::RTR != 0,
            eff: word & id_flags::EFF != 0,
            len: raw[4],
            brs: raw[5] & fd_flags::BRS != 0,
            esi: raw[5] & fd_flags::ESI != 0,
            data,
        })
    }
}

/// `ZCAN_Transmit_Data`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZcanTransmitData {
    pub frame: ZcanFrame,
    pub transmit_type: TransmitType,
}

/// `ZCAN_TransmitFD_Data`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZcanTransmitFdData {
    pub frame: ZcanFdFrame,
    pub transmit_type: TransmitType,
}

/// `ZCAN_Receive_Data`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZcanReceiveData {
    pub frame: ZcanFrame,
    /// Device timestamp in microseconds
    pub timestamp: u64,
}

/// `ZCAN_ReceiveFD_Data`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZcanReceiveFdData {
    pub frame: ZcanFdFrame,
    /// Device timestamp in microseconds
    pub timestamp: u64,
}

// ============================================================================
// Device and Channel Status
// ============================================================================

/// Device information (`ZCAN_DEVICE_INFO`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub hw_version: u16,
    pub fw_version: u16,
    pub dr_version: u16,
    pub in_version: u16,
    pub irq_num: u16,
    pub can_num: u8,
    pub serial: String,
    pub hw_type: String,
}

/// Format a vendor version word as `V<major>.<minor>`
pub fn format_version(version: u16) -> String {
    let major = version / 0xFF;
    let minor = version & 0xFF;
    if major >= 9 {
        format!("V{:02x}.{:02x}", major, minor)
    } else {
        format!("V{}.{:02x}", major, minor)
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hardware Version:{}", format_version(self.hw_version))?;
        writeln!(f, "Firmware Version:{}", format_version(self.fw_version))?;
        writeln!(f, "Driver Interface:{}", format_version(self.dr_version))?;
        writeln!(f, "Interface Interface:{}", format_version(self.in_version))?;
        writeln!(f, "Interrupt Number:{}", self.irq_num)?;
        writeln!(f, "CAN Number:{}", self.can_num)?;
        writeln!(f, "Serial:{}", self.serial)?;
        write!(f, "Hardware Type:{}", self.hw_type)
    }
}

/// Channel error information (`ZCAN_CHANNEL_ERR_INFO`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelErrorInfo {
    pub error_code: u32,
    pub passive_err_data: [u8; 3],
    pub ar_lost_err_data: u8,
}

/// Controller register snapshot (`ZCAN_CHANNEL_STATUS`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub err_interrupt: u8,
    pub reg_mode: u8,
    pub reg_status: u8,
    pub reg_al_capture: u8,
    pub reg_ec_capture: u8,
    pub reg_ew_limit: u8,
    pub reg_re_counter: u8,
    pub reg_te_counter: u8,
}

// ============================================================================
// Tests
// ============================================================================

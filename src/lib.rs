// src/lib.rs
//
// CAN and CAN FD bus adapter for ZLG (ZHIYUAN Electronics) interfaces.
//
// The vendor library is reached through the `ZlgDriver` trait. A `ZlgcanBus`
// opens one device, starts the requested channels and multiplexes them into
// a single `CanBus`:
//
//     let config = ZlgcanConfig::from_toml_str("channels = \"0,1\"")?;
//     let mut bus = ZlgcanBus::new(driver, &config)?;
//     bus.send(&FrameMessage::fd(0x123, &[1, 2, 3]).with_channel(1), None)?;
//     let frame = bus.recv(Some(Duration::from_millis(100)))?;

#[macro_use]
pub mod logging;
pub mod io;

pub use io::zlgcan::{
    device_type, lookup, ChannelList, ChannelOptions, DeviceCapability, DeviceSession, Transport,
    ZlgDriver, ZlgcanBus, ZlgcanConfig,
};
pub use io::{CanBus, FrameCodec, FrameMessage, IoError};
pub use logging::{init_file_logging, stop_file_logging};

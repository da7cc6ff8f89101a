// src/io/zlgcan/mock.rs
//
// Recording driver used by the unit tests. Frames are injected per logical
// channel; failures are scripted per channel or property path.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::driver::ZlgDriver;
use super::{
    ChannelErrorInfo, ChannelHandle, ChannelInitConfig, ChannelStatus, DeviceHandle, DeviceInfo,
    FrameKind, PropertyHandle, Status, ZcanFdFrame, ZcanFrame, ZcanReceiveData,
    ZcanReceiveFdData, ZcanTransmitData, ZcanTransmitFdData,
};

/// A frame handed to one of the transmit calls
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transmitted {
    Classic(ZcanTransmitData),
    Fd(ZcanTransmitFdData),
}

#[derive(Default)]
struct MockState {
    next_handle: u64,
    fail_open: bool,
    fail_accessor: bool,
    fail_init: HashSet<u8>,
    fail_start: HashSet<u8>,
    fail_paths: HashSet<String>,
    transmit_accepted: Option<u32>,
    channels: HashMap<u64, u8>,
    init_configs: Vec<(u8, ChannelInitConfig)>,
    started: Vec<u8>,
    reset: Vec<u8>,
    cleared: Vec<u8>,
    closed_devices: u32,
    properties: HashMap<String, String>,
    property_writes: Vec<(String, String)>,
    acquired: u32,
    released: u32,
    rx_classic: HashMap<u8, VecDeque<ZcanReceiveData>>,
    rx_fd: HashMap<u8, VecDeque<ZcanReceiveFdData>>,
    transmitted: Vec<(u8, Transmitted)>,
    calls: Vec<String>,
}

pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_handle: 100,
                ..Default::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    // ---- scripting ----

    pub fn fail_open(&self) {
        self.with(|s| s.fail_open = true);
    }

    pub fn fail_property_accessor(&self) {
        self.with(|s| s.fail_accessor = true);
    }

    pub fn fail_init(&self, channel: u8) {
        self.with(|s| s.fail_init.insert(channel));
    }

    pub fn fail_start(&self, channel: u8) {
        self.with(|s| s.fail_start.insert(channel));
    }

    pub fn fail_property(&self, path: &str) {
        self.with(|s| s.fail_paths.insert(path.to_string()));
    }

    pub fn set_transmit_accepted(&self, accepted: u32) {
        self.with(|s| s.transmit_accepted = Some(accepted));
    }

    pub fn push_classic(&self, channel: u8, can_id: u32, data: &[u8], timestamp: u64) {
        let mut frame = ZcanFrame {
            can_id,
            can_dlc: data.len() as u8,
            ..Default::default()
        };
        frame.data[..data.len()].copy_from_slice(data);
        self.push_classic_raw(channel, ZcanReceiveData { frame, timestamp });
    }

    pub fn push_classic_raw(&self, channel: u8, rx: ZcanReceiveData) {
        self.with(|s| s.rx_classic.entry(channel).or_default().push_back(rx));
    }

    pub fn push_fd(&self, channel: u8, can_id: u32, data: &[u8], timestamp: u64) {
        let mut frame = ZcanFdFrame {
            can_id,
            len: data.len() as u8,
            ..Default::default()
        };
        frame.data[..data.len()].copy_from_slice(data);
        self.with(|s| {
            s.rx_fd
                .entry(channel)
                .or_default()
                .push_back(ZcanReceiveFdData { frame, timestamp })
        });
    }

    // ---- inspection ----

    pub fn property_writes(&self) -> Vec<(String, String)> {
        self.with(|s| s.property_writes.clone())
    }

    pub fn properties_acquired(&self) -> u32 {
        self.with(|s| s.acquired)
    }

    pub fn properties_released(&self) -> u32 {
        self.with(|s| s.released)
    }

    pub fn init_configs(&self) -> Vec<(u8, ChannelInitConfig)> {
        self.with(|s| s.init_configs.clone())
    }

    pub fn started_channels(&self) -> Vec<u8> {
        self.with(|s| s.started.clone())
    }

    pub fn reset_channels(&self) -> Vec<u8> {
        self.with(|s| s.reset.clone())
    }

    pub fn cleared_channels(&self) -> Vec<u8> {
        self.with(|s| s.cleared.clone())
    }

    pub fn closed_devices(&self) -> u32 {
        self.with(|s| s.closed_devices)
    }

    pub fn transmitted(&self) -> Vec<(u8, Transmitted)> {
        self.with(|s| s.transmitted.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    fn logical(state: &MockState, handle: ChannelHandle) -> u8 {
        state.channels.get(&handle.0).copied().unwrap_or(u8::MAX)
    }
}

impl ZlgDriver for MockDriver {
    fn open_device(&self, _device_type: u32, _device_index: u32) -> DeviceHandle {
        self.with(|s| {
            s.calls.push("open_device".to_string());
            if s.fail_open {
                return DeviceHandle(0);
            }
            s.next_handle += 1;
            DeviceHandle(s.next_handle)
        })
    }

    fn close_device(&self, _device: DeviceHandle) -> Status {
        self.with(|s| {
            s.calls.push("close_device".to_string());
            s.closed_devices += 1;
            Status::Ok
        })
    }

    fn device_info(&self, _device: DeviceHandle) -> Option<DeviceInfo> {
        Some(DeviceInfo {
            hw_version: 0x0102,
            fw_version: 0x0103,
            dr_version: 0x0201,
            in_version: 0x0201,
            irq_num: 0,
            can_num: 2,
            serial: "MOCK0001".to_string(),
            hw_type: "USBCANFD-200U".to_string(),
        })
    }

    fn is_device_online(&self, _device: DeviceHandle) -> Status {
        Status::Online
    }

    fn init_channel(
        &self,
        _device: DeviceHandle,
        channel: u8,
        config: &ChannelInitConfig,
    ) -> Option<ChannelHandle> {
        self.with(|s| {
            s.calls.push(format!("init_channel:{}", channel));
            s.init_configs.push((channel, *config));
            if s.fail_init.contains(&channel) {
                return None;
            }
            s.next_handle += 1;
            s.channels.insert(s.next_handle, channel);
            Some(ChannelHandle(s.next_handle))
        })
    }

    fn start_channel(&self, channel: ChannelHandle) -> Status {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("start_channel:{}", logical));
            if s.fail_start.contains(&logical) {
                return Status::Err;
            }
            s.started.push(logical);
            Status::Ok
        })
    }

    fn reset_channel(&self, channel: ChannelHandle) -> Status {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("reset_channel:{}", logical));
            s.reset.push(logical);
            Status::Ok
        })
    }

    fn clear_buffer(&self, channel: ChannelHandle) -> Status {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.cleared.push(logical);
            s.rx_classic.remove(&logical);
            s.rx_fd.remove(&logical);
            Status::Ok
        })
    }

    fn read_channel_error_info(&self, _channel: ChannelHandle) -> Option<ChannelErrorInfo> {
        Some(ChannelErrorInfo {
            error_code: 0x0004,
            passive_err_data: [0, 1, 2],
            ar_lost_err_data: 0,
        })
    }

    fn read_channel_status(&self, _channel: ChannelHandle) -> Option<ChannelStatus> {
        Some(ChannelStatus {
            reg_te_counter: 3,
            ..Default::default()
        })
    }

    fn pending_count(&self, channel: ChannelHandle, kind: FrameKind) -> u32 {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("pending_count:{}:{:?}", logical, kind));
            match kind {
                FrameKind::Can => s.rx_classic.get(&logical).map_or(0, |q| q.len() as u32),
                FrameKind::CanFd => s.rx_fd.get(&logical).map_or(0, |q| q.len() as u32),
            }
        })
    }

    fn transmit(&self, channel: ChannelHandle, frames: &[ZcanTransmitData]) -> u32 {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("transmit:{}", logical));
            for frame in frames {
                s.transmitted.push((logical, Transmitted::Classic(*frame)));
            }
            s.transmit_accepted.unwrap_or(frames.len() as u32)
        })
    }

    fn transmit_fd(&self, channel: ChannelHandle, frames: &[ZcanTransmitFdData]) -> u32 {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("transmit_fd:{}", logical));
            for frame in frames {
                s.transmitted.push((logical, Transmitted::Fd(*frame)));
            }
            s.transmit_accepted.unwrap_or(frames.len() as u32)
        })
    }

    fn receive(&self, channel: ChannelHandle, max_count: u32, _wait_ms: i32) -> Vec<ZcanReceiveData> {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("receive:{}", logical));
            let queue = s.rx_classic.entry(logical).or_default();
            let n = (max_count as usize).min(queue.len());
            queue.drain(..n).collect()
        })
    }

    fn receive_fd(
        &self,
        channel: ChannelHandle,
        max_count: u32,
        _wait_ms: i32,
    ) -> Vec<ZcanReceiveFdData> {
        self.with(|s| {
            let logical = Self::logical(s, channel);
            s.calls.push(format!("receive_fd:{}", logical));
            let queue = s.rx_fd.entry(logical).or_default();
            let n = (max_count as usize).min(queue.len());
            queue.drain(..n).collect()
        })
    }

    fn get_property(&self, _device: DeviceHandle) -> Option<PropertyHandle> {
        self.with(|s| {
            if s.fail_accessor {
                return None;
            }
            s.acquired += 1;
            Some(PropertyHandle(7))
        })
    }

    fn set_value(&self, _property: PropertyHandle, path: &str, value: &str) -> Status {
        self.with(|s| {
            s.calls.push(format!("set_value:{}", path));
            s.property_writes.push((path.to_string(), value.to_string()));
            if s.fail_paths.contains(path) {
                return Status::Err;
            }
            s.properties.insert(path.to_string(), value.to_string());
            Status::Ok
        })
    }

    fn get_value(&self, _property: PropertyHandle, path: &str) -> Option<String> {
        self.with(|s| s.properties.get(path).cloned())
    }

    fn release_property(&self, _property: PropertyHandle) -> Status {
        self.with(|s| {
            s.released += 1;
            Status::Ok
        })
    }
}

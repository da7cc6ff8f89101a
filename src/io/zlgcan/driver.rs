// src/io/zlgcan/driver.rs
//
// Driver binding interface.
//
// The vendor library (zlgcan.dll / libusbcanfd.so) is reached only through
// this trait. Implementations wrap the native calls one-to-one; the channel
// manager, codecs and receive engine never assume a memory layout.

use super::{
    ChannelErrorInfo, ChannelHandle, ChannelInitConfig, ChannelStatus, DeviceHandle, DeviceInfo,
    FrameKind, PropertyHandle, Status, ZcanReceiveData, ZcanReceiveFdData, ZcanTransmitData,
    ZcanTransmitFdData,
};

/// Vendor driver operations consumed by the bus.
///
/// Handles equal to zero are the vendor's "invalid" sentinels.
pub trait ZlgDriver: Send + Sync {
    /// `ZCAN_OpenDevice`. Returns the invalid handle on failure.
    fn open_device(&self, device_type: u32, device_index: u32) -> DeviceHandle;

    /// `ZCAN_CloseDevice`
    fn close_device(&self, device: DeviceHandle) -> Status;

    /// `ZCAN_GetDeviceInf`
    fn device_info(&self, device: DeviceHandle) -> Option<DeviceInfo>;

    /// `ZCAN_IsDeviceOnLine`
    fn is_device_online(&self, device: DeviceHandle) -> Status;

    /// `ZCAN_InitCAN`. `None` when the channel cannot be initialised.
    fn init_channel(
        &self,
        device: DeviceHandle,
        channel: u8,
        config: &ChannelInitConfig,
    ) -> Option<ChannelHandle>;

    /// `ZCAN_StartCAN`
    fn start_channel(&self, channel: ChannelHandle) -> Status;

    /// `ZCAN_ResetCAN` - stops the channel
    fn reset_channel(&self, channel: ChannelHandle) -> Status;

    /// `ZCAN_ClearBuffer`
    fn clear_buffer(&self, channel: ChannelHandle) -> Status;

    /// `ZCAN_ReadChannelErrInfo`
    fn read_channel_error_info(&self, channel: ChannelHandle) -> Option<ChannelErrorInfo>;

    /// `ZCAN_ReadChannelStatus`
    fn read_channel_status(&self, channel: ChannelHandle) -> Option<ChannelStatus>;

    /// `ZCAN_GetReceiveNum` - frames waiting in the driver queue
    fn pending_count(&self, channel: ChannelHandle, kind: FrameKind) -> u32;

    /// `ZCAN_Transmit` - returns the number of frames accepted
    fn transmit(&self, channel: ChannelHandle, frames: &[ZcanTransmitData]) -> u32;

    /// `ZCAN_TransmitFD` - returns the number of frames accepted
    fn transmit_fd(&self, channel: ChannelHandle, frames: &[ZcanTransmitFdData]) -> u32;

    /// `ZCAN_Receive`. `wait_ms` of -1 blocks in the driver, 0 returns at once.
    fn receive(&self, channel: ChannelHandle, max_count: u32, wait_ms: i32) -> Vec<ZcanReceiveData>;

    /// `ZCAN_ReceiveFD`
    fn receive_fd(
        &self,
        channel: ChannelHandle,
        max_count: u32,
        wait_ms: i32,
    ) -> Vec<ZcanReceiveFdData>;

    /// `GetIProperty`
    fn get_property(&self, device: DeviceHandle) -> Option<PropertyHandle>;

    /// `IProperty::SetValue` with a `"<channel>/<name>"` path
    fn set_value(&self, property: PropertyHandle, path: &str, value: &str) -> Status;

    /// `IProperty::GetValue`
    fn get_value(&self, property: PropertyHandle, path: &str) -> Option<String>;

    /// `ReleaseIProperty`
    fn release_property(&self, property: PropertyHandle) -> Status;
}

/// Property accessor that is released exactly once, when dropped.
pub struct PropertyGuard<'a> {
    driver: &'a dyn ZlgDriver,
    handle: PropertyHandle,
}

impl<'a> PropertyGuard<'a> {
    /// Acquire the device's property accessor.
    pub fn acquire(driver: &'a dyn ZlgDriver, device: DeviceHandle) -> Option<Self> {
        driver
            .get_property(device)
            .map(|handle| Self { driver, handle })
    }

    pub fn set(&self, path: &str, value: &str) -> Status {
        self.driver.set_value(self.handle, path, value)
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.driver.get_value(self.handle, path)
    }
}

impl Drop for PropertyGuard<'_> {
    fn drop(&mut self) {
        let status = self.driver.release_property(self.handle);
        if !status.is_ok() {
            tlog!("[zlgcan] Release property accessor returned {:?}", status);
        }
    }
}

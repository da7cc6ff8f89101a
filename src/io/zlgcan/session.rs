// src/io/zlgcan/session.rs
//
// Channel manager: owns the open device handle and the logical channel map,
// and brings requested channels into the running state.
//
// Configuration order per channel:
//   1. bitrate properties (USB/PCIe devices only, before init)
//   2. channel init in CAN or CAN FD mode with an accept-all filter
//   3. init failure -> channel recorded as failed, not fatal
//   4. network work mode / addressing (network devices, after init)
//   5. start
//   6. termination resistor (after start)

use std::sync::Arc;

use crate::io::error::IoError;

use super::capability::{self, DeviceCapability, Transport};
use super::config::ChannelOptions;
use super::driver::{PropertyGuard, ZlgDriver};
use super::{
    property, property_path, ChannelErrorInfo, ChannelHandle, ChannelInitConfig, ChannelMode,
    ChannelStatus, DeviceHandle, DeviceInfo, FrameKind, Status,
};

/// One running logical channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channel {
    pub logical_id: u8,
    pub handle: ChannelHandle,
    /// Initialised in CAN FD mode
    pub is_fd: bool,
}

/// An open device and its running channels.
///
/// Channels keep configuration order. Dropping the session shuts it down.
pub struct DeviceSession {
    pub(crate) driver: Arc<dyn ZlgDriver>,
    device: Option<DeviceHandle>,
    device_type: u32,
    capability: DeviceCapability,
    pub(crate) channels: Vec<Channel>,
    failed_channels: Vec<u8>,
}

impl DeviceSession {
    /// Open a device. The invalid handle from the driver is the failure signal.
    pub fn open(
        driver: Arc<dyn ZlgDriver>,
        device_type: u32,
        device_index: u32,
    ) -> Result<Self, IoError> {
        let handle = driver.open_device(device_type, device_index);
        if !handle.is_valid() {
            tlog!(
                "[zlgcan] Open device {} (type {}) index {} failed",
                capability::device_name(device_type).unwrap_or("unknown"),
                device_type,
                device_index
            );
            return Err(IoError::DeviceOpenFailed {
                device_type,
                device_index,
            });
        }

        tlog!(
            "[zlgcan] Opened {} (type {}) index {}",
            capability::device_name(device_type).unwrap_or("unknown"),
            device_type,
            device_index
        );

        Ok(Self {
            driver,
            device: Some(handle),
            device_type,
            capability: capability::lookup(device_type),
            channels: Vec::new(),
            failed_channels: Vec::new(),
        })
    }

    pub fn device_type(&self) -> u32 {
        self.device_type
    }

    pub fn capability(&self) -> DeviceCapability {
        self.capability
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Running channels in configuration order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Logical ids whose channel init failed
    pub fn failed_channels(&self) -> &[u8] {
        &self.failed_channels
    }

    pub fn channel(&self, logical_id: u8) -> Option<&Channel> {
        self.channels.iter().find(|c| c.logical_id == logical_id)
    }

    fn device_handle(&self) -> Result<DeviceHandle, IoError> {
        self.device
            .ok_or_else(|| IoError::configuration("device session is closed"))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Configure each requested channel in order.
    ///
    /// Returns the ids whose init failed; those are skipped. Any other failure
    /// aborts with `ConfigurationFailed`.
    pub fn configure_channels(
        &mut self,
        logical_ids: &[u8],
        is_fd: bool,
        options: &ChannelOptions,
    ) -> Result<Vec<u8>, IoError> {
        let mut failed = Vec::new();
        for &id in logical_ids {
            if self.configure_channel(id, is_fd, options)?.is_none() {
                failed.push(id);
            }
        }
        Ok(failed)
    }

    /// Configure and start one channel.
    ///
    /// `Ok(None)` means the driver could not initialise the channel; it is
    /// recorded in `failed_channels` and the session stays usable.
    pub fn configure_channel(
        &mut self,
        logical_id: u8,
        is_fd: bool,
        options: &ChannelOptions,
    ) -> Result<Option<Channel>, IoError> {
        let device = self.device_handle()?;
        let cap = self.capability;

        if self.channel(logical_id).is_some() {
            return Err(IoError::channel_config(logical_id, "channel already configured"));
        }
        if is_fd && !cap.supports_fd {
            return Err(IoError::channel_config(
                logical_id,
                "device does not support CAN FD",
            ));
        }

        let driver = Arc::clone(&self.driver);
        let props = PropertyGuard::acquire(driver.as_ref(), device).ok_or_else(|| {
            IoError::channel_config(logical_id, "property accessor unavailable")
        })?;

        // Step 1: bitrate
        if !cap.is_network_device {
            Self::apply_bitrate(&props, logical_id, cap, options)?;
        } else if options.data_bitrate.is_some() {
            tlog!(
                "[zlgcan] Channel {}: data bitrate ignored on network device",
                logical_id
            );
        }

        // Steps 2-3: init
        let kind = if is_fd { FrameKind::CanFd } else { FrameKind::Can };
        let mut init = ChannelInitConfig::open_filter(kind);
        if options.listen_only {
            init.mode = ChannelMode::ListenOnly;
        }
        let handle = match driver.init_channel(device, logical_id, &init) {
            Some(handle) if handle.is_valid() => handle,
            _ => {
                tlog!("[zlgcan] Init channel {} failed, skipping", logical_id);
                self.failed_channels.push(logical_id);
                return Ok(None);
            }
        };

        // Steps 4-6 leave no initialised handle behind on failure
        let started = Self::apply_network(&props, logical_id, cap, options)
            .and_then(|_| Self::start(driver.as_ref(), handle, logical_id))
            .and_then(|_| Self::apply_resistor(&props, logical_id, cap, options));
        if let Err(e) = started {
            tlog!("[zlgcan] {}", e);
            driver.reset_channel(handle);
            return Err(e);
        }

        let channel = Channel {
            logical_id,
            handle,
            is_fd,
        };
        self.channels.push(channel);
        tlog!(
            "[zlgcan] Channel {} started ({} mode)",
            logical_id,
            if is_fd { "CAN FD" } else { "CAN" }
        );
        Ok(Some(channel))
    }

    fn set_property(
        props: &PropertyGuard<'_>,
        channel: u8,
        name: &str,
        value: &str,
    ) -> Result<(), IoError> {
        let path = property_path(channel, name);
        match props.set(&path, value) {
            Status::Ok => Ok(()),
            status => Err(IoError::channel_config(
                channel,
                format!("set {} = {} returned {:?}", path, value, status),
            )),
        }
    }

    fn apply_bitrate(
        props: &PropertyGuard<'_>,
        channel: u8,
        cap: DeviceCapability,
        options: &ChannelOptions,
    ) -> Result<(), IoError> {
        let bitrate = options.bitrate.to_string();
        if cap.supports_fd {
            let data_bitrate = options.data_bitrate.unwrap_or(options.bitrate).to_string();
            Self::set_property(props, channel, property::CANFD_ABIT_BAUD_RATE, &bitrate)?;
            Self::set_property(props, channel, property::CANFD_DBIT_BAUD_RATE, &data_bitrate)
        } else {
            if options.data_bitrate.is_some() {
                tlog!(
                    "[zlgcan] Channel {}: data bitrate ignored on classic device",
                    channel
                );
            }
            Self::set_property(props, channel, property::BAUD_RATE, &bitrate)
        }
    }

    fn apply_network(
        props: &PropertyGuard<'_>,
        channel: u8,
        cap: DeviceCapability,
        options: &ChannelOptions,
    ) -> Result<(), IoError> {
        if !cap.is_network_device {
            return Ok(());
        }

        let is_server = cap.transport == Transport::Tcp && options.is_server == Some(true);
        if cap.transport == Transport::Tcp {
            if let Some(server) = options.is_server {
                let mode = if server { "1" } else { "0" };
                Self::set_property(props, channel, property::WORK_MODE, mode)?;
            }
        } else if options.is_server.is_some() {
            tlog!("[zlgcan] Channel {}: work mode only applies to TCP devices", channel);
        }

        if !is_server {
            let (address, port) = match (&options.destination_address, options.destination_port) {
                (Some(address), Some(port)) => (address, port),
                _ => {
                    return Err(IoError::channel_config(
                        channel,
                        "destination address and port are required",
                    ))
                }
            };
            Self::set_property(props, channel, property::IP, address)?;
            Self::set_property(props, channel, property::WORK_PORT, &port.to_string())?;
        }

        if let Some(local_port) = options.local_port {
            Self::set_property(props, channel, property::LOCAL_PORT, &local_port.to_string())?;
        }
        Ok(())
    }

    fn start(driver: &dyn ZlgDriver, handle: ChannelHandle, channel: u8) -> Result<(), IoError> {
        match driver.start_channel(handle) {
            Status::Ok => Ok(()),
            status => Err(IoError::channel_config(
                channel,
                format!("start returned {:?}", status),
            )),
        }
    }

    fn apply_resistor(
        props: &PropertyGuard<'_>,
        channel: u8,
        cap: DeviceCapability,
        options: &ChannelOptions,
    ) -> Result<(), IoError> {
        match options.resistor_enable {
            Some(enable) if cap.supports_resistor => {
                let value = if enable { "1" } else { "0" };
                Self::set_property(props, channel, property::INTERNAL_RESISTANCE, value)
            }
            Some(_) => {
                tlog!(
                    "[zlgcan] Channel {}: device has no termination resistor",
                    channel
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    // ========================================================================
    // Device queries
    // ========================================================================

    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.device.and_then(|d| self.driver.device_info(d))
    }

    pub fn is_online(&self) -> bool {
        self.device
            .map(|d| self.driver.is_device_online(d) == Status::Online)
            .unwrap_or(false)
    }

    /// Write a raw property through a short-lived accessor.
    pub fn set_value(&self, path: &str, value: &str) -> Result<(), IoError> {
        let device = self.device_handle()?;
        let props = PropertyGuard::acquire(self.driver.as_ref(), device)
            .ok_or_else(|| IoError::configuration("property accessor unavailable"))?;
        match props.set(path, value) {
            Status::Ok => Ok(()),
            status => Err(IoError::configuration(format!(
                "set {} = {} returned {:?}",
                path, value, status
            ))),
        }
    }

    /// Read a raw property through a short-lived accessor.
    pub fn get_value(&self, path: &str) -> Result<Option<String>, IoError> {
        let device = self.device_handle()?;
        let props = PropertyGuard::acquire(self.driver.as_ref(), device)
            .ok_or_else(|| IoError::configuration("property accessor unavailable"))?;
        Ok(props.get(path))
    }

    /// Discard frames queued in the driver for every channel.
    pub fn clear_buffers(&self) {
        for channel in &self.channels {
            let status = self.driver.clear_buffer(channel.handle);
            if !status.is_ok() {
                tlog!(
                    "[zlgcan] Clear buffer on channel {} returned {:?}",
                    channel.logical_id,
                    status
                );
            }
        }
    }

    pub fn channel_error_info(&self, logical_id: u8) -> Result<Option<ChannelErrorInfo>, IoError> {
        let channel = self
            .channel(logical_id)
            .ok_or(IoError::UnknownChannel(logical_id))?;
        Ok(self.driver.read_channel_error_info(channel.handle))
    }

    pub fn channel_status(&self, logical_id: u8) -> Result<Option<ChannelStatus>, IoError> {
        let channel = self
            .channel(logical_id)
            .ok_or(IoError::UnknownChannel(logical_id))?;
        Ok(self.driver.read_channel_status(channel.handle))
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Stop every channel, then close the device. No-op once closed.
    pub fn shutdown(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        for channel in self.channels.drain(..) {
            let status = self.driver.reset_channel(channel.handle);
            if !status.is_ok() {
                tlog!(
                    "[zlgcan] Reset channel {} returned {:?}",
                    channel.logical_id,
                    status
                );
            }
        }
        let status = self.driver.close_device(device);
        tlog!("[zlgcan] Device closed ({:?})", status);
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

// src/io/zlgcan/bus.rs
//
// ZLG bus: one device session exposed through the generic `CanBus` contract.

use std::sync::Arc;
use std::time::Duration;

use crate::io::error::IoError;
use crate::io::traits::CanBus;
use crate::io::FrameMessage;

use super::config::ZlgcanConfig;
use super::driver::ZlgDriver;
use super::session::DeviceSession;
use super::{receive, transmit, ChannelErrorInfo, ChannelStatus, DeviceInfo, TransmitType};

/// A configured ZLG device with one or more running channels.
pub struct ZlgcanBus {
    session: DeviceSession,
    transmit_type: TransmitType,
}

impl ZlgcanBus {
    /// Open the device and start every configured channel.
    ///
    /// Channels whose init fails are skipped and listed by
    /// `failed_channels()`. Any other failure closes the device again.
    pub fn new(driver: Arc<dyn ZlgDriver>, config: &ZlgcanConfig) -> Result<Self, IoError> {
        let mut session = DeviceSession::open(driver, config.device_type, config.device_index)?;
        let is_fd = config.is_fd();

        if let Err(e) = session.configure_channels(config.channels.ids(), is_fd, &config.options) {
            tlog!("[zlgcan] Configuration failed, closing device: {}", e);
            session.shutdown();
            return Err(e);
        }

        tlog!(
            "[zlgcan] Bus ready: {} channel(s) running, {} failed",
            session.channels().len(),
            session.failed_channels().len()
        );

        Ok(Self {
            session,
            transmit_type: config.transmit_type,
        })
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    /// Logical ids of the running channels, in receive order
    pub fn channel_ids(&self) -> Vec<u8> {
        self.session.channels().iter().map(|c| c.logical_id).collect()
    }

    pub fn failed_channels(&self) -> &[u8] {
        self.session.failed_channels()
    }

    /// Frames received until a call times out.
    ///
    /// Iteration also stops at the first error. Calling `iter` again resumes
    /// reception.
    pub fn iter(&mut self, timeout: Option<Duration>) -> Frames<'_> {
        Frames {
            bus: self,
            timeout,
            done: false,
        }
    }

    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.session.device_info()
    }

    pub fn is_online(&self) -> bool {
        self.session.is_online()
    }

    pub fn set_value(&self, path: &str, value: &str) -> Result<(), IoError> {
        self.session.set_value(path, value)
    }

    pub fn get_value(&self, path: &str) -> Result<Option<String>, IoError> {
        self.session.get_value(path)
    }

    /// Drop frames still queued in the driver.
    pub fn flush_tx_buffer(&self) {
        self.session.clear_buffers();
    }

    pub fn channel_error_info(&self, channel: u8) -> Result<Option<ChannelErrorInfo>, IoError> {
        self.session.channel_error_info(channel)
    }

    pub fn channel_status(&self, channel: u8) -> Result<Option<ChannelStatus>, IoError> {
        self.session.channel_status(channel)
    }
}

impl CanBus for ZlgcanBus {
    /// The vendor transmit call has no timeout, so `timeout` is ignored.
    fn send(&mut self, frame: &FrameMessage, _timeout: Option<Duration>) -> Result<(), IoError> {
        transmit::send(&self.session, frame, self.transmit_type)
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<FrameMessage>, IoError> {
        receive::receive(&self.session, timeout)
    }

    fn shutdown(&mut self) {
        if self.session.is_open() {
            tlog!("[zlgcan] Shutting down bus");
        }
        self.session.shutdown();
    }
}

/// Iterator returned by [`ZlgcanBus::iter`]
pub struct Frames<'a> {
    bus: &'a mut ZlgcanBus,
    timeout: Option<Duration>,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<FrameMessage, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.bus.recv(self.timeout) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

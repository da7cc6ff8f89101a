// src/io/zlgcan/capability.rs
//
// Static device capability table.
//
// Every device-specific branch of channel configuration is gated on this
// table. Adding a device model is a one-line change to DEVICE_TABLE.

use serde::Serialize;

use super::device_type::*;

/// Network transport of a network-attached device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    None,
    Tcp,
    Udp,
}

/// Feature set of one device model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeviceCapability {
    pub supports_fd: bool,
    pub supports_classic: bool,
    pub supports_resistor: bool,
    pub is_network_device: bool,
    pub transport: Transport,
}

impl DeviceCapability {
    const fn classic() -> Self {
        Self {
            supports_fd: false,
            supports_classic: true,
            supports_resistor: false,
            is_network_device: false,
            transport: Transport::None,
        }
    }

    const fn fd() -> Self {
        Self {
            supports_fd: true,
            ..Self::classic()
        }
    }

    const fn with_resistor(mut self) -> Self {
        self.supports_resistor = true;
        self
    }

    const fn over(mut self, transport: Transport) -> Self {
        self.is_network_device = true;
        self.transport = transport;
        self
    }
}

/// (device type, catalogue name, capability)
const DEVICE_TABLE: &[(u32, &str, DeviceCapability)] = &[
    (PCI5121, "PCI-5121", DeviceCapability::classic()),
    (PCI9810, "PCI-9810", DeviceCapability::classic()),
    (PCI9820, "PCI-9820", DeviceCapability::classic()),
    (PCI9840, "PCI-9840", DeviceCapability::classic()),
    (USBCAN1, "USBCAN-I", DeviceCapability::classic()),
    (USBCAN2, "USBCAN-II", DeviceCapability::classic()),
    (USBCAN_E_U, "USBCAN-E-U", DeviceCapability::classic()),
    (USBCAN_2E_U, "USBCAN-2E-U", DeviceCapability::classic()),
    (USBCAN_4E_U, "USBCAN-4E-U", DeviceCapability::classic()),
    (USBCAN_8E_U, "USBCAN-8E-U", DeviceCapability::classic()),
    (PCIE_CANFD_100U, "PCIE-CANFD-100U", DeviceCapability::fd()),
    (PCIE_CANFD_200U, "PCIE-CANFD-200U", DeviceCapability::fd()),
    (PCIE_CANFD_400U, "PCIE-CANFD-400U", DeviceCapability::fd()),
    (USBCANFD_200U, "USBCANFD-200U", DeviceCapability::fd().with_resistor()),
    (USBCANFD_100U, "USBCANFD-100U", DeviceCapability::fd().with_resistor()),
    (USBCANFD_MINI, "USBCANFD-MINI", DeviceCapability::fd().with_resistor()),
    (CANETUDP, "CANET-UDP", DeviceCapability::classic().over(Transport::Udp)),
    (CANETTCP, "CANET-TCP", DeviceCapability::classic().over(Transport::Tcp)),
    (WIFICAN_TCP, "WIFICAN-TCP", DeviceCapability::classic().over(Transport::Tcp)),
    (WIFICAN_UDP, "WIFICAN-UDP", DeviceCapability::classic().over(Transport::Udp)),
    (CANFDNET_TCP, "CANFDNET-TCP", DeviceCapability::fd().over(Transport::Tcp)),
    (CANFDNET_UDP, "CANFDNET-UDP", DeviceCapability::fd().over(Transport::Udp)),
    (CANFDWIFI_TCP, "CANFDWIFI-TCP", DeviceCapability::fd().over(Transport::Tcp)),
    (CANFDWIFI_UDP, "CANFDWIFI-UDP", DeviceCapability::fd().over(Transport::Udp)),
    (CANFDNET_400U_TCP, "CANFDNET-400U-TCP", DeviceCapability::fd().over(Transport::Tcp)),
    (CANFDNET_400U_UDP, "CANFDNET-400U-UDP", DeviceCapability::fd().over(Transport::Udp)),
    (VIRTUAL_DEVICE, "VIRTUAL", DeviceCapability::fd()),
];

/// Look up the capability record for a device type.
/// Unknown device types get the all-disabled default: configuration then
/// skips every gated step and the channel comes up in classic mode.
pub fn lookup(device_type: u32) -> DeviceCapability {
    DEVICE_TABLE
        .iter()
        .find(|(ty, _, _)| *ty == device_type)
        .map(|(_, _, cap)| *cap)
        .unwrap_or_default()
}

/// Catalogue name of a device type, for log lines
pub fn device_name(device_type: u32) -> Option<&'static str> {
    DEVICE_TABLE
        .iter()
        .find(|(ty, _, _)| *ty == device_type)
        .map(|(_, name, _)| *name)
}

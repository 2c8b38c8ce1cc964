// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build-time beacon configuration.

use crate::board::AdvertisingOptions;
use crate::sampler::Capabilities;
use crate::scheduler::Mode;

/// Wire format advertised by the beacon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// Manufacturer-specific sensor frame.
    VendorFrame,
    /// Static Eddystone-UID identity frame.
    EddystoneUid,
    /// Eddystone-TLM telemetry frame.
    EddystoneTlm,
}

impl Variant {
    pub const fn mode(self) -> Mode {
        match self {
            Variant::EddystoneUid => Mode::Direct,
            Variant::VendorFrame | Variant::EddystoneTlm => Mode::SplitCycle,
        }
    }

    /// Capabilities whose readings end up in this variant's frame.
    pub const fn sampled_capabilities(self) -> Capabilities {
        match self {
            Variant::VendorFrame => Capabilities::all(),
            Variant::EddystoneUid => Capabilities::empty(),
            Variant::EddystoneTlm => Capabilities::BATTERY.union(Capabilities::TEMPERATURE),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeaconConfig {
    pub variant: Variant,
    pub advertising: AdvertisingOptions,
    pub led_blink_ms: u32,
    /// Cycles between two sensor reads; `1` samples on every cycle.
    pub sensor_update_interval: u32,
    /// Capabilities compiled in. Also reported as the active-peripherals
    /// byte of the vendor frame.
    pub capabilities: Capabilities,
    pub namespace_id: [u8; 10],
    pub instance_id: [u8; 6],
    pub tx_power: i8,
}

impl BeaconConfig {
    pub const fn vendor_frame() -> Self {
        Self {
            variant: Variant::VendorFrame,
            advertising: AdvertisingOptions {
                interval_ms: consts::VENDOR_ADVERTISING_INTERVAL_MS,
                show_device_name: true,
            },
            sensor_update_interval: 1,
            ..Self::common()
        }
    }

    pub const fn eddystone_uid() -> Self {
        Self {
            variant: Variant::EddystoneUid,
            advertising: AdvertisingOptions {
                interval_ms: consts::EDDYSTONE_UID_ADVERTISING_INTERVAL_MS,
                show_device_name: false,
            },
            ..Self::common()
        }
    }

    pub const fn eddystone_tlm() -> Self {
        Self {
            variant: Variant::EddystoneTlm,
            advertising: AdvertisingOptions {
                interval_ms: consts::EDDYSTONE_TLM_ADVERTISING_INTERVAL_MS,
                show_device_name: false,
            },
            sensor_update_interval: consts::SENSOR_UPDATE_INTERVAL,
            ..Self::common()
        }
    }

    const fn common() -> Self {
        Self {
            variant: Variant::VendorFrame,
            advertising: AdvertisingOptions {
                interval_ms: consts::VENDOR_ADVERTISING_INTERVAL_MS,
                show_device_name: false,
            },
            led_blink_ms: consts::LED_BLINK_MS,
            sensor_update_interval: 1,
            capabilities: Capabilities::from_build(),
            namespace_id: consts::NAMESPACE_ID,
            instance_id: consts::INSTANCE_ID,
            tx_power: consts::CALIBRATED_TX_POWER,
        }
    }

    /// Capabilities the sampler actually reads for this variant.
    pub fn sampled_capabilities(&self) -> Capabilities {
        self.capabilities & self.variant.sampled_capabilities()
    }
}

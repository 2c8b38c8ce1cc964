// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Advertising frame layouts.
//!
//! Every frame starts from a constant header and only the payload offsets
//! listed in the per-variant offset modules are written afterwards.

use crate::config::{BeaconConfig, Variant};
use crate::sampler::{
    encode_battery, encode_battery_millivolts, encode_cap_sense, encode_light, encode_magnetometer,
    encode_temperature, encode_tlm_temperature, Capabilities, SensorReading, UNKNOWN_TLM_TEMPERATURE,
};
use crate::scheduler::Counters;

/// AD flags structure: LE general discoverable, BR/EDR not supported.
const FLAGS: [u8; 3] = [0x02, 0x01, 0x06];

const MANUFACTURER_SPECIFIC_DATA: u8 = 0xff;
const COMPLETE_16BIT_SERVICE_UUIDS: u8 = 0x03;
const SERVICE_DATA_16BIT_UUID: u8 = 0x16;
const EDDYSTONE_UUID: [u8; 2] = [0xaa, 0xfe];

pub const VENDOR_FRAME_LEN: usize = 20;
pub const EDDYSTONE_UID_FRAME_LEN: usize = 31;
pub const EDDYSTONE_TLM_FRAME_LEN: usize = 25;

const VENDOR_FRAME_TYPE: u8 = 0x02;
/// Bytes from the active-peripherals byte to the end of the frame.
const VENDOR_PAYLOAD_LEN: u8 = 0x0b;

const EDDYSTONE_UID_FRAME_TYPE: u8 = 0x00;
const EDDYSTONE_TLM_FRAME_TYPE: u8 = 0x20;
const EDDYSTONE_TLM_VERSION: u8 = 0x00;

/// Byte offsets of the vendor sensor frame.
pub mod vendor {
    /// Payload length in bits 0-4, cyclic count in bits 5-7.
    pub const COUNT_LENGTH: usize = 8;
    pub const PERIPHERALS: usize = 9;
    pub const BATTERY: usize = 10;
    pub const TEMPERATURE: usize = 11;
    pub const LIGHT: usize = 12;
    pub const CAP_SENSE: usize = 13;
    pub const MAGNETOMETER: usize = 14;
    pub const CYCLIC_COUNT_SHIFT: u8 = 5;
}

/// Byte offsets shared by the Eddystone frames.
pub mod eddystone {
    pub const SERVICE_DATA_LENGTH: usize = 7;
    pub const FRAME_TYPE: usize = 11;

    pub const UID_TX_POWER: usize = 12;
    pub const UID_NAMESPACE: usize = 13;
    pub const UID_INSTANCE: usize = 23;

    pub const TLM_VERSION: usize = 12;
    pub const TLM_BATTERY: usize = 13;
    pub const TLM_TEMPERATURE: usize = 15;
    pub const TLM_ADVERTISING_COUNT: usize = 17;
    pub const TLM_UPTIME: usize = 21;
}

const VENDOR_HEADER: [u8; vendor::PERIPHERALS] = {
    let [company_lsb, company_msb] = consts::COMPANY_CODE.to_le_bytes();
    [
        FLAGS[0],
        FLAGS[1],
        FLAGS[2],
        (VENDOR_FRAME_LEN - 4) as u8,
        MANUFACTURER_SPECIFIC_DATA,
        company_lsb,
        company_msb,
        VENDOR_FRAME_TYPE,
        VENDOR_PAYLOAD_LEN,
    ]
};

const fn eddystone_header(frame_len: usize, frame_type: u8) -> [u8; eddystone::FRAME_TYPE + 1] {
    [
        FLAGS[0],
        FLAGS[1],
        FLAGS[2],
        0x03,
        COMPLETE_16BIT_SERVICE_UUIDS,
        EDDYSTONE_UUID[0],
        EDDYSTONE_UUID[1],
        (frame_len - eddystone::SERVICE_DATA_LENGTH - 1) as u8,
        SERVICE_DATA_16BIT_UUID,
        EDDYSTONE_UUID[0],
        EDDYSTONE_UUID[1],
        frame_type,
    ]
}

/// A complete advertising payload. The length is fixed by the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingFrame {
    Vendor([u8; VENDOR_FRAME_LEN]),
    EddystoneUid([u8; EDDYSTONE_UID_FRAME_LEN]),
    EddystoneTlm([u8; EDDYSTONE_TLM_FRAME_LEN]),
}

impl AdvertisingFrame {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AdvertisingFrame::Vendor(bytes) => bytes,
            AdvertisingFrame::EddystoneUid(bytes) => bytes,
            AdvertisingFrame::EddystoneTlm(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Packs readings and counters into the configured variant's frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameEncoder {
    variant: Variant,
    peripherals: Capabilities,
    namespace_id: [u8; 10],
    instance_id: [u8; 6],
    tx_power: i8,
}

impl FrameEncoder {
    pub fn new(config: &BeaconConfig) -> Self {
        Self {
            variant: config.variant,
            peripherals: config.capabilities,
            namespace_id: config.namespace_id,
            instance_id: config.instance_id,
            tx_power: config.tx_power,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn encode(&self, reading: &SensorReading, counters: &Counters) -> AdvertisingFrame {
        match self.variant {
            Variant::VendorFrame => AdvertisingFrame::Vendor(self.vendor_frame(reading, counters)),
            Variant::EddystoneUid => AdvertisingFrame::EddystoneUid(self.uid_frame()),
            Variant::EddystoneTlm => AdvertisingFrame::EddystoneTlm(self.tlm_frame(reading, counters)),
        }
    }

    fn vendor_frame(&self, reading: &SensorReading, counters: &Counters) -> [u8; VENDOR_FRAME_LEN] {
        let mut frame = [0u8; VENDOR_FRAME_LEN];
        frame[..vendor::PERIPHERALS].copy_from_slice(&VENDOR_HEADER);

        frame[vendor::PERIPHERALS] = self.peripherals.bits();
        frame[vendor::BATTERY] = reading.battery_voltage.map_or(0, encode_battery);
        frame[vendor::TEMPERATURE] = reading.temperature.map_or(0, encode_temperature);
        frame[vendor::LIGHT] = reading.light.map_or(0, encode_light);
        frame[vendor::CAP_SENSE] = reading.cap_sense.map_or(0, encode_cap_sense);
        if let Some(mag) = reading.magnetometer {
            frame[vendor::MAGNETOMETER..].copy_from_slice(&encode_magnetometer(mag));
        }

        frame[vendor::COUNT_LENGTH] |= counters.cyclic().get() << vendor::CYCLIC_COUNT_SHIFT;
        frame
    }

    fn uid_frame(&self) -> [u8; EDDYSTONE_UID_FRAME_LEN] {
        let mut frame = [0u8; EDDYSTONE_UID_FRAME_LEN];
        frame[..=eddystone::FRAME_TYPE]
            .copy_from_slice(&eddystone_header(EDDYSTONE_UID_FRAME_LEN, EDDYSTONE_UID_FRAME_TYPE));

        frame[eddystone::UID_TX_POWER] = self.tx_power as u8;
        frame[eddystone::UID_NAMESPACE..eddystone::UID_INSTANCE].copy_from_slice(&self.namespace_id);
        frame[eddystone::UID_INSTANCE..eddystone::UID_INSTANCE + 6].copy_from_slice(&self.instance_id);
        // Last two bytes are reserved and stay zero.
        frame
    }

    fn tlm_frame(&self, reading: &SensorReading, counters: &Counters) -> [u8; EDDYSTONE_TLM_FRAME_LEN] {
        let mut frame = [0u8; EDDYSTONE_TLM_FRAME_LEN];
        frame[..=eddystone::FRAME_TYPE]
            .copy_from_slice(&eddystone_header(EDDYSTONE_TLM_FRAME_LEN, EDDYSTONE_TLM_FRAME_TYPE));
        frame[eddystone::TLM_VERSION] = EDDYSTONE_TLM_VERSION;

        let millivolts = reading.battery_voltage.map_or(0, encode_battery_millivolts);
        let temperature = reading.temperature.map_or(UNKNOWN_TLM_TEMPERATURE, encode_tlm_temperature);

        frame[eddystone::TLM_BATTERY..eddystone::TLM_TEMPERATURE].copy_from_slice(&millivolts.to_be_bytes());
        frame[eddystone::TLM_TEMPERATURE..eddystone::TLM_ADVERTISING_COUNT].copy_from_slice(&temperature);
        frame[eddystone::TLM_ADVERTISING_COUNT..eddystone::TLM_UPTIME]
            .copy_from_slice(&counters.advertising_count().to_be_bytes());
        frame[eddystone::TLM_UPTIME..].copy_from_slice(&counters.uptime_tenths().to_be_bytes());
        frame
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]

/// Full device name, sent in the scan response when a variant asks for it.
pub const DEVICE_NAME: &str = "Sensor Beacon";

/// Advertising interval of the vendor sensor frame variant, in milliseconds.
pub const VENDOR_ADVERTISING_INTERVAL_MS: u32 = 500;

/// Advertising interval of the Eddystone-UID variant, in milliseconds.
/// The UID payload is static, so the radio repeats it on its own at this rate.
pub const EDDYSTONE_UID_ADVERTISING_INTERVAL_MS: u32 = 100;

/// Advertising interval of the Eddystone-TLM variant, in milliseconds.
pub const EDDYSTONE_TLM_ADVERTISING_INTERVAL_MS: u32 = 1000;

/// How long the sleep/wake LED stays lit before the power transition completes.
/// Button presses during this window are ignored.
pub const LED_BLINK_MS: u32 = 200;

/// Number of advertising cycles between two battery/temperature reads on the
/// Eddystone-TLM variant. At 1000 ms per cycle this is once a minute.
pub const SENSOR_UPDATE_INTERVAL: u32 = 60;

/// Debounce window applied to the rising edge of the button.
pub const BUTTON_DEBOUNCE_MS: u32 = 50;

/// Bluetooth SIG company identifier carried in the vendor sensor frame.
pub const COMPANY_CODE: u16 = 0x0583;

/// Eddystone-UID 10-byte namespace.
pub const NAMESPACE_ID: [u8; 10] = [0xc0, 0xde, 0xb1, 0x0e, 0x1d, 0xd1, 0xe0, 0x1b, 0xed, 0x0c];

/// Eddystone-UID 6-byte instance.
pub const INSTANCE_ID: [u8; 6] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x01];

/// Calibrated Tx power at 0 m, in dBm, reported in the Eddystone-UID frame.
pub const CALIBRATED_TX_POWER: i8 = 0;

/// Battery voltage sampling is compiled in.
pub const ENABLE_BATTERY_VOLTAGE: bool = cfg!(feature = "battery");
/// Die temperature sampling is compiled in.
pub const ENABLE_TEMPERATURE: bool = cfg!(feature = "temperature");
/// Light sensor sampling is compiled in.
pub const ENABLE_LIGHT_SENSOR: bool = cfg!(feature = "light");
/// Capacitive sense sampling is compiled in.
pub const ENABLE_CAP_SENSE: bool = cfg!(feature = "cap-sense");
/// Magnetometer sampling is compiled in.
pub const ENABLE_MAGNETOMETER: bool = cfg!(feature = "magnetometer");
/// NFC is advertised as an active peripheral. It has no reading of its own.
pub const ENABLE_NFC: bool = cfg!(feature = "nfc");

/// Base address for the application in flash memory, right after the S112
/// SoftDevice.
pub const BASE_APP_ADDR: u32 = 0x19000;

/// Total flash of the nRF52832.
pub const FLASH_SIZE: u32 = 512 * 1024;

/// Total RAM of the nRF52832.
pub const RAM_SIZE: u32 = 64 * 1024;

/// RAM reserved at the start of the RAM region for the SoftDevice.
/// S112 with one advertising set and no connections fits in 8K.
pub const SOFTDEVICE_RAM_RESERVED: u32 = 0x2000;

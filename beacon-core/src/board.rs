// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Capabilities the beacon needs from the board.
//!
//! Reads are async because the on-chip converters and buses are. Radio and LED
//! calls only hand work off and never block.

/// Raw magnetometer output, one signed 16-bit value per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagReading {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Onboard sensors. Each read returns a physical value or the platform
/// default; failures are never reported to the caller.
#[allow(async_fn_in_trait)]
pub trait Sensors {
    /// Supply voltage in volts.
    async fn battery_voltage(&mut self) -> f32;
    /// Temperature in degrees Celsius.
    async fn temperature(&mut self) -> f32;
    /// Ambient light, normalized to `0.0..=1.0`.
    async fn light(&mut self) -> f32;
    /// Raw capacitive sense level, `0..=MAX_CAP_SENSE`.
    async fn cap_sense(&mut self) -> u32;
    async fn magnetometer(&mut self) -> MagReading;
}

/// How the radio should advertise a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingOptions {
    pub interval_ms: u32,
    /// Answer scan requests with the full device name.
    pub show_device_name: bool,
}

pub trait Radio {
    /// Replaces the advertised payload. The radio keeps repeating it at
    /// `options.interval_ms` until the next call or until [`Radio::sleep`].
    fn set_advertising(&mut self, payload: &[u8], options: AdvertisingOptions);
    fn sleep(&mut self);
    fn wake(&mut self);
}

/// Feedback LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    /// Lit while going to sleep.
    Red,
    /// Lit while waking up.
    Green,
}

pub trait Leds {
    fn set_led(&mut self, led: Led, on: bool);
}

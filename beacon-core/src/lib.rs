// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hardware-independent core of the sensor beacon.
//!
//! Sensors are sampled into a [`SensorReading`], packed into an
//! [`AdvertisingFrame`] by the [`FrameEncoder`] and pushed to the radio by the
//! [`AdvertiseScheduler`]. The [`PowerStateMachine`] owns the scheduler and
//! toggles the beacon between advertising and sleeping on button presses.
//! The hardware is reached only through the traits in [`board`]; button
//! presses arrive through the [`ButtonPresses`] latch.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod button;
pub mod config;
pub mod frame;
pub mod power;
pub mod sampler;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use board::{AdvertisingOptions, Led, Leds, MagReading, Radio, Sensors};
pub use button::ButtonPresses;
pub use config::{BeaconConfig, Variant};
pub use frame::{AdvertisingFrame, FrameEncoder};
pub use power::{Event, PowerState, PowerStateMachine, Response, Wakeup};
pub use sampler::{Capabilities, SensorReading, SensorSampler};
pub use scheduler::{AdvertiseScheduler, Counters, CyclicCount, Mode, TickOutcome};

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recording stand-in for the board.

use crate::board::{AdvertisingOptions, Led, Leds, MagReading, Radio, Sensors};

pub struct MockBoard {
    pub battery_voltage: f32,
    pub temperature: f32,
    pub light: f32,
    pub cap_sense: u32,
    pub magnetometer: MagReading,

    pub battery_reads: usize,
    pub temperature_reads: usize,
    pub light_reads: usize,
    pub cap_sense_reads: usize,
    pub magnetometer_reads: usize,

    pub transmitted: Vec<(Vec<u8>, AdvertisingOptions)>,
    pub radio_awake: bool,
    pub leds: Vec<(Led, bool)>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            battery_voltage: 3.0,
            temperature: 20.0,
            light: 0.5,
            cap_sense: 131_072,
            magnetometer: MagReading { x: 100, y: -50, z: 0 },
            battery_reads: 0,
            temperature_reads: 0,
            light_reads: 0,
            cap_sense_reads: 0,
            magnetometer_reads: 0,
            transmitted: Vec::new(),
            radio_awake: true,
            leds: Vec::new(),
        }
    }
}

impl Sensors for MockBoard {
    async fn battery_voltage(&mut self) -> f32 {
        self.battery_reads += 1;
        self.battery_voltage
    }

    async fn temperature(&mut self) -> f32 {
        self.temperature_reads += 1;
        self.temperature
    }

    async fn light(&mut self) -> f32 {
        self.light_reads += 1;
        self.light
    }

    async fn cap_sense(&mut self) -> u32 {
        self.cap_sense_reads += 1;
        self.cap_sense
    }

    async fn magnetometer(&mut self) -> MagReading {
        self.magnetometer_reads += 1;
        self.magnetometer
    }
}

impl Radio for MockBoard {
    fn set_advertising(&mut self, payload: &[u8], options: AdvertisingOptions) {
        assert!(self.radio_awake, "advertising update while the radio sleeps");
        self.transmitted.push((payload.to_vec(), options));
    }

    fn sleep(&mut self) {
        self.radio_awake = false;
    }

    fn wake(&mut self) {
        self.radio_awake = true;
    }
}

impl Leds for MockBoard {
    fn set_led(&mut self, led: Led, on: bool) {
        self.leds.push((led, on));
    }
}

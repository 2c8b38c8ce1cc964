// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sensors, LEDs and radio of the beacon board behind the `beacon-core`
//! capability traits.

use crate::radio::SdRadio;
use beacon_core::sampler::count_charge_time;
use beacon_core::{AdvertisingOptions, Led, Leds, MagReading, Radio, Sensors};
use defmt::{debug, warn};
use embassy_nrf::gpio::{Input, Output};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::saadc::Saadc;
use embassy_nrf::twim::Twim;
use embassy_time::{Duration, Instant, Timer};
use fixed::types::I30F2;
use nrf_softdevice::Softdevice;

/// SAADC full scale with the default 1/6 gain and 0.6 V internal reference.
const SAADC_FULL_SCALE_VOLTS: f32 = 3.6;
/// 12-bit conversion.
const SAADC_COUNTS: f32 = 4096.0;

/// Longest the cap-sense measurement may block the executor.
const CAP_SENSE_BUDGET: Duration = Duration::from_micros(500);

const MAG3110_ADDRESS: u8 = 0x0e;
const MAG3110_OUT_X_MSB: u8 = 0x01;
const MAG3110_CTRL_REG1: u8 = 0x10;
const MAG3110_CTRL_REG2: u8 = 0x11;
/// Active mode, 80 Hz output rate.
const MAG3110_ACTIVE: u8 = 0x01;
/// Reset the sensor before each measurement.
const MAG3110_AUTO_MRST: u8 = 0x80;

pub struct Board<'d> {
    sd: &'static Softdevice,
    /// Channel 0 is VDD, channel 1 the light sensor.
    saadc: Saadc<'d, 2>,
    twim: Twim<'d, TWISPI0>,
    cap_tx: Output<'d>,
    cap_rx: Input<'d>,
    red: Output<'d>,
    green: Output<'d>,
    radio: SdRadio,
}

impl<'d> Board<'d> {
    pub fn new(
        sd: &'static Softdevice,
        saadc: Saadc<'d, 2>,
        twim: Twim<'d, TWISPI0>,
        cap_tx: Output<'d>,
        cap_rx: Input<'d>,
        red: Output<'d>,
        green: Output<'d>,
    ) -> Self {
        Self {
            sd,
            saadc,
            twim,
            cap_tx,
            cap_rx,
            red,
            green,
            radio: SdRadio,
        }
    }

    /// Puts the magnetometer in continuous mode. A failure is logged and
    /// every later read returns zeroes.
    pub async fn init_magnetometer(&mut self) {
        for (register, value) in [(MAG3110_CTRL_REG2, MAG3110_AUTO_MRST), (MAG3110_CTRL_REG1, MAG3110_ACTIVE)] {
            let command = [register, value];
            if let Err(e) = self.twim.write(MAG3110_ADDRESS, &command).await {
                warn!("magnetometer setup failed: {:?}", e);
                return;
            }
        }
        debug!("magnetometer active");
    }

    async fn sample_saadc(&mut self) -> [i16; 2] {
        let mut buf = [0i16; 2];
        self.saadc.sample(&mut buf).await;
        buf
    }
}

fn saadc_fraction(raw: i16) -> f32 {
    // Single-ended inputs can read slightly negative around ground.
    (raw.max(0) as f32 / SAADC_COUNTS).min(1.0)
}

impl Sensors for Board<'_> {
    async fn battery_voltage(&mut self) -> f32 {
        let [vdd, _] = self.sample_saadc().await;
        saadc_fraction(vdd) * SAADC_FULL_SCALE_VOLTS
    }

    async fn temperature(&mut self) -> f32 {
        match nrf_softdevice::temperature_celsius(self.sd) {
            // Die temperature in 0.25 °C steps.
            Ok(celsius) => I30F2::to_num::<f32>(celsius),
            Err(e) => {
                warn!("temperature read failed: {:?}", e);
                0.0
            }
        }
    }

    async fn light(&mut self) -> f32 {
        let [_, light] = self.sample_saadc().await;
        saadc_fraction(light)
    }

    /// Times how long the electrode takes to charge through the series
    /// resistor. A touch adds capacitance and stretches the count.
    async fn cap_sense(&mut self) -> u32 {
        self.cap_tx.set_low();
        Timer::after_micros(100).await;

        self.cap_tx.set_high();
        let deadline = Instant::now() + CAP_SENSE_BUDGET;
        let count = count_charge_time(|| self.cap_rx.is_high(), || Instant::now() >= deadline);
        self.cap_tx.set_low();

        count
    }

    async fn magnetometer(&mut self) -> MagReading {
        let register = [MAG3110_OUT_X_MSB];
        let mut raw = [0u8; 6];
        match self.twim.write_read(MAG3110_ADDRESS, &register, &mut raw).await {
            Ok(()) => MagReading {
                x: i16::from_be_bytes([raw[0], raw[1]]),
                y: i16::from_be_bytes([raw[2], raw[3]]),
                z: i16::from_be_bytes([raw[4], raw[5]]),
            },
            Err(e) => {
                warn!("magnetometer read failed: {:?}", e);
                MagReading::default()
            }
        }
    }
}

impl Leds for Board<'_> {
    fn set_led(&mut self, led: Led, on: bool) {
        let pin = match led {
            Led::Red => &mut self.red,
            Led::Green => &mut self.green,
        };
        if on {
            pin.set_high();
        } else {
            pin.set_low();
        }
    }
}

impl Radio for Board<'_> {
    fn set_advertising(&mut self, payload: &[u8], options: AdvertisingOptions) {
        self.radio.set_advertising(payload, options);
    }

    fn sleep(&mut self) {
        self.radio.sleep();
    }

    fn wake(&mut self) {
        self.radio.wake();
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sensor sampling and the per-field byte encodings.

use crate::board::{MagReading, Sensors};

/// Lowest battery voltage the one-byte scale can express.
pub const MIN_BATTERY_VOLTAGE: f32 = 2.0;
/// Highest battery voltage the one-byte scale can express.
pub const MAX_BATTERY_VOLTAGE: f32 = 3.6;

pub const MIN_TEMPERATURE: f32 = -40.0;
pub const MAX_TEMPERATURE: f32 = 85.0;
const TEMPERATURE_DEGREES_PER_UNIT: f32 = 0.5;
/// Encoded value of [`MAX_TEMPERATURE`].
pub const MAX_TEMPERATURE_BYTE: u8 = 0xfa;

/// Saturation point of the raw capacitive sense level.
pub const MAX_CAP_SENSE: u32 = 262_144;

/// Eddystone-TLM temperature when the sensor is not sampled (-128 °C).
pub const UNKNOWN_TLM_TEMPERATURE: [u8; 2] = [0x80, 0x00];

bitflags::bitflags! {
    /// Onboard capabilities. The bit values double as the active-peripherals
    /// byte of the vendor sensor frame.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const BATTERY = 0x01;
        const TEMPERATURE = 0x02;
        const LIGHT = 0x04;
        const CAP_SENSE = 0x08;
        const MAGNETOMETER = 0x10;
        const NFC = 0x20;
    }
}

impl Capabilities {
    /// Capabilities compiled into this build through the `consts` features.
    pub const fn from_build() -> Self {
        let mut bits = 0;
        if consts::ENABLE_BATTERY_VOLTAGE {
            bits |= Self::BATTERY.bits();
        }
        if consts::ENABLE_TEMPERATURE {
            bits |= Self::TEMPERATURE.bits();
        }
        if consts::ENABLE_LIGHT_SENSOR {
            bits |= Self::LIGHT.bits();
        }
        if consts::ENABLE_CAP_SENSE {
            bits |= Self::CAP_SENSE.bits();
        }
        if consts::ENABLE_MAGNETOMETER {
            bits |= Self::MAGNETOMETER.bits();
        }
        if consts::ENABLE_NFC {
            bits |= Self::NFC.bits();
        }
        Self::from_bits_retain(bits)
    }
}

/// One sampling pass. A field is `None` when its capability was not read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub battery_voltage: Option<f32>,
    pub temperature: Option<f32>,
    pub light: Option<f32>,
    pub cap_sense: Option<u32>,
    pub magnetometer: Option<MagReading>,
}

/// Reads the selected capabilities from the board.
#[derive(Clone, Copy, Debug)]
pub struct SensorSampler {
    capabilities: Capabilities,
}

impl SensorSampler {
    pub const fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub async fn sample<S: Sensors>(&self, sensors: &mut S) -> SensorReading {
        let mut reading = SensorReading::default();

        if self.capabilities.contains(Capabilities::BATTERY) {
            reading.battery_voltage = Some(sensors.battery_voltage().await);
        }
        if self.capabilities.contains(Capabilities::TEMPERATURE) {
            reading.temperature = Some(sensors.temperature().await);
        }
        if self.capabilities.contains(Capabilities::LIGHT) {
            reading.light = Some(sensors.light().await);
        }
        if self.capabilities.contains(Capabilities::CAP_SENSE) {
            reading.cap_sense = Some(sensors.cap_sense().await);
        }
        if self.capabilities.contains(Capabilities::MAGNETOMETER) {
            reading.magnetometer = Some(sensors.magnetometer().await);
        }

        reading
    }
}

// Ties round up, matching the receivers' reference decoder.
fn round_half_up(value: f32) -> f32 {
    libm::floorf(value + 0.5)
}

/// Battery voltage on a linear 0..=255 scale between
/// [`MIN_BATTERY_VOLTAGE`] and [`MAX_BATTERY_VOLTAGE`].
pub fn encode_battery(volts: f32) -> u8 {
    if volts.is_nan() || volts <= MIN_BATTERY_VOLTAGE {
        return 0x00;
    }
    if volts >= MAX_BATTERY_VOLTAGE {
        return 0xff;
    }

    round_half_up(255.0 * (volts - MIN_BATTERY_VOLTAGE) / (MAX_BATTERY_VOLTAGE - MIN_BATTERY_VOLTAGE)) as u8
}

/// Temperature in 0.5 °C steps above [`MIN_TEMPERATURE`].
pub fn encode_temperature(celsius: f32) -> u8 {
    if celsius.is_nan() || celsius <= MIN_TEMPERATURE {
        return 0x00;
    }
    if celsius >= MAX_TEMPERATURE {
        return MAX_TEMPERATURE_BYTE;
    }

    round_half_up((celsius - MIN_TEMPERATURE) / TEMPERATURE_DEGREES_PER_UNIT) as u8
}

pub fn encode_light(level: f32) -> u8 {
    // The cast saturates, NaN becomes 0.
    round_half_up(255.0 * level) as u8
}

/// Counts polls of `charged` until the electrode reads charged. Stops at
/// [`MAX_CAP_SENSE`], or with that saturated level as soon as `expired`
/// reports the time budget spent, so a floating electrode cannot hold the
/// caller for long.
pub fn count_charge_time(mut charged: impl FnMut() -> bool, mut expired: impl FnMut() -> bool) -> u32 {
    let mut count = 0;
    while !charged() {
        if count >= MAX_CAP_SENSE || expired() {
            return MAX_CAP_SENSE;
        }
        count += 1;
    }
    count
}

pub fn encode_cap_sense(raw: u32) -> u8 {
    if raw >= MAX_CAP_SENSE {
        return 0xff;
    }

    round_half_up(255.0 * raw as f32 / MAX_CAP_SENSE as f32) as u8
}

/// X, Y and Z, each big-endian.
pub fn encode_magnetometer(mag: MagReading) -> [u8; 6] {
    let [x0, x1] = mag.x.to_be_bytes();
    let [y0, y1] = mag.y.to_be_bytes();
    let [z0, z1] = mag.z.to_be_bytes();
    [x0, x1, y0, y1, z0, z1]
}

/// Battery voltage as whole millivolts for Eddystone-TLM.
pub fn encode_battery_millivolts(volts: f32) -> u16 {
    round_half_up(volts * 1000.0) as u16
}

/// Eddystone-TLM 8.8 temperature.
///
/// Only whole degrees are sent and the fraction byte is always zero. A
/// sub-zero value is not sign-extended into the fraction, it is just the low
/// byte of the rounded degrees; deployed decoders expect exactly this.
pub fn encode_tlm_temperature(celsius: f32) -> [u8; 2] {
    let whole = round_half_up(celsius) as i32;
    [whole as u8, 0x00]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBoard;
    use futures::executor::block_on;

    #[test]
    fn battery_saturates_and_is_monotonic() {
        assert_eq!(encode_battery(0.0), 0);
        assert_eq!(encode_battery(2.0), 0);
        assert_eq!(encode_battery(3.6), 255);
        assert_eq!(encode_battery(4.2), 255);
        assert_eq!(encode_battery(f32::NAN), 0);
        assert_eq!(encode_battery(3.0), 159);

        let mut previous = 0;
        for step in 0..=200 {
            let encoded = encode_battery(1.9 + step as f32 * 0.01);
            assert!(encoded >= previous, "dropped at step {step}");
            previous = encoded;
        }
    }

    #[test]
    fn temperature_scale() {
        assert_eq!(encode_temperature(-41.0), 0);
        assert_eq!(encode_temperature(-40.0), 0);
        assert_eq!(encode_temperature(85.0), 0xfa);
        assert_eq!(encode_temperature(120.0), 0xfa);
        assert_eq!(encode_temperature(20.0), 120);
        assert_eq!(encode_temperature(-39.5), 1);
        assert_eq!(encode_temperature(0.25), 81);
    }

    #[test]
    fn light_and_cap_sense() {
        assert_eq!(encode_light(0.0), 0);
        assert_eq!(encode_light(0.5), 128);
        assert_eq!(encode_light(1.0), 255);

        assert_eq!(encode_cap_sense(0), 0);
        assert_eq!(encode_cap_sense(131_072), 128);
        assert_eq!(encode_cap_sense(MAX_CAP_SENSE), 255);
        assert_eq!(encode_cap_sense(u32::MAX), 255);
    }

    #[test]
    fn charge_time_counts_polls_until_charged() {
        let mut polls = 0;
        let count = count_charge_time(
            || {
                polls += 1;
                polls > 5
            },
            || false,
        );
        assert_eq!(count, 5);

        assert_eq!(count_charge_time(|| true, || false), 0);
        assert_eq!(count_charge_time(|| false, || false), MAX_CAP_SENSE);
    }

    #[test]
    fn charge_time_gives_up_when_the_budget_is_spent() {
        let mut polls = 0;
        let mut budget_checks = 0;
        let count = count_charge_time(
            || {
                polls += 1;
                false
            },
            || {
                budget_checks += 1;
                budget_checks > 10
            },
        );

        assert_eq!(count, MAX_CAP_SENSE);
        assert_eq!(encode_cap_sense(count), 0xff);
        assert_eq!(budget_checks, 11);
        assert_eq!(polls, 11);
    }

    #[test]
    fn magnetometer_is_big_endian_twos_complement() {
        let bytes = encode_magnetometer(MagReading { x: 100, y: -50, z: 0 });
        assert_eq!(bytes, [0x00, 0x64, 0xff, 0xce, 0x00, 0x00]);

        let bytes = encode_magnetometer(MagReading { x: i16::MIN, y: i16::MAX, z: -1 });
        assert_eq!(bytes, [0x80, 0x00, 0x7f, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn telemetry_encodings() {
        assert_eq!(encode_battery_millivolts(3.0), 3000);
        assert_eq!(encode_battery_millivolts(2.9876), 2988);
        assert_eq!(encode_battery_millivolts(-1.0), 0);
        assert_eq!(encode_tlm_temperature(21.6), [22, 0]);
        assert_eq!(encode_tlm_temperature(-5.0), [0xfb, 0]);
    }

    #[test]
    fn disabled_capabilities_are_not_read() {
        let mut board = MockBoard::new();
        let sampler = SensorSampler::new(Capabilities::BATTERY | Capabilities::MAGNETOMETER);

        let reading = block_on(sampler.sample(&mut board));

        assert_eq!(reading.battery_voltage, Some(3.0));
        assert_eq!(reading.temperature, None);
        assert_eq!(reading.light, None);
        assert_eq!(reading.cap_sense, None);
        assert_eq!(reading.magnetometer, Some(MagReading { x: 100, y: -50, z: 0 }));
        assert_eq!(board.temperature_reads, 0);
        assert_eq!(board.light_reads, 0);
        assert_eq!(board.cap_sense_reads, 0);
        assert_eq!(board.battery_reads, 1);
        assert_eq!(board.magnetometer_reads, 1);
    }

    #[test]
    fn nfc_flag_has_no_reading() {
        let mut board = MockBoard::new();
        let reading = block_on(SensorSampler::new(Capabilities::NFC).sample(&mut board));

        assert_eq!(reading, SensorReading::default());
    }

    #[test]
    fn default_build_enables_every_sensor_but_nfc() {
        let capabilities = Capabilities::from_build();

        assert_eq!(capabilities.bits(), 0x1f);
        assert!(!capabilities.contains(Capabilities::NFC));
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Advertising cycle scheduling.
//!
//! In split-cycle mode the tick timer runs at half the advertising interval.
//! A tick either builds the next frame (sample + encode) or pushes the frame
//! built by the previous tick, so slow sensor reads never land on the same
//! tick as the radio update.

use crate::board::{AdvertisingOptions, Radio, Sensors};
use crate::config::BeaconConfig;
use crate::frame::{AdvertisingFrame, FrameEncoder};
use crate::sampler::{SensorReading, SensorSampler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Frame built and pushed once on start; the radio repeats it.
    Direct,
    /// Build and push on alternating half-interval ticks.
    SplitCycle,
}

/// 3-bit counter embedded in the vendor frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CyclicCount(u8);

impl CyclicCount {
    const MASK: u8 = 0x07;

    pub fn get(self) -> u8 {
        self.0
    }

    fn advance(&mut self) {
        self.0 = (self.0 + 1) & Self::MASK;
    }
}

/// Per-wake counters. Dropped with the scheduler when the beacon sleeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    pub(crate) cyclic: CyclicCount,
    pub(crate) advertising_count: u32,
    pub(crate) uptime_ms: u64,
}

impl Counters {
    pub fn cyclic(&self) -> CyclicCount {
        self.cyclic
    }

    pub fn advertising_count(&self) -> u32 {
        self.advertising_count
    }

    pub fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    /// Uptime in 0.1 s units, wrapped to 32 bits.
    pub fn uptime_tenths(&self) -> u32 {
        ((self.uptime_ms + 50) / 100) as u32
    }

    /// Uptime is counted in whole advertising intervals, not read from a clock.
    pub(crate) fn complete_cycle(&mut self, interval_ms: u32) {
        self.cyclic.advance();
        self.advertising_count = self.advertising_count.wrapping_add(1);
        self.uptime_ms = self.uptime_ms.wrapping_add(u64::from(interval_ms));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// A new frame was built and is waiting for the next tick.
    Encoded,
    /// The waiting frame was handed to the radio.
    Transmitted,
    /// Nothing to do in this mode.
    Idle,
}

pub struct AdvertiseScheduler {
    mode: Mode,
    sampler: SensorSampler,
    encoder: FrameEncoder,
    options: AdvertisingOptions,
    sensor_update_interval: u32,
    counters: Counters,
    reading: SensorReading,
    pending: Option<AdvertisingFrame>,
}

impl AdvertiseScheduler {
    /// Fresh scheduler with zeroed counters and nothing pending.
    pub fn new(config: &BeaconConfig) -> Self {
        Self {
            mode: config.variant.mode(),
            sampler: SensorSampler::new(config.sampled_capabilities()),
            encoder: FrameEncoder::new(config),
            options: config.advertising,
            sensor_update_interval: config.sensor_update_interval.max(1),
            counters: Counters::default(),
            reading: SensorReading::default(),
            pending: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Tick period, or `None` when the scheduler needs no timer.
    pub fn tick_interval_ms(&self) -> Option<u32> {
        match self.mode {
            Mode::Direct => None,
            Mode::SplitCycle => Some(self.options.interval_ms / 2),
        }
    }

    /// Called once per wake. Direct mode pushes its only frame here.
    pub fn start<R: Radio>(&mut self, radio: &mut R) {
        if self.mode == Mode::Direct {
            let frame = self.encoder.encode(&self.reading, &self.counters);
            radio.set_advertising(frame.as_bytes(), self.options);
        }
    }

    pub async fn tick<B: Sensors + Radio>(&mut self, board: &mut B) -> TickOutcome {
        if self.mode == Mode::Direct {
            return TickOutcome::Idle;
        }

        match self.pending.take() {
            Some(frame) => {
                board.set_advertising(frame.as_bytes(), self.options);
                TickOutcome::Transmitted
            }
            None => {
                let frame = self.build_next(board).await;
                self.pending = Some(frame);
                TickOutcome::Encoded
            }
        }
    }

    async fn build_next<S: Sensors>(&mut self, sensors: &mut S) -> AdvertisingFrame {
        // Checked before the count advances, so the first cycle after a wake
        // always samples.
        if self.counters.advertising_count % self.sensor_update_interval == 0 {
            self.reading = self.sampler.sample(sensors).await;
        }
        self.counters.complete_cycle(self.options.interval_ms);
        self.encoder.encode(&self.reading, &self.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{eddystone, vendor};
    use crate::testing::MockBoard;
    use futures::executor::block_on;

    fn run_ticks(scheduler: &mut AdvertiseScheduler, board: &mut MockBoard, ticks: usize) -> Vec<TickOutcome> {
        (0..ticks).map(|_| block_on(scheduler.tick(board))).collect()
    }

    #[test]
    fn cyclic_count_wraps_after_eight_cycles() {
        let mut count = CyclicCount::default();
        for _ in 0..7 {
            count.advance();
        }
        assert_eq!(count.get(), 7);
        count.advance();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn split_cycle_alternates_encode_and_transmit() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::vendor_frame());
        scheduler.start(&mut board);
        assert!(board.transmitted.is_empty());

        let outcomes = run_ticks(&mut scheduler, &mut board, 6);

        assert_eq!(
            outcomes,
            [
                TickOutcome::Encoded,
                TickOutcome::Transmitted,
                TickOutcome::Encoded,
                TickOutcome::Transmitted,
                TickOutcome::Encoded,
                TickOutcome::Transmitted,
            ]
        );
        assert_eq!(board.transmitted.len(), 3);
        assert_eq!(scheduler.counters().advertising_count(), 3);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn every_encode_is_transmitted_exactly_once() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::vendor_frame());

        for ticks in 1..40 {
            run_ticks(&mut scheduler, &mut board, 1);
            let encodes = scheduler.counters().advertising_count() as usize;
            let transmits = board.transmitted.len();
            // At most the one frame built on the last tick is still waiting.
            assert_eq!(encodes - transmits, usize::from(scheduler.is_pending()), "after {ticks} ticks");
        }

        // Each pushed frame carries the next cyclic count, so none was dropped
        // or sent twice.
        let counts: Vec<u8> = board
            .transmitted
            .iter()
            .map(|(bytes, _)| bytes[vendor::COUNT_LENGTH] >> vendor::CYCLIC_COUNT_SHIFT)
            .collect();
        let expected: Vec<u8> = (1..=counts.len()).map(|n| (n % 8) as u8).collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn vendor_frame_samples_every_cycle() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::vendor_frame());

        run_ticks(&mut scheduler, &mut board, 8);

        assert_eq!(board.battery_reads, 4);
        assert_eq!(board.cap_sense_reads, 4);
        assert_eq!(board.magnetometer_reads, 4);
    }

    #[test]
    fn telemetry_resamples_on_update_interval() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::eddystone_tlm());

        run_ticks(&mut scheduler, &mut board, 2);
        assert_eq!(board.battery_reads, 1);
        assert_eq!(board.temperature_reads, 1);

        board.battery_voltage = 2.5;
        run_ticks(&mut scheduler, &mut board, 2 * 59);
        assert_eq!(board.battery_reads, 1);
        let (last, _) = board.transmitted.last().expect("a frame was pushed");
        assert_eq!(&last[eddystone::TLM_BATTERY..eddystone::TLM_TEMPERATURE], &3000u16.to_be_bytes());

        run_ticks(&mut scheduler, &mut board, 2);
        assert_eq!(board.battery_reads, 2);
        let (last, _) = board.transmitted.last().expect("a frame was pushed");
        assert_eq!(&last[eddystone::TLM_BATTERY..eddystone::TLM_TEMPERATURE], &2500u16.to_be_bytes());

        // Light and friends are never read for telemetry.
        assert_eq!(board.light_reads, 0);
        assert_eq!(board.cap_sense_reads, 0);
        assert_eq!(board.magnetometer_reads, 0);
    }

    #[test]
    fn telemetry_counts_advance_on_every_cycle() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::eddystone_tlm());

        run_ticks(&mut scheduler, &mut board, 10);

        assert_eq!(scheduler.counters().advertising_count(), 5);
        assert_eq!(scheduler.counters().uptime_ms(), 5000);
        let (last, options) = board.transmitted.last().expect("a frame was pushed");
        assert_eq!(&last[eddystone::TLM_ADVERTISING_COUNT..eddystone::TLM_UPTIME], &[0, 0, 0, 5]);
        assert_eq!(&last[eddystone::TLM_UPTIME..], &[0, 0, 0, 50]);
        assert_eq!(options.interval_ms, 1000);
        assert!(!options.show_device_name);
    }

    #[test]
    fn direct_mode_pushes_once_on_start() {
        let mut board = MockBoard::new();
        let mut scheduler = AdvertiseScheduler::new(&BeaconConfig::eddystone_uid());

        assert_eq!(scheduler.tick_interval_ms(), None);
        scheduler.start(&mut board);
        assert_eq!(run_ticks(&mut scheduler, &mut board, 3), [TickOutcome::Idle; 3]);

        assert_eq!(board.transmitted.len(), 1);
        assert_eq!(board.transmitted[0].0.len(), 31);
        assert_eq!(board.transmitted[0].1.interval_ms, 100);
        assert_eq!(board.battery_reads, 0);
    }

    #[test]
    fn tick_runs_at_half_the_advertising_interval() {
        assert_eq!(AdvertiseScheduler::new(&BeaconConfig::vendor_frame()).tick_interval_ms(), Some(250));
        assert_eq!(AdvertiseScheduler::new(&BeaconConfig::eddystone_tlm()).tick_interval_ms(), Some(500));
    }
}

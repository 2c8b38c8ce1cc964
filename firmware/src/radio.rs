// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! SoftDevice setup and the advertising task.
//!
//! The beacon loop never touches the SoftDevice directly. It queues
//! [`RadioCommand`]s and [`radio_task`] restarts the advertiser whenever the
//! payload changes, so the radio only ever sees complete frames.

use beacon_core::{AdvertisingOptions, Radio};
use consts::DEVICE_NAME;
use core::mem;
use defmt::{debug, error, info, warn};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use futures::future::{select, Either};
use futures::pin_mut;
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{ExtendedAdvertisementBuilder, ExtendedAdvertisementPayload};
use nrf_softdevice::ble::peripheral;
use nrf_softdevice::{raw, Softdevice};

/// Legacy advertising data limit.
pub const MAX_ADV_LEN: usize = 31;

const RADIO_QUEUE_LEN: usize = 4;

// Advertising intervals are set in units of 0.625 ms
macro_rules! adv_interval_ms {
    ($a:expr) => {{
        let units = $a * 8 / 5;
        debug!("adv interval units: {}", units);
        units
    }};
}

#[derive(defmt::Format)]
pub enum RadioCommand {
    Advertise {
        payload: Vec<u8, MAX_ADV_LEN>,
        options: AdvertisingOptions,
    },
    Sleep,
    Wake,
}

static RADIO_COMMANDS: Channel<ThreadModeRawMutex, RadioCommand, RADIO_QUEUE_LEN> = Channel::new();

static SCAN_DATA: ExtendedAdvertisementPayload = ExtendedAdvertisementBuilder::new().full_name(DEVICE_NAME).build();

pub fn initialize_sd() -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),
        ..Default::default()
    };

    Softdevice::enable(&config)
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    info!("SD is running");
    sd.run().await
}

#[embassy_executor::task]
pub async fn radio_task(sd: &'static Softdevice) -> ! {
    let mut current: Option<(Vec<u8, MAX_ADV_LEN>, AdvertisingOptions)> = None;
    let mut asleep = false;

    loop {
        let command = match (&current, asleep) {
            (Some((payload, options)), false) => {
                let config = peripheral::Config {
                    interval: adv_interval_ms!(options.interval_ms),
                    ..Default::default()
                };
                let adv = if options.show_device_name {
                    peripheral::NonconnectableAdvertisement::ScannableUndirected {
                        adv_data: payload,
                        scan_data: &SCAN_DATA,
                    }
                } else {
                    peripheral::NonconnectableAdvertisement::NonscannableUndirected { adv_data: payload }
                };

                let adv_fut = peripheral::advertise(sd, adv, &config);
                let command_fut = RADIO_COMMANDS.receive();
                pin_mut!(adv_fut);
                pin_mut!(command_fut);

                // Advertising has no timeout, it only ends on error or when a
                // new command cancels it.
                match select(adv_fut, command_fut).await {
                    Either::Left((result, command_fut)) => {
                        if let Err(e) = result {
                            error!("advertise error {:?}", e);
                        }
                        command_fut.await
                    }
                    Either::Right((command, _)) => command,
                }
            }
            _ => RADIO_COMMANDS.receive().await,
        };

        match command {
            RadioCommand::Advertise { payload, options } => {
                debug!("new payload: {=[u8]:x}", &payload[..]);
                current = Some((payload, options));
            }
            RadioCommand::Sleep => {
                info!("radio asleep");
                asleep = true;
            }
            RadioCommand::Wake => {
                info!("radio awake");
                asleep = false;
            }
        }
    }
}

fn send(command: RadioCommand) {
    if RADIO_COMMANDS.try_send(command).is_err() {
        warn!("radio queue full, command dropped");
    }
}

/// [`Radio`] backed by [`radio_task`].
pub struct SdRadio;

impl Radio for SdRadio {
    fn set_advertising(&mut self, payload: &[u8], options: AdvertisingOptions) {
        match Vec::from_slice(payload) {
            Ok(payload) => send(RadioCommand::Advertise { payload, options }),
            Err(()) => error!("payload of {} bytes exceeds a legacy advertisement", payload.len()),
        }
    }

    fn sleep(&mut self) {
        send(RadioCommand::Sleep);
    }

    fn wake(&mut self) {
        send(RadioCommand::Wake);
    }
}

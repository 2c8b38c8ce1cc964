// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

#![no_std]
#![no_main]

mod board;
mod button;
mod radio;

#[cfg(feature = "debug")]
use defmt_rtt as _;
// global logger
use embassy_nrf as _;
// time driver
use panic_probe as _;

use beacon_core::{BeaconConfig, Event, PowerStateMachine, Response, Wakeup};
use board::Board;
use button::{button_task, Button, BUTTON_PRESSES};
use consts::BUTTON_DEBOUNCE_MS;
use defmt::{debug, info, *};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::saadc::{self, ChannelConfig, Saadc, VddInput};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Duration, Ticker, Timer};
use futures::future::{select, Either};
use futures::pin_mut;
use radio::{initialize_sd, radio_task, softdevice_task};

#[cfg(not(any(feature = "vendor-frame", feature = "eddystone-uid", feature = "eddystone-tlm")))]
compile_error!("enable one of the `vendor-frame`, `eddystone-uid` or `eddystone-tlm` features");

#[cfg(any(
    all(feature = "vendor-frame", feature = "eddystone-uid"),
    all(feature = "vendor-frame", feature = "eddystone-tlm"),
    all(feature = "eddystone-uid", feature = "eddystone-tlm"),
))]
compile_error!("only one beacon variant can be enabled, build with `--no-default-features`");

#[cfg(feature = "vendor-frame")]
const CONFIG: BeaconConfig = BeaconConfig::vendor_frame();
#[cfg(feature = "eddystone-uid")]
const CONFIG: BeaconConfig = BeaconConfig::eddystone_uid();
#[cfg(feature = "eddystone-tlm")]
const CONFIG: BeaconConfig = BeaconConfig::eddystone_tlm();

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

#[cfg(not(feature = "debug"))]
mod dummy_logging {
    #[defmt::global_logger]
    struct Logger;

    unsafe impl defmt::Logger for Logger {
        fn acquire() {}

        unsafe fn flush() {}

        unsafe fn release() {}

        unsafe fn write(_bytes: &[u8]) {}
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut conf = embassy_nrf::config::Config::default();
    // Priorities 0, 1 and 4 belong to the SoftDevice
    conf.gpiote_interrupt_priority = interrupt::Priority::P2;
    conf.time_interrupt_priority = interrupt::Priority::P2;

    let p = embassy_nrf::init(conf);

    interrupt::SAADC.set_priority(interrupt::Priority::P3);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(interrupt::Priority::P3);

    let sd = initialize_sd();
    unwrap!(spawner.spawn(softdevice_task(sd)), "Spawning the softdevice failed");
    unwrap!(spawner.spawn(radio_task(sd)), "Spawning the radio failed");

    let mut saadc = Saadc::new(
        p.SAADC,
        Irqs,
        saadc::Config::default(),
        [ChannelConfig::single_ended(VddInput), ChannelConfig::single_ended(p.P0_30)],
    );
    saadc.calibrate().await;

    // The magnetometer is powered from a GPIO; keep it driven for the whole run.
    let _mag_power = Output::new(p.P0_18, Level::High, OutputDrive::HighDrive);
    let twim = twim::Twim::new(p.TWISPI0, Irqs, p.P0_20, p.P0_19, twim::Config::default());

    let mut board = Board::new(
        sd,
        saadc,
        twim,
        Output::new(p.P0_12, Level::Low, OutputDrive::Standard),
        Input::new(p.P0_11, Pull::None),
        Output::new(p.P0_05, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_04, Level::Low, OutputDrive::Standard),
    );
    board.init_magnetometer().await;

    let button = Button::new(
        Input::new(p.P0_00, Pull::None),
        Duration::from_millis(BUTTON_DEBOUNCE_MS.into()),
    );
    unwrap!(spawner.spawn(button_task(button)), "Spawning the button watcher failed");

    let mut machine = PowerStateMachine::new(CONFIG);
    info!(
        "Beacon {:?}, advertising every {} ms, peripherals {=u8:#x}",
        CONFIG.variant,
        CONFIG.advertising.interval_ms,
        CONFIG.capabilities.bits()
    );
    machine.start(&mut board);

    // Only exists while the machine asks for ticks, so a sleeping beacon
    // has no timer and every wake starts a fresh one.
    let mut ticker: Option<Ticker> = None;

    loop {
        let event = match machine.next_wakeup() {
            Wakeup::TickOrButton { interval_ms } => {
                let timer = ticker.get_or_insert_with(|| Ticker::every(Duration::from_millis(interval_ms.into())));
                let tick_fut = timer.next();
                let press_fut = BUTTON_PRESSES.next();
                pin_mut!(tick_fut);
                pin_mut!(press_fut);

                match select(tick_fut, press_fut).await {
                    Either::Left(_) => Event::Tick,
                    Either::Right(_) => Event::Button,
                }
            }
            Wakeup::Button => {
                ticker = None;
                BUTTON_PRESSES.next().await;
                Event::Button
            }
            Wakeup::BlinkElapsed { after_ms } => {
                ticker = None;
                Timer::after_millis(after_ms.into()).await;
                // Presses during the blink do not count.
                BUTTON_PRESSES.discard();
                Event::BlinkElapsed
            }
        };

        match machine.handle(event, &mut board).await {
            Response::Tick(outcome) => debug!("tick: {:?}", outcome),
            Response::Blinking { target } => info!("Button pressed, going {:?}", target),
            Response::Entered(state) => info!("Beacon {:?}", state),
            Response::Ignored => debug!("{:?} ignored", event),
        }
    }
}

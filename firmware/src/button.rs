// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

use beacon_core::ButtonPresses;
use defmt::debug;
use embassy_nrf::gpio::Input;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::{Duration, Timer};

/// Debounced presses, latched until the event loop takes them.
pub static BUTTON_PRESSES: ButtonPresses<ThreadModeRawMutex> = ButtonPresses::new();

/// Active-high push button with a debounced rising edge.
pub struct Button<'d> {
    pin: Input<'d>,
    debounce: Duration,
}

impl<'d> Button<'d> {
    pub fn new(pin: Input<'d>, debounce: Duration) -> Self {
        Self { pin, debounce }
    }

    /// Resolves on a rising edge that is still high once the debounce window
    /// has passed.
    pub async fn rising_edge(&mut self) {
        loop {
            self.pin.wait_for_rising_edge().await;
            Timer::after(self.debounce).await;
            if self.pin.is_high() {
                return;
            }
        }
    }
}

/// Watches the button for the whole run so no edge is missed while the
/// event loop is busy elsewhere.
#[embassy_executor::task]
pub async fn button_task(mut button: Button<'static>) -> ! {
    loop {
        button.rising_edge().await;
        debug!("button pressed");
        BUTTON_PRESSES.press();
    }
}

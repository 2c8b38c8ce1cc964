// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Button-driven sleep/wake control.
//!
//! The machine owns the [`AdvertiseScheduler`] while the beacon is active and
//! drops it on the way to sleep, taking the counters with it. The event loop
//! asks [`PowerStateMachine::next_wakeup`] what to wait for, waits, and feeds
//! the resulting [`Event`] back in.

use crate::board::{Led, Leds, Radio, Sensors};
use crate::config::BeaconConfig;
use crate::scheduler::{AdvertiseScheduler, TickOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    Active,
    Sleeping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The scheduler tick timer expired.
    Tick,
    /// Debounced rising edge of the button.
    Button,
    /// The sleep/wake LED has been lit for the blink duration.
    BlinkElapsed,
}

/// What the event loop has to wait for before the next [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wakeup {
    /// Periodic tick or the button, whichever comes first.
    TickOrButton { interval_ms: u32 },
    /// Only the button; no timer is running.
    Button,
    /// A one-shot delay. The button is not watched meanwhile.
    BlinkElapsed { after_ms: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Tick(TickOutcome),
    /// A transition started; it completes on [`Event::BlinkElapsed`].
    Blinking { target: PowerState },
    Entered(PowerState),
    Ignored,
}

pub struct PowerStateMachine {
    config: BeaconConfig,
    state: PowerState,
    blinking: Option<PowerState>,
    scheduler: Option<AdvertiseScheduler>,
}

impl PowerStateMachine {
    pub fn new(config: BeaconConfig) -> Self {
        Self {
            config,
            state: PowerState::Active,
            blinking: None,
            scheduler: None,
        }
    }

    /// Startup sequence: fresh counters and a new scheduler. Run once on boot
    /// and again on every wake.
    pub fn start<R: Radio>(&mut self, radio: &mut R) {
        let mut scheduler = AdvertiseScheduler::new(&self.config);
        scheduler.start(radio);
        self.scheduler = Some(scheduler);
        self.state = PowerState::Active;
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_transitioning(&self) -> bool {
        self.blinking.is_some()
    }

    /// The running scheduler, `None` while asleep or going to sleep.
    pub fn scheduler(&self) -> Option<&AdvertiseScheduler> {
        self.scheduler.as_ref()
    }

    pub fn next_wakeup(&self) -> Wakeup {
        if self.blinking.is_some() {
            return Wakeup::BlinkElapsed {
                after_ms: self.config.led_blink_ms,
            };
        }

        match self.scheduler.as_ref().and_then(AdvertiseScheduler::tick_interval_ms) {
            Some(interval_ms) => Wakeup::TickOrButton { interval_ms },
            None => Wakeup::Button,
        }
    }

    pub async fn handle<B>(&mut self, event: Event, board: &mut B) -> Response
    where
        B: Sensors + Radio + Leds,
    {
        match (event, self.blinking) {
            (Event::BlinkElapsed, Some(target)) => {
                self.finish_transition(target, board);
                Response::Entered(target)
            }
            // The blink window is not interruptible.
            (_, Some(_)) => Response::Ignored,
            (Event::Button, None) => {
                let target = self.begin_transition(board);
                Response::Blinking { target }
            }
            (Event::Tick, None) => match self.scheduler.as_mut() {
                Some(scheduler) => Response::Tick(scheduler.tick(board).await),
                None => Response::Ignored,
            },
            (Event::BlinkElapsed, None) => Response::Ignored,
        }
    }

    fn begin_transition<L: Leds>(&mut self, leds: &mut L) -> PowerState {
        let target = match self.state {
            PowerState::Active => {
                // Stops the ticks before the LED goes on.
                self.scheduler = None;
                leds.set_led(Led::Red, true);
                PowerState::Sleeping
            }
            PowerState::Sleeping => {
                leds.set_led(Led::Green, true);
                PowerState::Active
            }
        };
        self.blinking = Some(target);
        target
    }

    fn finish_transition<B: Radio + Leds>(&mut self, target: PowerState, board: &mut B) {
        self.blinking = None;
        match target {
            PowerState::Sleeping => {
                board.set_led(Led::Red, false);
                self.state = PowerState::Sleeping;
                board.sleep();
            }
            PowerState::Active => {
                board.set_led(Led::Green, false);
                board.wake();
                self.start(board);
            }
        }
    }
}

// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Latch between the button watcher and the event loop.
//!
//! The watcher posts every debounced press with [`ButtonPresses::press`].
//! The press stays latched until the loop takes it with
//! [`ButtonPresses::next`], so the loop may drop a pending wait (a tick won
//! the race) or be busy with sensor reads without losing the press.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Presses posted before the loop takes one collapse into a single press.
pub struct ButtonPresses<M: RawMutex> {
    signal: Signal<M, ()>,
}

impl<M: RawMutex> ButtonPresses<M> {
    pub const fn new() -> Self {
        Self { signal: Signal::new() }
    }

    pub fn press(&self) {
        self.signal.signal(());
    }

    /// Resolves once a press is latched and clears it. Dropping the future
    /// before it resolves leaves the latch untouched.
    pub async fn next(&self) {
        self.signal.wait().await
    }

    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }

    /// Drops a press latched while the loop was not listening for the button.
    pub fn discard(&self) {
        self.signal.reset();
    }
}

impl<M: RawMutex> Default for ButtonPresses<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use futures::executor::block_on;
    use futures::future::{self, select, Either};
    use futures::{pin_mut, FutureExt};

    #[test]
    fn press_before_wait_is_delivered() {
        let presses = ButtonPresses::<NoopRawMutex>::new();
        assert!(presses.next().now_or_never().is_none());

        presses.press();

        assert!(presses.is_pending());
        assert!(presses.next().now_or_never().is_some());
        assert!(!presses.is_pending());
    }

    #[test]
    fn press_survives_losing_the_race_to_a_tick() {
        let presses = ButtonPresses::<NoopRawMutex>::new();
        presses.press();

        let tick_fut = future::ready(());
        let press_fut = presses.next();
        pin_mut!(tick_fut);
        pin_mut!(press_fut);
        let tick_won = matches!(block_on(select(tick_fut, press_fut)), Either::Left(_));

        assert!(tick_won);
        assert!(presses.is_pending());
        block_on(presses.next());
        assert!(!presses.is_pending());
    }

    #[test]
    fn press_arriving_while_loop_is_busy_is_kept() {
        let presses = ButtonPresses::<NoopRawMutex>::new();

        // A wait that was polled and then abandoned, as when the loop goes
        // off to sample sensors.
        {
            let wait = presses.next();
            pin_mut!(wait);
            assert!(wait.as_mut().now_or_never().is_none());
        }
        presses.press();

        assert!(presses.next().now_or_never().is_some());
    }

    #[test]
    fn repeated_presses_collapse_into_one() {
        let presses = ButtonPresses::<NoopRawMutex>::new();
        presses.press();
        presses.press();

        assert!(presses.next().now_or_never().is_some());
        assert!(presses.next().now_or_never().is_none());
    }

    #[test]
    fn discard_drops_the_latched_press() {
        let presses = ButtonPresses::<NoopRawMutex>::new();
        presses.press();

        presses.discard();

        assert!(!presses.is_pending());
        assert!(presses.next().now_or_never().is_none());
    }
}

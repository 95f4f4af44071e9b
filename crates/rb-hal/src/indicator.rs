// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! LED status indicator on a GPIO pin

use crate::traits::{DelayInterface, GpioPin, StatusIndicator};

/// Pin level that lights the LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// LED lights when the pin is driven high
    ActiveHigh,
    /// LED lights when the pin is driven low (ESP-12 style modules)
    ActiveLow,
}

/// Status indicator driving one LED through a GPIO pin
///
/// GPIO failures are swallowed: the indicator is observational and the
/// engine must not change behaviour because an LED did not light.
pub struct LedIndicator<P, D> {
    pin: P,
    delay: D,
    polarity: Polarity,
}

impl<P: GpioPin, D: DelayInterface> LedIndicator<P, D> {
    /// Create an indicator; call `init` before use
    pub fn new(pin: P, delay: D, polarity: Polarity) -> Self {
        Self { pin, delay, polarity }
    }

    /// Release the pin and delay provider
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn drive(&mut self, lit: bool) {
        let high = match self.polarity {
            Polarity::ActiveHigh => lit,
            Polarity::ActiveLow => !lit,
        };
        let _ = if high { self.pin.set_high() } else { self.pin.set_low() };
    }
}

impl<P: GpioPin, D: DelayInterface> StatusIndicator for LedIndicator<P, D> {
    fn init(&mut self) {
        let _ = self.pin.set_output();
        self.drive(false);
    }

    fn on(&mut self) {
        self.drive(true);
    }

    fn off(&mut self) {
        self.drive(false);
    }

    fn blink(&mut self, count: u8, delay_ms: u32) {
        for i in 0..count {
            self.on();
            self.delay.delay_ms(delay_ms);
            self.off();
            if i + 1 < count {
                self.delay.delay_ms(delay_ms);
            }
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hardware Abstraction Layer for the rb bootloader engine
//!
//! The update engine consumes four capabilities and nothing else:
//!
//! - **Flash**: sector erase, program and read on the boot NOR device
//! - **Scratch memory**: a few words that survive a warm reboot
//! - **Status indicator**: on/off/blink feedback
//! - **Reboot**: an unconditional, non-returning restart
//!
//! Raw device drivers live with the board support code and implement the
//! traits in `traits`. `LedIndicator` builds a status indicator from a GPIO
//! pin and a delay provider. The `sim` feature provides host doubles.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod traits;
pub mod error;
pub mod indicator;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export main traits
pub use traits::*;
pub use error::{HalError, HalResult};
pub use indicator::{LedIndicator, Polarity};

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! rb bootloader early boot library
//!
//! The boot-time half of the update engine:
//!
//! - **Preflight**: indicator setup, pending factory reset, flash size
//!   detection and boot configuration repair, ahead of the image locator
//!
//! Image selection and the jump into the selected image belong to the
//! platform entry code.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(test)]
extern crate std;

pub mod preflight;

pub use preflight::{boot_flash_size, Preflight, PreflightReport};

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Update engine for the rb multi-slot bootloader
//!
//! Provides the pieces application firmware and the early boot path share:
//!
//! - **OTA sessions**: stream a new image into a slot, verify it, select it
//! - **Sector writer**: buffered programming with lazy once-per-sector erase
//! - **Boot configuration**: the slot table and boot selection in sector 1
//! - **Image verification**: structural ROM header check before commit
//! - **Factory reset**: scratch-memory request flag and defaults restore
//!
//! All hardware access goes through the `rb-hal` capability traits.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(test)]
extern crate std;

pub mod boot_config;
pub mod factory_reset;
pub mod session;
pub mod verify;
pub mod writer;

pub use boot_config::{BootConfig, BootConfigStore, BootMode, ConfigError, ConfigRepair};
pub use factory_reset::FactoryResetController;
pub use session::{OtaError, OtaHandle, OtaState, OtaStatus, Updater};
pub use verify::{ImageVerifier, RomHeader, SpiMode, VerifyError};
pub use writer::SectorWriter;

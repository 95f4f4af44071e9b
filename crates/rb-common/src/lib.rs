// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! rb bootloader common library
//!
//! Error definitions, on-flash layout constants, engine configuration and
//! the diagnostic log ring shared by every crate of the update engine.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting of errors for embedded debugging
//!
//! No heap allocations are performed - all buffers use fixed-size arrays or
//! heapless collections.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod errors;
pub mod config;
pub mod log;
pub mod constants;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use config::EngineConfig;
pub use log::{LogBuffer, LogLevel};

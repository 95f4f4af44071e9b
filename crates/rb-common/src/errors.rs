// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for the rb bootloader engine
//!
//! This module defines the unified error type used throughout the engine.
//! Errors are plain result codes: nothing above this layer unwinds, so every
//! caller inspects the returned value. No variant carries heap data.

use core::fmt;

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the bootloader engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Update Errors (0x01xx)
    // =========================================================================
    /// Bad slot index, empty input, or operation illegal in the current state
    InvalidArgs,
    /// Scratch buffer unavailable or unusable
    NoMemory,
    /// An update session is already active
    UpdateInProgress,
    /// Flash erase failed while writing an image
    EraseFailed,
    /// Flash program failed while writing an image
    WriteFailed,
    /// Image header check failed or could not be read
    VerifyFailed,

    // =========================================================================
    // Boot Configuration Errors (0x02xx)
    // =========================================================================
    /// Configuration sector could not be read
    ConfigReadFailed,
    /// Configuration sector could not be erased or programmed
    ConfigWriteFailed,
    /// Stored configuration has bad magic, version or checksum
    ConfigCorrupted,
    /// Configuration record violates a layout invariant
    InvalidBootConfig,
    /// Slot index is outside the configured slot table
    InvalidSlot,

    // =========================================================================
    // HAL Errors (0x03xx)
    // =========================================================================
    /// Flash operation failed
    FlashError,
    /// Persistent scratch memory access failed
    ScratchMemoryError,
    /// GPIO error
    GpioError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Update session errors
    /// - 0x02xx: Boot configuration errors
    /// - 0x03xx: HAL errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidArgs => 0x0101,
            Self::NoMemory => 0x0102,
            Self::UpdateInProgress => 0x0103,
            Self::EraseFailed => 0x0104,
            Self::WriteFailed => 0x0105,
            Self::VerifyFailed => 0x0106,

            Self::ConfigReadFailed => 0x0201,
            Self::ConfigWriteFailed => 0x0202,
            Self::ConfigCorrupted => 0x0203,
            Self::InvalidBootConfig => 0x0204,
            Self::InvalidSlot => 0x0205,

            Self::FlashError => 0x0301,
            Self::ScratchMemoryError => 0x0302,
            Self::GpioError => 0x0303,
        }
    }

    /// Check if the error leaves flash in a state the caller must clean up
    ///
    /// An update session that hit one of these is unusable and has to be
    /// cancelled; a config error of this kind may have left the config sector
    /// blank.
    #[must_use]
    pub const fn is_flash_fault(&self) -> bool {
        matches!(
            self,
            Self::EraseFailed | Self::WriteFailed | Self::ConfigWriteFailed | Self::FlashError
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidArgs => "invalid arguments",
            Self::NoMemory => "no scratch memory",
            Self::UpdateInProgress => "update in progress",
            Self::EraseFailed => "flash erase failed",
            Self::WriteFailed => "flash write failed",
            Self::VerifyFailed => "image verification failed",
            Self::ConfigReadFailed => "boot config read failed",
            Self::ConfigWriteFailed => "boot config write failed",
            Self::ConfigCorrupted => "boot config corrupted",
            Self::InvalidBootConfig => "invalid boot config",
            Self::InvalidSlot => "invalid slot",
            Self::FlashError => "flash error",
            Self::ScratchMemoryError => "scratch memory error",
            Self::GpioError => "GPIO error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

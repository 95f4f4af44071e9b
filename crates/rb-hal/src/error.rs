// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL error types

use core::fmt;

/// HAL error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// Flash read failed
    FlashReadFailed,
    /// Flash erase failed
    FlashEraseFailed,
    /// Flash write failed
    FlashWriteFailed,
    /// Flash address or sector index out of bounds
    FlashOutOfBounds,
    /// Scratch memory access outside the reserved region
    ScratchOutOfBounds,
    /// Scratch memory access not word aligned
    ScratchMisaligned,
    /// GPIO error
    GpioError,
}

impl HalError {
    /// Get error code
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::FlashReadFailed => 0x0311,
            Self::FlashEraseFailed => 0x0312,
            Self::FlashWriteFailed => 0x0313,
            Self::FlashOutOfBounds => 0x0314,
            Self::ScratchOutOfBounds => 0x0321,
            Self::ScratchMisaligned => 0x0322,
            Self::GpioError => 0x0331,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::FlashReadFailed => "flash read failed",
            Self::FlashEraseFailed => "flash erase failed",
            Self::FlashWriteFailed => "flash write failed",
            Self::FlashOutOfBounds => "flash address out of bounds",
            Self::ScratchOutOfBounds => "scratch memory out of bounds",
            Self::ScratchMisaligned => "scratch memory access misaligned",
            Self::GpioError => "GPIO error",
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for HalError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

impl From<HalError> for rb_common::Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::FlashEraseFailed => Self::EraseFailed,
            HalError::FlashWriteFailed => Self::WriteFailed,
            HalError::FlashReadFailed | HalError::FlashOutOfBounds => Self::FlashError,
            HalError::ScratchOutOfBounds | HalError::ScratchMisaligned => {
                Self::ScratchMemoryError
            }
            HalError::GpioError => Self::GpioError,
        }
    }
}

/// HAL Result type
pub type HalResult<T> = Result<T, HalError>;

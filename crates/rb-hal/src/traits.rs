// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL trait definitions
//!
//! The update engine never touches hardware directly. Every device it needs
//! is one of these narrow capabilities, injected at construction, so host
//! tests can substitute the doubles from the `sim` module.

use crate::error::HalResult;
use rb_common::constants::SECTOR_SIZE;

/// NOR flash device
///
/// All calls are synchronous and blocking. While one is outstanding no other
/// flash access may happen, so callers treat them as fully serialising.
pub trait FlashInterface {
    /// Total flash size in bytes
    fn capacity(&self) -> u32;

    /// Read data from flash
    ///
    /// # Arguments
    /// * `address` - Absolute flash address
    /// * `buffer` - Buffer to read into
    fn read(&self, address: u32, buffer: &mut [u8]) -> HalResult<()>;

    /// Program data into flash
    ///
    /// # Arguments
    /// * `address` - Absolute flash address
    /// * `data` - Data to program
    ///
    /// # Notes
    /// Programming can only clear bits; the sector must be erased first.
    fn write(&mut self, address: u32, data: &[u8]) -> HalResult<()>;

    /// Erase one sector, setting every byte to `0xFF`
    ///
    /// # Arguments
    /// * `index` - Sector index (`address / SECTOR_SIZE`)
    fn erase_sector(&mut self, index: u32) -> HalResult<()>;

    /// Number of sectors on the device
    fn sector_count(&self) -> u32 {
        self.capacity() / SECTOR_SIZE
    }

    /// Read the identity word used for the coarse flash size probe
    ///
    /// The default reads the little-endian word at offset 0. Drivers with a
    /// JEDEC ID command may override it.
    fn identity(&self) -> HalResult<u32> {
        let mut word = [0u8; 4];
        self.read(0, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }
}

/// Persistent scratch memory
///
/// A small region (RTC memory on most parts) that survives a warm reboot
/// but not power loss. Offsets and lengths are word aligned.
pub trait ScratchMemoryInterface {
    /// Read `buffer.len()` bytes starting at `offset`
    fn read(&self, offset: u32, buffer: &mut [u8]) -> HalResult<()>;

    /// Write `data` starting at `offset`
    fn write(&mut self, offset: u32, data: &[u8]) -> HalResult<()>;

    /// Read one little-endian word
    fn read_word(&self, offset: u32) -> HalResult<u32> {
        let mut word = [0u8; 4];
        self.read(offset, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Write one little-endian word
    fn write_word(&mut self, offset: u32, value: u32) -> HalResult<()> {
        self.write(offset, &value.to_le_bytes())
    }
}

/// Status indicator (usually a single LED)
///
/// Purely observational; none of these can fail.
pub trait StatusIndicator {
    /// Configure the indicator and switch it off
    fn init(&mut self);

    /// Switch the indicator on
    fn on(&mut self);

    /// Switch the indicator off
    fn off(&mut self);

    /// Blink `count` times, `delay_ms` on and `delay_ms` off between blinks
    fn blink(&mut self, count: u8, delay_ms: u32);
}

/// Restart primitive
pub trait RebootInterface {
    /// Restart the device. Never returns.
    fn restart(&mut self) -> !;
}

/// GPIO interface
pub trait GpioPin {
    /// Set pin high
    fn set_high(&mut self) -> HalResult<()>;

    /// Set pin low
    fn set_low(&mut self) -> HalResult<()>;

    /// Configure the pin as a push-pull output
    fn set_output(&mut self) -> HalResult<()>;
}

/// Busy-wait delay
pub trait DelayInterface {
    /// Delay for specified microseconds
    fn delay_us(&mut self, us: u32);

    /// Delay for specified milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Host simulation of the HAL capabilities
//!
//! Used by the test suites of the engine crates. `SimFlash` models NOR
//! semantics (erase sets `0xFF`, programming can only clear bits), records
//! every erase and program call, and can inject faults per sector.

use std::vec;
use std::vec::Vec;

use crate::error::{HalError, HalResult};
use crate::traits::{
    DelayInterface, FlashInterface, GpioPin, RebootInterface, ScratchMemoryInterface,
    StatusIndicator,
};
use rb_common::constants::{SCRATCH_MEMORY_SIZE, SECTOR_SIZE};

/// Panic message raised by [`SimReboot::restart`]
pub const REBOOT_PANIC: &str = "sim: reboot requested";

// ============================================================================
// Flash
// ============================================================================

/// One recorded flash mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOp {
    /// Sector erase
    Erase {
        /// Sector index
        sector: u32,
    },
    /// Program call
    Write {
        /// Start address
        address: u32,
        /// Number of bytes
        len: u32,
    },
}

/// Simulated NOR flash
#[derive(Debug, Clone)]
pub struct SimFlash {
    data: Vec<u8>,
    ops: Vec<FlashOp>,
    fail_erase: Option<u32>,
    fail_write: Option<u32>,
    fail_reads: bool,
}

impl SimFlash {
    /// Create a fully erased device of `capacity` bytes
    ///
    /// # Panics
    /// If `capacity` is not a whole number of sectors.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert_eq!(capacity % SECTOR_SIZE, 0, "capacity must be sector aligned");
        Self {
            data: vec![0xFF; capacity as usize],
            ops: Vec::new(),
            fail_erase: None,
            fail_write: None,
            fail_reads: false,
        }
    }

    /// Place bytes directly, bypassing NOR semantics and the operation log
    pub fn preload(&mut self, address: u32, bytes: &[u8]) {
        let start = address as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Borrow `len` bytes at `address`
    #[must_use]
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        let start = address as usize;
        &self.data[start..start + len]
    }

    /// Recorded erase and program calls, oldest first
    #[must_use]
    pub fn ops(&self) -> &[FlashOp] {
        &self.ops
    }

    /// Forget recorded operations
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of recorded erases of `sector`
    #[must_use]
    pub fn erase_count(&self, sector: u32) -> usize {
        self.ops
            .iter()
            .filter(|op| **op == FlashOp::Erase { sector })
            .count()
    }

    /// Fail every erase of `sector`
    pub fn fail_erase_on(&mut self, sector: u32) {
        self.fail_erase = Some(sector);
    }

    /// Fail every program call touching `sector`
    pub fn fail_write_on(&mut self, sector: u32) {
        self.fail_write = Some(sector);
    }

    /// Fail every read
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Remove all injected faults
    pub fn clear_faults(&mut self) {
        self.fail_erase = None;
        self.fail_write = None;
        self.fail_reads = false;
    }

    fn check_range(&self, address: u32, len: usize) -> HalResult<()> {
        let end = address as usize + len;
        if end > self.data.len() {
            return Err(HalError::FlashOutOfBounds);
        }
        Ok(())
    }
}

impl FlashInterface for SimFlash {
    fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    fn read(&self, address: u32, buffer: &mut [u8]) -> HalResult<()> {
        if self.fail_reads {
            return Err(HalError::FlashReadFailed);
        }
        self.check_range(address, buffer.len())?;
        let start = address as usize;
        buffer.copy_from_slice(&self.data[start..start + buffer.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> HalResult<()> {
        self.check_range(address, data.len())?;
        if let Some(sector) = self.fail_write {
            let first = address / SECTOR_SIZE;
            let last = (address + data.len().saturating_sub(1) as u32) / SECTOR_SIZE;
            if (first..=last).contains(&sector) {
                return Err(HalError::FlashWriteFailed);
            }
        }
        self.ops.push(FlashOp::Write {
            address,
            len: data.len() as u32,
        });
        let start = address as usize;
        for (cell, byte) in self.data[start..start + data.len()].iter_mut().zip(data) {
            *cell &= *byte;
        }
        Ok(())
    }

    fn erase_sector(&mut self, index: u32) -> HalResult<()> {
        if index >= self.sector_count() {
            return Err(HalError::FlashOutOfBounds);
        }
        if self.fail_erase == Some(index) {
            return Err(HalError::FlashEraseFailed);
        }
        self.ops.push(FlashOp::Erase { sector: index });
        let start = (index * SECTOR_SIZE) as usize;
        self.data[start..start + SECTOR_SIZE as usize].fill(0xFF);
        Ok(())
    }
}

// ============================================================================
// Scratch memory
// ============================================================================

/// Simulated RTC scratch memory
#[derive(Debug, Clone)]
pub struct SimScratch {
    data: Vec<u8>,
    fail: bool,
}

impl SimScratch {
    /// Create a zeroed scratch region
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: vec![0; SCRATCH_MEMORY_SIZE as usize],
            fail: false,
        }
    }

    /// Fail every access
    pub fn fail_access(&mut self, fail: bool) {
        self.fail = fail;
    }

    fn check(&self, offset: u32, len: usize) -> HalResult<()> {
        if self.fail || offset as usize + len > self.data.len() {
            return Err(HalError::ScratchOutOfBounds);
        }
        if offset % 4 != 0 || len % 4 != 0 {
            return Err(HalError::ScratchMisaligned);
        }
        Ok(())
    }
}

impl Default for SimScratch {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchMemoryInterface for SimScratch {
    fn read(&self, offset: u32, buffer: &mut [u8]) -> HalResult<()> {
        self.check(offset, buffer.len())?;
        let start = offset as usize;
        buffer.copy_from_slice(&self.data[start..start + buffer.len()]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> HalResult<()> {
        self.check(offset, data.len())?;
        let start = offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

// ============================================================================
// Indicator, reboot, GPIO, delay
// ============================================================================

/// Recorded indicator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorEvent {
    /// `init`
    Init,
    /// `on`
    On,
    /// `off`
    Off,
    /// `blink`
    Blink {
        /// Number of blinks
        count: u8,
        /// On/off time per blink
        delay_ms: u32,
    },
}

/// Recording status indicator
#[derive(Debug, Clone, Default)]
pub struct SimIndicator {
    /// Calls in order
    pub events: Vec<IndicatorEvent>,
}

impl SimIndicator {
    /// Create an indicator with no recorded calls
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last state-changing call left the indicator lit
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                IndicatorEvent::On => Some(true),
                IndicatorEvent::Off | IndicatorEvent::Init | IndicatorEvent::Blink { .. } => {
                    Some(false)
                }
            })
            .unwrap_or(false)
    }
}

impl StatusIndicator for SimIndicator {
    fn init(&mut self) {
        self.events.push(IndicatorEvent::Init);
    }

    fn on(&mut self) {
        self.events.push(IndicatorEvent::On);
    }

    fn off(&mut self) {
        self.events.push(IndicatorEvent::Off);
    }

    fn blink(&mut self, count: u8, delay_ms: u32) {
        self.events.push(IndicatorEvent::Blink { count, delay_ms });
    }
}

/// Reboot stand-in that traps by panicking with [`REBOOT_PANIC`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SimReboot;

impl RebootInterface for SimReboot {
    fn restart(&mut self) -> ! {
        panic!("{}", REBOOT_PANIC)
    }
}

/// Simulated output pin recording every level it was driven to
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    /// Pin was configured as an output
    pub output: bool,
    /// Driven levels in order (`true` = high)
    pub levels: Vec<bool>,
}

impl SimPin {
    /// Current level, `None` if never driven
    #[must_use]
    pub fn level(&self) -> Option<bool> {
        self.levels.last().copied()
    }
}

impl GpioPin for SimPin {
    fn set_high(&mut self) -> HalResult<()> {
        if !self.output {
            return Err(HalError::GpioError);
        }
        self.levels.push(true);
        Ok(())
    }

    fn set_low(&mut self) -> HalResult<()> {
        if !self.output {
            return Err(HalError::GpioError);
        }
        self.levels.push(false);
        Ok(())
    }

    fn set_output(&mut self) -> HalResult<()> {
        self.output = true;
        Ok(())
    }
}

/// Delay that only accumulates the requested time
#[derive(Debug, Clone, Copy, Default)]
pub struct SimDelay {
    /// Total requested delay in microseconds
    pub total_us: u64,
}

impl DelayInterface for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += u64::from(us);
    }
}

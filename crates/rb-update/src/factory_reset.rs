// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Factory reset
//!
//! Application code requests a reset by setting a magic word in scratch
//! memory and rebooting. Early in the next boot the controller sees the
//! flag, blinks the indicator, rewrites the boot configuration with the
//! defaults for the probed flash size, clears the flag and reboots again.
//!
//! Image slots are not erased; only the slot table and selection return to
//! their defaults.

use rb_common::config::{EngineConfig, LayoutConfig, ResetConfig};
use rb_common::constants::{
    FACTORY_RESET_FLAG_OFFSET, FACTORY_RESET_MAGIC, FLASH_ID_16MBIT, FLASH_ID_32MBIT,
};
use rb_common::{log_error, log_info, log_warn, Error, LogBuffer};
use rb_hal::{FlashInterface, RebootInterface, ScratchMemoryInterface, StatusIndicator};

use crate::boot_config::{BootConfig, BootConfigStore};

const MODULE: &str = "reset";

/// Flash size for a 16 Mbit part
const SIZE_16MBIT: u32 = 0x20_0000;
/// Flash size for a 32 Mbit part
const SIZE_32MBIT: u32 = 0x40_0000;

/// Factory reset request flag and reset procedure
pub struct FactoryResetController<S, L, R> {
    scratch: S,
    indicator: L,
    reboot: R,
    reset: ResetConfig,
    layout: LayoutConfig,
    log: LogBuffer,
}

impl<S, L, R> FactoryResetController<S, L, R>
where
    S: ScratchMemoryInterface,
    L: StatusIndicator,
    R: RebootInterface,
{
    /// Create a controller with the default configuration
    pub fn new(scratch: S, indicator: L, reboot: R) -> Self {
        Self::with_config(scratch, indicator, reboot, &EngineConfig::DEFAULT)
    }

    /// Create a controller with an explicit configuration
    pub fn with_config(scratch: S, indicator: L, reboot: R, config: &EngineConfig) -> Self {
        Self {
            scratch,
            indicator,
            reboot,
            reset: config.reset,
            layout: config.layout,
            log: LogBuffer::new(),
        }
    }

    /// Whether a reset has been requested
    ///
    /// An unreadable scratch word counts as "not requested".
    pub fn check_requested(&self) -> bool {
        self.scratch
            .read_word(FACTORY_RESET_FLAG_OFFSET)
            .map_or(false, |word| word == FACTORY_RESET_MAGIC)
    }

    /// Set or clear the reset request
    pub fn set_requested(&mut self, enabled: bool) -> Result<(), Error> {
        let word = if enabled { FACTORY_RESET_MAGIC } else { 0 };
        self.scratch.write_word(FACTORY_RESET_FLAG_OFFSET, word)?;
        Ok(())
    }

    /// Coarse flash size from the identity word
    pub fn probe_flash_size<F: FlashInterface>(&self, flash: &F) -> u32 {
        match flash.identity() {
            Ok(word) => match word.to_le_bytes()[0] {
                FLASH_ID_16MBIT => SIZE_16MBIT,
                FLASH_ID_32MBIT => SIZE_32MBIT,
                _ => self.layout.default_flash_size,
            },
            Err(_) => self.layout.default_flash_size,
        }
    }

    /// Apply the reset up to, but not including, the reboot
    ///
    /// # Returns
    /// The configuration that was written.
    pub fn prepare_reset<F: FlashInterface>(
        &mut self,
        store: &mut BootConfigStore<F>,
    ) -> Result<BootConfig, Error> {
        self.indicator
            .blink(self.reset.blink_count, self.reset.blink_delay_ms);

        let flash_size = self.probe_flash_size(store.flash());
        let config = BootConfig::default_for(flash_size);
        store.save(&config)?;
        self.set_requested(false)?;

        log_info!(self.log, MODULE, "defaults restored for {:#x} bytes", flash_size);
        Ok(config)
    }

    /// Apply the reset and reboot
    ///
    /// A failed reset is logged and the flag is still cleared so the device
    /// does not loop through resets; the boot preflight then repairs the
    /// configuration on the way up.
    pub fn perform_reset<F: FlashInterface>(&mut self, store: &mut BootConfigStore<F>) -> ! {
        if let Err(e) = self.prepare_reset(store) {
            log_error!(self.log, MODULE, "reset failed: {}", e);
            if self.set_requested(false).is_err() {
                log_warn!(self.log, MODULE, "could not clear reset flag");
            }
        }
        self.reboot.restart()
    }

    /// Status indicator
    pub fn indicator_mut(&mut self) -> &mut L {
        &mut self.indicator
    }

    /// Scratch memory
    pub fn scratch(&self) -> &S {
        &self.scratch
    }

    /// Reset log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_hal::sim::{IndicatorEvent, SimFlash, SimIndicator, SimReboot, SimScratch};

    type Controller = FactoryResetController<SimScratch, SimIndicator, SimReboot>;

    fn controller() -> Controller {
        FactoryResetController::new(SimScratch::new(), SimIndicator::new(), SimReboot)
    }

    #[test]
    fn test_flag_round_trip() {
        let mut ctl = controller();
        assert!(!ctl.check_requested());
        ctl.set_requested(true).unwrap();
        assert!(ctl.check_requested());
        assert_eq!(
            ctl.scratch().read_word(FACTORY_RESET_FLAG_OFFSET),
            Ok(FACTORY_RESET_MAGIC)
        );
        ctl.set_requested(false).unwrap();
        assert!(!ctl.check_requested());
    }

    #[test]
    fn test_unreadable_flag_not_requested() {
        let mut scratch = SimScratch::new();
        scratch
            .write_word(FACTORY_RESET_FLAG_OFFSET, FACTORY_RESET_MAGIC)
            .unwrap();
        scratch.fail_access(true);
        let ctl = FactoryResetController::new(scratch, SimIndicator::new(), SimReboot);
        assert!(!ctl.check_requested());
    }

    #[test]
    fn test_probe_flash_size() {
        let ctl = controller();
        let mut flash = SimFlash::new(0x1_0000);
        flash.preload(0, &[0x40, 0, 0, 0]);
        assert_eq!(ctl.probe_flash_size(&flash), 0x20_0000);
        flash.preload(0, &[0x30, 0, 0, 0]);
        assert_eq!(ctl.probe_flash_size(&flash), 0x40_0000);
        flash.preload(0, &[0xE9, 0, 0, 0]);
        assert_eq!(ctl.probe_flash_size(&flash), 0x10_0000);
        flash.fail_reads(true);
        assert_eq!(ctl.probe_flash_size(&flash), 0x10_0000);
    }

    #[test]
    fn test_prepare_reset() {
        let mut ctl = controller();
        ctl.set_requested(true).unwrap();
        let mut store = BootConfigStore::new(SimFlash::new(0x10_0000));
        let mut custom = BootConfig::default_for(0x10_0000);
        custom.current_rom = 1;
        store.save(&custom).unwrap();

        let written = ctl.prepare_reset(&mut store).unwrap();
        assert_eq!(written, BootConfig::default_for(0x10_0000));
        assert_eq!(store.load(), Ok(written));
        assert!(!ctl.check_requested());
        assert_eq!(
            ctl.indicator_mut().events,
            [IndicatorEvent::Blink {
                count: 5,
                delay_ms: 100
            }]
        );
    }

    #[test]
    #[should_panic(expected = "sim: reboot requested")]
    fn test_perform_reset_reboots() {
        let mut ctl = controller();
        let mut store = BootConfigStore::new(SimFlash::new(0x10_0000));
        ctl.perform_reset(&mut store);
    }
}

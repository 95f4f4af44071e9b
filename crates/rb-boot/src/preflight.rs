// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot preflight
//!
//! Runs before the image locator on every boot:
//!
//! 1. Initialise the status indicator
//! 2. Apply a pending factory reset (reboots, never returns)
//! 3. Read the flash size from the header at offset 0
//! 4. Ensure a valid boot configuration, writing defaults on a fresh
//!    install and repairing an out-of-range selection
//! 5. Switch the indicator on
//!
//! The resulting configuration is handed to the image locator, which is
//! outside this crate.

use rb_common::config::{EngineConfig, LayoutConfig};
use rb_common::{log_info, log_warn, Error, LogBuffer};
use rb_hal::{FlashInterface, RebootInterface, ScratchMemoryInterface, StatusIndicator};
use rb_update::{BootConfig, BootConfigStore, ConfigRepair, FactoryResetController, RomHeader};

const MODULE: &str = "boot";

/// Outcome of a completed preflight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreflightReport {
    /// Configuration to boot from
    pub config: BootConfig,
    /// Flash size the configuration was checked against
    pub flash_size: u32,
    /// Repair applied to the stored configuration
    pub repair: ConfigRepair,
}

/// Flash size declared by the image header at offset 0
///
/// Falls back to `fallback` when no valid header is present. The result is
/// never larger than the device.
pub fn boot_flash_size<F: FlashInterface>(flash: &F, fallback: u32) -> u32 {
    let declared = match RomHeader::read(flash, 0) {
        Ok(header) if header.is_valid() => header.flash_size(),
        _ => fallback,
    };
    declared.min(flash.capacity())
}

/// Early boot sequence over injected capabilities
pub struct Preflight<F, S, L, R> {
    store: BootConfigStore<F>,
    reset: FactoryResetController<S, L, R>,
    layout: LayoutConfig,
    log: LogBuffer,
}

impl<F, S, L, R> Preflight<F, S, L, R>
where
    F: FlashInterface,
    S: ScratchMemoryInterface,
    L: StatusIndicator,
    R: RebootInterface,
{
    /// Create a preflight with the default configuration
    pub fn new(flash: F, scratch: S, indicator: L, reboot: R) -> Self {
        Self::with_config(flash, scratch, indicator, reboot, &EngineConfig::DEFAULT)
    }

    /// Create a preflight with an explicit configuration
    pub fn with_config(
        flash: F,
        scratch: S,
        indicator: L,
        reboot: R,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store: BootConfigStore::new(flash),
            reset: FactoryResetController::with_config(scratch, indicator, reboot, config),
            layout: config.layout,
            log: LogBuffer::new(),
        }
    }

    /// Run the sequence
    ///
    /// Does not return when a factory reset is pending.
    pub fn run(&mut self) -> Result<PreflightReport, Error> {
        self.reset.indicator_mut().init();

        if self.reset.check_requested() {
            log_info!(self.log, MODULE, "factory reset requested");
            self.reset.perform_reset(&mut self.store);
        }

        let flash_size = boot_flash_size(self.store.flash(), self.layout.default_flash_size);
        let (config, repair) = self.store.ensure_valid(flash_size)?;
        match repair {
            ConfigRepair::None => {}
            ConfigRepair::Defaults => {
                log_warn!(self.log, MODULE, "no valid config, defaults written");
            }
            ConfigRepair::Selection => {
                log_warn!(self.log, MODULE, "boot selection reset to slot {}", config.current_rom);
            }
        }

        self.reset.indicator_mut().on();
        let slot = config.current_rom;
        log_info!(self.log, MODULE, "booting slot {} at {:#x}", slot, config.roms[usize::from(slot)]);

        Ok(PreflightReport {
            config,
            flash_size,
            repair,
        })
    }

    /// Configuration store
    pub fn store(&self) -> &BootConfigStore<F> {
        &self.store
    }

    /// Factory reset controller
    pub fn reset_mut(&mut self) -> &mut FactoryResetController<S, L, R> {
        &mut self.reset
    }

    /// Preflight log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Hand the configuration store on to the image locator
    pub fn into_store(self) -> BootConfigStore<F> {
        self.store
    }
}

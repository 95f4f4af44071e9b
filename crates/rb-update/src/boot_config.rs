// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot configuration sector
//!
//! One flash sector holds the slot table and the current boot selection.
//! The external image locator reads it at every boot; this module owns its
//! format and its read/modify/write discipline.
//!
//! # Record Layout
//!
//! ```text
//! offset  size  field
//! ------  ----  -----------------------------------------------
//!      0     4  magic (0xE1, little endian)
//!      4     1  version (0x01)
//!      5     1  mode flags
//!      6     1  current_rom
//!      7     1  count
//!      8    16  roms[4], flash base address per slot
//!     24     1  checksum, XOR of bytes 0..24 seeded with 0xEF
//!     25     7  reserved, zero
//! ```
//!
//! # Known Limitation
//!
//! NOR flash cannot be rewritten in place, so every mutation erases the
//! sector and then programs the full record. Power loss between the two
//! leaves the sector blank. There is no journal and no redundant copy; the
//! next boot detects the blank record (bad magic) and falls back to factory
//! defaults through `ensure_valid`, losing the custom selection.

use rb_common::constants::{
    BOOT_CONFIG_ADDR, BOOT_CONFIG_MAGIC, BOOT_CONFIG_SECTOR, BOOT_CONFIG_VERSION, CHECKSUM_INIT,
    DEFAULT_BOOT_SLOT, FIRST_IMAGE_ADDR, MAX_SLOTS, SECTOR_SIZE,
};
use rb_common::{log_info, log_warn, Error, LogBuffer};
use rb_hal::FlashInterface;

const MODULE: &str = "config";

// ============================================================================
// Boot Mode
// ============================================================================

/// Mode flags persisted with the configuration
///
/// Interpreted by the image locator only; the update engine carries them
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootMode(u8);

impl BootMode {
    /// Boot the selected slot
    pub const STANDARD: Self = Self(0x00);
    /// A GPIO strap selects the slot
    pub const GPIO_ROM: Self = Self(0x01);
    /// Boot a temporary slot once
    pub const TEMP_ROM: Self = Self(0x02);
    /// GPIO boot also erases the SDK config sectors
    pub const GPIO_ERASES_SDKCONFIG: Self = Self(0x04);
    /// A GPIO strap advances to the next slot
    pub const GPIO_SKIP: Self = Self(0x08);

    /// Build from raw bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether all flags of `other` are set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Boot configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Configuration sector could not be read
    ReadFailed,
    /// Erase or program of the configuration sector failed
    WriteFailed,
    /// Bad magic, version or checksum
    Corrupted,
    /// Slot table violates a layout invariant
    InvalidLayout,
    /// Stored `current_rom` is outside the slot table
    InvalidSelection,
    /// Requested slot is outside the slot table
    InvalidSlot,
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ReadFailed => Error::ConfigReadFailed,
            ConfigError::WriteFailed => Error::ConfigWriteFailed,
            ConfigError::Corrupted => Error::ConfigCorrupted,
            ConfigError::InvalidLayout | ConfigError::InvalidSelection => Error::InvalidBootConfig,
            ConfigError::InvalidSlot => Error::InvalidSlot,
        }
    }
}

// ============================================================================
// Boot Configuration Record
// ============================================================================

/// Decoded boot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Format magic
    pub magic: u32,
    /// Format version
    pub version: u8,
    /// Mode flags
    pub mode: BootMode,
    /// Slot to boot next
    pub current_rom: u8,
    /// Number of configured slots
    pub count: u8,
    /// Flash base address per slot
    pub roms: [u32; MAX_SLOTS],
}

impl BootConfig {
    /// Size of the encoded record
    pub const SIZE: usize = 32;

    const ROMS_OFFSET: usize = 8;
    const CHECKSUM_OFFSET: usize = 24;

    /// Factory default for a device with `flash_size` bytes
    ///
    /// Two slots: one right after the configuration sector, one the same
    /// distance into the second half of flash.
    #[must_use]
    pub const fn default_for(flash_size: u32) -> Self {
        let mut roms = [0u32; MAX_SLOTS];
        roms[0] = FIRST_IMAGE_ADDR;
        roms[1] = flash_size / 2 + FIRST_IMAGE_ADDR;
        Self {
            magic: BOOT_CONFIG_MAGIC,
            version: BOOT_CONFIG_VERSION,
            mode: BootMode::STANDARD,
            current_rom: DEFAULT_BOOT_SLOT,
            count: 2,
            roms,
        }
    }

    /// Flash address of `slot`, if it is configured
    #[must_use]
    pub fn slot_address(&self, slot: u8) -> Option<u32> {
        if slot < self.count && usize::from(slot) < MAX_SLOTS {
            Some(self.roms[usize::from(slot)])
        } else {
            None
        }
    }

    /// End of the region `slot` may occupy
    ///
    /// The lowest configured slot address above `slot`, or `flash_size`
    /// when no slot lies above it.
    #[must_use]
    pub fn slot_limit(&self, slot: u8, flash_size: u32) -> Option<u32> {
        let start = self.slot_address(slot)?;
        let count = usize::from(self.count).min(MAX_SLOTS);
        let limit = self.roms[..count]
            .iter()
            .copied()
            .filter(|&addr| addr > start)
            .fold(flash_size, u32::min);
        Some(limit)
    }

    /// Check the slot table and selection against a device of `flash_size`
    pub fn validate(&self, flash_size: u32) -> Result<(), ConfigError> {
        if self.count == 0 || usize::from(self.count) > MAX_SLOTS {
            return Err(ConfigError::InvalidLayout);
        }

        for &addr in &self.roms[..usize::from(self.count)] {
            if addr % SECTOR_SIZE != 0 || addr < FIRST_IMAGE_ADDR || addr >= flash_size {
                return Err(ConfigError::InvalidLayout);
            }
        }

        if self.current_rom >= self.count {
            return Err(ConfigError::InvalidSelection);
        }

        Ok(())
    }

    /// Serialize, filling in the checksum
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4] = self.version;
        out[5] = self.mode.bits();
        out[6] = self.current_rom;
        out[7] = self.count;
        for (i, rom) in self.roms.iter().enumerate() {
            let at = Self::ROMS_OFFSET + i * 4;
            out[at..at + 4].copy_from_slice(&rom.to_le_bytes());
        }
        out[Self::CHECKSUM_OFFSET] = checksum(&out[..Self::CHECKSUM_OFFSET]);
        out
    }

    /// Parse a record, checking magic, version and checksum
    ///
    /// Slot table invariants are not checked here; see [`Self::validate`].
    pub fn decode(bytes: &[u8; Self::SIZE]) -> Result<Self, ConfigError> {
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != BOOT_CONFIG_MAGIC || bytes[4] != BOOT_CONFIG_VERSION {
            return Err(ConfigError::Corrupted);
        }
        if bytes[Self::CHECKSUM_OFFSET] != checksum(&bytes[..Self::CHECKSUM_OFFSET]) {
            return Err(ConfigError::Corrupted);
        }

        let mut roms = [0u32; MAX_SLOTS];
        for (i, rom) in roms.iter_mut().enumerate() {
            let at = Self::ROMS_OFFSET + i * 4;
            *rom = u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        }

        Ok(Self {
            magic,
            version: bytes[4],
            mode: BootMode::from_bits(bytes[5]),
            current_rom: bytes[6],
            count: bytes[7],
            roms,
        })
    }
}

/// What `ensure_valid` had to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigRepair {
    /// Stored record was valid
    None,
    /// Record was missing or corrupt; defaults written
    Defaults,
    /// Selection was out of range; reset to the default slot
    Selection,
}

// ============================================================================
// Configuration Store
// ============================================================================

/// Owner of the boot configuration sector
///
/// Not designed for concurrent callers; the bootloader has exactly one
/// thread of control.
pub struct BootConfigStore<F> {
    flash: F,
    log: LogBuffer,
}

impl<F: FlashInterface> BootConfigStore<F> {
    /// Create a store over `flash`
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            log: LogBuffer::new(),
        }
    }

    /// Borrow the flash device
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Mutably borrow the flash device
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the flash device
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Diagnostic log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Read and decode the record without checking slot invariants
    pub fn read_raw(&self) -> Result<BootConfig, ConfigError> {
        let mut buffer = [0u8; BootConfig::SIZE];
        self.flash
            .read(BOOT_CONFIG_ADDR, &mut buffer)
            .map_err(|_| ConfigError::ReadFailed)?;
        BootConfig::decode(&buffer)
    }

    /// Read, decode and validate the record
    pub fn load(&self) -> Result<BootConfig, ConfigError> {
        let config = self.read_raw()?;
        config.validate(self.flash.capacity())?;
        Ok(config)
    }

    /// Replace the record: validate, erase the sector, program the record
    pub fn save(&mut self, config: &BootConfig) -> Result<(), ConfigError> {
        config.validate(self.flash.capacity())?;
        let record = config.encode();

        self.flash
            .erase_sector(BOOT_CONFIG_SECTOR)
            .map_err(|_| ConfigError::WriteFailed)?;

        // The sector is blank from here until the write lands.
        self.flash
            .write(BOOT_CONFIG_ADDR, &record)
            .map_err(|_| ConfigError::WriteFailed)?;

        Ok(())
    }

    /// Slot selected for the next boot
    ///
    /// Falls back to slot 0 when the record cannot be read or is invalid.
    /// The fallback is logged as a warning; callers that must distinguish
    /// it use [`Self::load`].
    pub fn current_rom(&mut self) -> u8 {
        match self.load() {
            Ok(config) => config.current_rom,
            Err(e) => {
                log_warn!(self.log, MODULE, "unreadable ({:?}), assuming slot {}", e, DEFAULT_BOOT_SLOT);
                DEFAULT_BOOT_SLOT
            }
        }
    }

    /// Select `slot` for the next boot
    ///
    /// Leaves the sector untouched when `slot` is not configured.
    pub fn set_boot_rom(&mut self, slot: u8) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        if slot >= config.count {
            return Err(ConfigError::InvalidSlot);
        }

        config.current_rom = slot;
        self.save(&config)?;
        log_info!(self.log, MODULE, "boot slot set to {}", slot);
        Ok(())
    }

    /// Flash address of `slot`
    ///
    /// `None` when the slot is not configured or the record is unreadable.
    pub fn resolve_address(&self, slot: u8) -> Option<u32> {
        self.load().ok()?.slot_address(slot)
    }

    /// Flash region `(start, limit)` an image in `slot` may occupy
    ///
    /// `None` under the same conditions as [`Self::resolve_address`].
    pub fn resolve_region(&self, slot: u8) -> Option<(u32, u32)> {
        let config = self.load().ok()?;
        let start = config.slot_address(slot)?;
        let limit = config.slot_limit(slot, self.flash.capacity())?;
        Some((start, limit))
    }

    /// Make sure a usable record is stored, repairing it if necessary
    ///
    /// A missing, corrupt or structurally invalid record is replaced by the
    /// defaults for `flash_size`; an out-of-range selection is reset to
    /// slot 0.
    pub fn ensure_valid(&mut self, flash_size: u32) -> Result<(BootConfig, ConfigRepair), ConfigError> {
        let capacity = self.flash.capacity();

        match self.read_raw() {
            Ok(config) => match config.validate(capacity) {
                Ok(()) => Ok((config, ConfigRepair::None)),
                Err(ConfigError::InvalidSelection) => {
                    let mut repaired = config;
                    repaired.current_rom = DEFAULT_BOOT_SLOT;
                    log_warn!(self.log, MODULE, "slot {} invalid, defaulting to {}", config.current_rom, DEFAULT_BOOT_SLOT);
                    self.save(&repaired)?;
                    Ok((repaired, ConfigRepair::Selection))
                }
                Err(_) => self.write_defaults(flash_size),
            },
            Err(ConfigError::ReadFailed) => Err(ConfigError::ReadFailed),
            Err(_) => self.write_defaults(flash_size),
        }
    }

    fn write_defaults(&mut self, flash_size: u32) -> Result<(BootConfig, ConfigRepair), ConfigError> {
        let config = BootConfig::default_for(flash_size);
        log_info!(self.log, MODULE, "writing default config for {:#x} bytes", flash_size);
        self.save(&config)?;
        Ok((config, ConfigRepair::Defaults))
    }
}

/// XOR checksum over `data`, seeded with `CHECKSUM_INIT`
fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(CHECKSUM_INIT, |acc, b| acc ^ b)
}

// ============================================================================
// Tests
// ============================================================================

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Layout constants for the rb bootloader engine
//!
//! Flash geometry, persisted magic values and the persistent scratch memory
//! map. Everything here is part of the on-device format: changing a value
//! invalidates configurations written by older bootloaders.

// =============================================================================
// Flash Geometry
// =============================================================================

/// Smallest erasable unit of the flash device
pub const SECTOR_SIZE: u32 = 0x1000;

/// Sector holding the boot configuration record (sector 0 is the bootloader)
pub const BOOT_CONFIG_SECTOR: u32 = 1;

/// Absolute flash address of the boot configuration record
pub const BOOT_CONFIG_ADDR: u32 = BOOT_CONFIG_SECTOR * SECTOR_SIZE;

/// First flash address usable by an image slot
pub const FIRST_IMAGE_ADDR: u32 = (BOOT_CONFIG_SECTOR + 1) * SECTOR_SIZE;

/// Maximum number of image slots in the boot configuration
pub const MAX_SLOTS: usize = 4;

// =============================================================================
// Boot Configuration
// =============================================================================

/// Boot configuration magic
pub const BOOT_CONFIG_MAGIC: u32 = 0xE1;

/// Boot configuration format version
pub const BOOT_CONFIG_VERSION: u8 = 0x01;

/// Seed for the configuration XOR checksum
pub const CHECKSUM_INIT: u8 = 0xEF;

/// Slot selected when the configuration cannot be read
pub const DEFAULT_BOOT_SLOT: u8 = 0;

// =============================================================================
// Image Header
// =============================================================================

/// Leading byte of a well-formed firmware image
pub const ROM_MAGIC: u8 = 0xE9;

/// Size of the image header read back for verification
pub const ROM_HEADER_SIZE: usize = 8;

// =============================================================================
// Persistent Scratch Memory
// =============================================================================

/// Size of the scratch region that survives a warm reboot
pub const SCRATCH_MEMORY_SIZE: u32 = 0x300;

/// Start of the bootloader's own working data in scratch memory
pub const SCRATCH_BOOT_DATA_OFFSET: u32 = 0x100;

/// Factory reset request word, placed after the bootloader's working data
pub const FACTORY_RESET_FLAG_OFFSET: u32 = SCRATCH_BOOT_DATA_OFFSET + 0x80;

/// Value of the factory reset word that requests a reset
pub const FACTORY_RESET_MAGIC: u32 = 0x1AC3_F5E7;

// =============================================================================
// Flash Identity Probe
// =============================================================================

/// Identity byte of 16 Mbit parts
pub const FLASH_ID_16MBIT: u8 = 0x40;

/// Identity byte of 32 Mbit parts
pub const FLASH_ID_32MBIT: u8 = 0x30;

/// Flash size assumed when the identity byte is not recognised
pub const DEFAULT_FLASH_SIZE: u32 = 0x10_0000;

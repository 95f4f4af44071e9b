// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Image verification
//!
//! Post-write check run before a freshly written slot is committed. The
//! check is structural: the image must start with a readable ROM header
//! carrying the expected magic byte. Authenticity is the job of the image
//! producer and is not checked here.

use rb_common::constants::{ROM_HEADER_SIZE, ROM_MAGIC};
use rb_common::Error;
use rb_hal::FlashInterface;

/// Verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerifyError {
    /// Nothing was written
    Empty,
    /// Header could not be read back
    ReadFailed,
    /// First byte is not the ROM magic
    BadMagic(u8),
}

impl From<VerifyError> for Error {
    fn from(_: VerifyError) -> Self {
        Error::VerifyFailed
    }
}

/// SPI flash access mode declared by an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Quad I/O
    Qio,
    /// Quad output
    Qout,
    /// Dual I/O
    Dio,
    /// Dual output
    Dout,
}

/// Fixed header at the start of every bootable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    /// Magic byte, `0xE9`
    pub magic: u8,
    /// Number of sections following the header
    pub section_count: u8,
    /// SPI mode byte
    pub flags1: u8,
    /// Flash size (high nibble) and SPI speed (low nibble)
    pub flags2: u8,
    /// Entry point
    pub entry: u32,
}

impl RomHeader {
    /// Parse the raw header bytes
    #[must_use]
    pub fn parse(bytes: &[u8; ROM_HEADER_SIZE]) -> Self {
        Self {
            magic: bytes[0],
            section_count: bytes[1],
            flags1: bytes[2],
            flags2: bytes[3],
            entry: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Read the header at `address`
    pub fn read<F: FlashInterface>(flash: &F, address: u32) -> Result<Self, VerifyError> {
        let mut bytes = [0u8; ROM_HEADER_SIZE];
        flash
            .read(address, &mut bytes)
            .map_err(|_| VerifyError::ReadFailed)?;
        Ok(Self::parse(&bytes))
    }

    /// Whether the magic byte is present
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.magic == ROM_MAGIC
    }

    /// Flash size declared by the image, in bytes
    ///
    /// Unknown size codes map to 512 KiB.
    #[must_use]
    pub const fn flash_size(&self) -> u32 {
        const KIB: u32 = 1024;
        match self.flags2 >> 4 {
            1 => 256 * KIB,
            2 => 1024 * KIB,
            3 | 5 => 2048 * KIB,
            4 | 6 => 4096 * KIB,
            8 => 8192 * KIB,
            9 => 16384 * KIB,
            _ => 512 * KIB,
        }
    }

    /// SPI mode declared by the image
    #[must_use]
    pub const fn spi_mode(&self) -> SpiMode {
        match self.flags1 {
            0 => SpiMode::Qio,
            1 => SpiMode::Qout,
            2 => SpiMode::Dio,
            _ => SpiMode::Dout,
        }
    }

    /// SPI clock in MHz declared by the image
    #[must_use]
    pub const fn spi_speed_mhz(&self) -> u8 {
        match self.flags2 & 0x0F {
            0 => 40,
            1 => 26,
            2 => 20,
            _ => 80,
        }
    }
}

/// Structural check of a written image
#[derive(Debug, Clone, Copy)]
pub struct ImageVerifier {
    magic: u8,
}

impl ImageVerifier {
    /// Verifier expecting the standard ROM magic
    #[must_use]
    pub const fn new() -> Self {
        Self { magic: ROM_MAGIC }
    }

    /// Check the `length` bytes written at `address`
    ///
    /// The verdict rests on the magic byte alone; the header is read back
    /// even when fewer than its eight bytes were written.
    ///
    /// # Returns
    /// The parsed header when the image passes.
    pub fn verify<F: FlashInterface>(
        &self,
        flash: &F,
        address: u32,
        length: u32,
    ) -> Result<RomHeader, VerifyError> {
        if length == 0 {
            return Err(VerifyError::Empty);
        }

        let header = RomHeader::read(flash, address)?;
        if header.magic != self.magic {
            return Err(VerifyError::BadMagic(header.magic));
        }
        Ok(header)
    }
}

impl Default for ImageVerifier {
    fn default() -> Self {
        Self::new()
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Buffered sector writer
//!
//! Accumulates incoming image bytes in a caller-provided scratch arena and
//! programs them to flash once the arena is full (or on `flush`). Each
//! sector of the target region is erased exactly once, immediately before
//! the first program that touches it.
//!
//! Flushes only happen at arena boundaries, so the sequence of flash
//! operations depends on the total byte stream and never on how it was
//! chunked by the caller.

use rb_common::constants::SECTOR_SIZE;
use rb_hal::FlashInterface;

use crate::session::OtaError;

/// Streaming writer for one contiguous flash region
#[derive(Debug, Clone, Copy)]
pub struct SectorWriter {
    base: u32,
    flushed: u32,
    pending: usize,
    erased_end: u32,
}

impl SectorWriter {
    /// Start a region at sector-aligned `base`
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            flushed: 0,
            pending: 0,
            erased_end: base,
        }
    }

    /// Bytes already programmed
    #[must_use]
    pub const fn flushed(&self) -> u32 {
        self.flushed
    }

    /// Bytes waiting in the arena
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Bytes accepted so far
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.flushed + self.pending as u32
    }

    /// Append `data`, flushing each time the arena fills
    ///
    /// `arena` must be the same slice on every call.
    pub fn push<F: FlashInterface>(
        &mut self,
        flash: &mut F,
        arena: &mut [u8],
        mut data: &[u8],
    ) -> Result<(), OtaError> {
        while !data.is_empty() {
            let room = arena.len() - self.pending;
            let take = room.min(data.len());
            arena[self.pending..self.pending + take].copy_from_slice(&data[..take]);
            self.pending += take;
            data = &data[take..];

            if self.pending == arena.len() {
                self.flush(flash, arena)?;
            }
        }
        Ok(())
    }

    /// Program whatever is buffered
    pub fn flush<F: FlashInterface>(&mut self, flash: &mut F, arena: &[u8]) -> Result<(), OtaError> {
        if self.pending == 0 {
            return Ok(());
        }

        let address = self.base + self.flushed;
        self.program(flash, address, &arena[..self.pending])?;
        self.flushed += self.pending as u32;
        self.pending = 0;
        Ok(())
    }

    fn program<F: FlashInterface>(
        &mut self,
        flash: &mut F,
        mut address: u32,
        mut bytes: &[u8],
    ) -> Result<(), OtaError> {
        while !bytes.is_empty() {
            let sector = address / SECTOR_SIZE;
            let sector_end = (sector + 1) * SECTOR_SIZE;
            let take = ((sector_end - address) as usize).min(bytes.len());

            // Writes are contiguous from `base`, so a sector is unerased
            // exactly when we reach it for the first time.
            if address >= self.erased_end {
                flash
                    .erase_sector(sector)
                    .map_err(|_| OtaError::EraseFailed)?;
                self.erased_end = sector_end;
            }

            flash
                .write(address, &bytes[..take])
                .map_err(|_| OtaError::WriteFailed)?;

            address += take as u32;
            bytes = &bytes[take..];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_hal::sim::{FlashOp, SimFlash};

    const BASE: u32 = 0x2000;

    #[test]
    fn test_nothing_programmed_until_arena_full() {
        let mut flash = SimFlash::new(0x1_0000);
        let mut arena = [0u8; SECTOR_SIZE as usize];
        let mut writer = SectorWriter::new(BASE);

        writer.push(&mut flash, &mut arena, &[0xAA; 100]).unwrap();
        assert!(flash.ops().is_empty());
        assert_eq!(writer.pending(), 100);

        writer.flush(&mut flash, &arena).unwrap();
        assert_eq!(
            flash.ops(),
            &[
                FlashOp::Erase { sector: 2 },
                FlashOp::Write { address: BASE, len: 100 }
            ]
        );
        assert_eq!(flash.contents(BASE, 100), &[0xAA; 100][..]);
    }

    #[test]
    fn test_each_sector_erased_once() {
        let mut flash = SimFlash::new(0x1_0000);
        let mut arena = [0u8; SECTOR_SIZE as usize];
        let mut writer = SectorWriter::new(BASE);

        for _ in 0..10 {
            writer.push(&mut flash, &mut arena, &[0x11; 1000]).unwrap();
        }
        writer.flush(&mut flash, &arena).unwrap();

        assert_eq!(writer.total(), 10_000);
        assert_eq!(flash.erase_count(2), 1);
        assert_eq!(flash.erase_count(3), 1);
        assert_eq!(flash.erase_count(4), 1);
        assert_eq!(flash.erase_count(5), 0);
        assert_eq!(flash.contents(BASE, 10_000), &[0x11; 10_000][..]);
    }

    #[test]
    fn test_large_arena_splits_at_sector_boundaries() {
        let mut flash = SimFlash::new(0x1_0000);
        let mut arena = [0u8; 2 * SECTOR_SIZE as usize];
        let mut writer = SectorWriter::new(BASE);

        writer.push(&mut flash, &mut arena, &[0x22; 0x2000]).unwrap();
        assert_eq!(
            flash.ops(),
            &[
                FlashOp::Erase { sector: 2 },
                FlashOp::Write { address: 0x2000, len: 0x1000 },
                FlashOp::Erase { sector: 3 },
                FlashOp::Write { address: 0x3000, len: 0x1000 },
            ]
        );
    }

    #[test]
    fn test_erase_failure_surfaces() {
        let mut flash = SimFlash::new(0x1_0000);
        flash.fail_erase_on(2);
        let mut arena = [0u8; SECTOR_SIZE as usize];
        let mut writer = SectorWriter::new(BASE);

        assert_eq!(
            writer.push(&mut flash, &mut arena, &[0; SECTOR_SIZE as usize]),
            Err(OtaError::EraseFailed)
        );
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut flash = SimFlash::new(0x1_0000);
        flash.fail_write_on(2);
        let arena = [0x33u8; SECTOR_SIZE as usize];
        let mut writer = SectorWriter::new(BASE);
        writer.pending = 16;

        assert_eq!(writer.flush(&mut flash, &arena), Err(OtaError::WriteFailed));
    }
}

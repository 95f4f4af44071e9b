// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! OTA update session
//!
//! Streams a new image into a slot and, once it verifies, selects that slot
//! for the next boot. At most one session exists at a time; the `Updater`
//! owns it and callers hold only an opaque [`OtaHandle`].
//!
//! # State Machine
//!
//! ```text
//!   begin ──► Started ──write──► Writing ──end──► Verifying ──► Complete
//!                │                  │                  │
//!                └──────cancel──────┴──► Error ◄───────┘
//! ```
//!
//! `Complete` and `Error` are terminal. A session that fails during `write`
//! stays claimed in `Error` until the caller cancels it; `end` releases the
//! session whatever its outcome.

use rb_common::config::UpdateConfig;
use rb_common::constants::SECTOR_SIZE;
use rb_common::{log_error, log_info, log_warn, Error, LogBuffer};
use rb_hal::FlashInterface;

use crate::boot_config::{BootConfigStore, ConfigError};
use crate::verify::{ImageVerifier, VerifyError};
use crate::writer::SectorWriter;

const MODULE: &str = "ota";

// ============================================================================
// Public Types
// ============================================================================

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaState {
    /// No session has been started
    Ready,
    /// Session claimed, no data yet
    Started,
    /// Receiving data
    Writing,
    /// Checking the written image
    Verifying,
    /// Image verified and selected for next boot
    Complete,
    /// Session failed or was cancelled
    Error,
}

impl OtaState {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Caller-visible session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtaHandle {
    id: u32,
}

impl OtaHandle {
    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }
}

/// Snapshot returned by [`Updater::status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OtaStatus {
    /// Current state
    pub state: OtaState,
    /// Percentage of the declared size written, 0..=100
    pub progress: u8,
}

/// Update session error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OtaError {
    /// Bad argument, stale handle or call illegal in the current state
    InvalidArgs,
    /// Scratch arena unusable
    NoMemory,
    /// A session is already live
    InProgress,
    /// Sector erase failed
    EraseFailed,
    /// Program failed, or the commit could not be written
    WriteFailed,
    /// Written image failed verification
    VerifyFailed,
}

impl From<OtaError> for Error {
    fn from(e: OtaError) -> Self {
        match e {
            OtaError::InvalidArgs => Error::InvalidArgs,
            OtaError::NoMemory => Error::NoMemory,
            OtaError::InProgress => Error::UpdateInProgress,
            OtaError::EraseFailed => Error::EraseFailed,
            OtaError::WriteFailed => Error::WriteFailed,
            OtaError::VerifyFailed => Error::VerifyFailed,
        }
    }
}

impl From<VerifyError> for OtaError {
    fn from(_: VerifyError) -> Self {
        Self::VerifyFailed
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct OtaSession {
    id: u32,
    target_slot: u8,
    target_addr: u32,
    limit: u32,
    total_size: u32,
    written_size: u32,
    writer: SectorWriter,
    state: OtaState,
}

impl OtaSession {
    fn status(&self) -> OtaStatus {
        let progress = if self.total_size > 0 {
            let pct = u64::from(self.written_size) * 100 / u64::from(self.total_size);
            pct.min(100) as u8
        } else {
            0
        };
        OtaStatus {
            state: self.state,
            progress,
        }
    }
}

// ============================================================================
// Updater
// ============================================================================

/// OTA engine owning the single session slot
///
/// # Example
///
/// ```ignore
/// let mut arena = [0u8; 4096];
/// let mut updater = Updater::new(BootConfigStore::new(flash), &mut arena);
/// let handle = updater.begin(1, image.len() as u32)?;
/// for chunk in image.chunks(512) {
///     updater.write(handle, chunk)?;
/// }
/// updater.end(handle)?;
/// ```
pub struct Updater<'a, F> {
    store: BootConfigStore<F>,
    arena: &'a mut [u8],
    verifier: ImageVerifier,
    config: UpdateConfig,
    active: Option<OtaSession>,
    last: Option<OtaSession>,
    next_id: u32,
    log: LogBuffer,
}

impl<'a, F: FlashInterface> Updater<'a, F> {
    /// Create an updater with the default configuration
    ///
    /// `arena` buffers incoming data; it must be a non-zero multiple of the
    /// sector size or `begin` reports `NoMemory`.
    pub fn new(store: BootConfigStore<F>, arena: &'a mut [u8]) -> Self {
        Self::with_config(store, arena, UpdateConfig::DEFAULT)
    }

    /// Create an updater with an explicit configuration
    pub fn with_config(store: BootConfigStore<F>, arena: &'a mut [u8], config: UpdateConfig) -> Self {
        Self {
            store,
            arena,
            verifier: ImageVerifier::new(),
            config,
            active: None,
            last: None,
            next_id: 1,
            log: LogBuffer::new(),
        }
    }

    /// Start a session targeting `slot`
    ///
    /// `max_size` is the declared image size, used for progress and, when
    /// enforced, as a write limit. Zero means unknown. Writes are always
    /// bounded by the start of the next slot.
    pub fn begin(&mut self, slot: u8, max_size: u32) -> Result<OtaHandle, OtaError> {
        let Some((target_addr, limit)) = self.store.resolve_region(slot) else {
            log_warn!(self.log, MODULE, "begin: slot {} not configured", slot);
            return Err(OtaError::InvalidArgs);
        };

        if self.active.is_some() {
            log_warn!(self.log, MODULE, "begin: session already live");
            return Err(OtaError::InProgress);
        }

        let sector = SECTOR_SIZE as usize;
        if self.arena.is_empty() || self.arena.len() % sector != 0 {
            log_error!(self.log, MODULE, "begin: arena of {} bytes unusable", self.arena.len());
            return Err(OtaError::NoMemory);
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);

        self.active = Some(OtaSession {
            id,
            target_slot: slot,
            target_addr,
            limit,
            total_size: max_size,
            written_size: 0,
            writer: SectorWriter::new(target_addr),
            state: OtaState::Started,
        });

        log_info!(self.log, MODULE, "session {} -> slot {} at {:#x}", id, slot, target_addr);
        Ok(OtaHandle { id })
    }

    /// Append image bytes
    pub fn write(&mut self, handle: OtaHandle, data: &[u8]) -> Result<(), OtaError> {
        if data.is_empty() {
            return Err(OtaError::InvalidArgs);
        }

        let session = match self.active.as_mut() {
            Some(s) if s.id == handle.id => s,
            _ => return Err(OtaError::InvalidArgs),
        };
        if !matches!(session.state, OtaState::Started | OtaState::Writing) {
            return Err(OtaError::InvalidArgs);
        }

        let len = u32::try_from(data.len()).map_err(|_| OtaError::InvalidArgs)?;
        let new_size = session
            .written_size
            .checked_add(len)
            .ok_or(OtaError::InvalidArgs)?;

        if self.config.enforce_declared_size && session.total_size > 0 && new_size > session.total_size {
            log_warn!(self.log, MODULE, "write: {} bytes exceeds declared {}", new_size, session.total_size);
            return Err(OtaError::InvalidArgs);
        }

        // Never spill into the next slot or past the end of flash.
        let fits = session
            .target_addr
            .checked_add(new_size)
            .is_some_and(|end| end <= session.limit);
        if !fits {
            log_warn!(self.log, MODULE, "write: runs past slot end {:#x}", session.limit);
            return Err(OtaError::InvalidArgs);
        }

        session.state = OtaState::Writing;
        match session.writer.push(self.store.flash_mut(), &mut *self.arena, data) {
            Ok(()) => {
                session.written_size = new_size;
                Ok(())
            }
            Err(e) => {
                session.state = OtaState::Error;
                log_error!(self.log, MODULE, "write: {:?} at offset {}", e, session.writer.flushed());
                Err(e)
            }
        }
    }

    /// Finish the session: flush, verify, commit
    ///
    /// The session is released whatever the outcome.
    pub fn end(&mut self, handle: OtaHandle) -> Result<(), OtaError> {
        let session = match self.active.as_mut() {
            Some(s) if s.id == handle.id && s.state == OtaState::Writing => s,
            _ => return Err(OtaError::InvalidArgs),
        };

        let result = Self::finish(
            session,
            &mut self.store,
            &*self.arena,
            &self.verifier,
            &mut self.log,
        );
        session.state = if result.is_ok() {
            OtaState::Complete
        } else {
            OtaState::Error
        };

        self.last = self.active.take();
        result
    }

    fn finish(
        session: &mut OtaSession,
        store: &mut BootConfigStore<F>,
        arena: &[u8],
        verifier: &ImageVerifier,
        log: &mut LogBuffer,
    ) -> Result<(), OtaError> {
        if let Err(e) = session.writer.flush(store.flash_mut(), arena) {
            log_error!(log, MODULE, "end: flush failed: {:?}", e);
            return Err(e);
        }

        session.state = OtaState::Verifying;
        let length = session.writer.total();
        match verifier.verify(store.flash(), session.target_addr, length) {
            Ok(header) => {
                log_info!(log, MODULE, "slot {} verified, entry {:#x}", session.target_slot, header.entry);
            }
            Err(e) => {
                log_error!(log, MODULE, "end: verification failed: {:?}", e);
                return Err(e.into());
            }
        }

        store.set_boot_rom(session.target_slot).map_err(|e: ConfigError| {
            log_error!(log, MODULE, "end: commit failed: {:?}", e);
            OtaError::WriteFailed
        })?;

        log_info!(log, MODULE, "session {} complete, {} bytes", session.id, length);
        Ok(())
    }

    /// Abandon the session
    ///
    /// Does nothing when `handle` is not the live session. Partially written
    /// sectors stay as they are; the boot selection is untouched.
    pub fn cancel(&mut self, handle: OtaHandle) {
        if let Some(session) = self.active.as_mut().filter(|s| s.id == handle.id) {
            session.state = OtaState::Error;
            log_info!(self.log, MODULE, "session {} cancelled", handle.id);
            self.last = self.active.take();
        }
    }

    /// Progress of a session
    ///
    /// The most recently released session stays queryable. Any other
    /// handle reports `Error` with zero progress.
    pub fn status(&self, handle: OtaHandle) -> OtaStatus {
        self.active
            .iter()
            .chain(self.last.iter())
            .find(|s| s.id == handle.id)
            .map_or(
                OtaStatus {
                    state: OtaState::Error,
                    progress: 0,
                },
                OtaSession::status,
            )
    }

    /// Whether a session is live
    pub fn is_in_progress(&self) -> bool {
        self.active.is_some()
    }

    /// Slot selected for the next boot, 0 when the config is unreadable
    pub fn current_rom(&mut self) -> u8 {
        self.store.current_rom()
    }

    /// Select `slot` for the next boot
    pub fn set_boot_rom(&mut self, slot: u8) -> Result<(), ConfigError> {
        self.store.set_boot_rom(slot)
    }

    /// Configuration store
    pub fn store(&self) -> &BootConfigStore<F> {
        &self.store
    }

    /// Session log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Tear down, returning the store and the arena
    pub fn release(self) -> (BootConfigStore<F>, &'a mut [u8]) {
        (self.store, self.arena)
    }
}

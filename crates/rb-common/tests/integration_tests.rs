// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for rb-common
//!
//! Error codes and categories, engine configuration defaults, the log ring
//! buffer, and the on-flash layout constants.

use rb_common::Error;

const ALL_ERRORS: [Error; 14] = [
    Error::InvalidArgs,
    Error::NoMemory,
    Error::UpdateInProgress,
    Error::EraseFailed,
    Error::WriteFailed,
    Error::VerifyFailed,
    Error::ConfigReadFailed,
    Error::ConfigWriteFailed,
    Error::ConfigCorrupted,
    Error::InvalidBootConfig,
    Error::InvalidSlot,
    Error::FlashError,
    Error::ScratchMemoryError,
    Error::GpioError,
];

mod error_tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_codes_unique() {
        let unique: HashSet<u16> = ALL_ERRORS.iter().map(Error::code).collect();
        assert_eq!(unique.len(), ALL_ERRORS.len());
    }

    #[test]
    fn test_error_categories() {
        let category = |e: Error| e.code() & 0xFF00;
        assert_eq!(category(Error::UpdateInProgress), 0x0100);
        assert_eq!(category(Error::VerifyFailed), 0x0100);
        assert_eq!(category(Error::InvalidSlot), 0x0200);
        assert_eq!(category(Error::ScratchMemoryError), 0x0300);
        assert_eq!(category(Error::GpioError), 0x0300);
    }

    #[test]
    fn test_flash_faults() {
        let faults: Vec<Error> = ALL_ERRORS
            .iter()
            .copied()
            .filter(Error::is_flash_fault)
            .collect();
        assert_eq!(
            faults,
            vec![
                Error::EraseFailed,
                Error::WriteFailed,
                Error::ConfigWriteFailed,
                Error::FlashError
            ]
        );
    }

    #[test]
    fn test_error_display() {
        let display = format!("{}", Error::InvalidArgs);
        assert!(display.starts_with("[0x0101] "));
        for e in ALL_ERRORS {
            assert!(!e.description().is_empty());
            assert!(format!("{e}").contains(e.description()));
        }
    }
}

mod config_tests {
    use rb_common::config::{LayoutConfig, ResetConfig, UpdateConfig};
    use rb_common::EngineConfig;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.update, UpdateConfig::DEFAULT);
        assert_eq!(config.reset, ResetConfig::DEFAULT);
        assert_eq!(config.layout, LayoutConfig::DEFAULT);
    }

    #[test]
    fn test_reset_blink_pattern() {
        let reset = ResetConfig::default();
        assert_eq!(reset.blink_count, 5);
        assert_eq!(reset.blink_delay_ms, 100);
    }

    #[test]
    fn test_overrides_are_plain_fields() {
        let config = EngineConfig {
            update: UpdateConfig {
                enforce_declared_size: false,
            },
            ..EngineConfig::DEFAULT
        };
        assert!(!config.update.enforce_declared_size);
        assert_eq!(config.layout.default_flash_size, 0x10_0000);
    }
}

mod log_tests {
    use rb_common::log::{LOG_BUFFER_SIZE, MAX_LOG_MESSAGE_LEN};
    use rb_common::{log_debug, log_error, log_info, log_warn, LogBuffer, LogLevel};

    #[test]
    fn test_macros_record_level_and_module() {
        let mut log = LogBuffer::new();
        log_info!(log, "ota", "session {} started", 7);
        log_warn!(log, "config", "fallback to slot {}", 0);
        log_error!(log, "ota", "erase failed");

        let entries: Vec<_> = log.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].module, "ota");
        assert_eq!(entries[0].message.as_str(), "session 7 started");
        assert_eq!(entries[1].module, "config");
        assert!(log.contains(LogLevel::Error, "erase"));
        assert!(!log.contains(LogLevel::Warn, "erase"));
    }

    #[test]
    fn test_debug_filtered_by_default() {
        let mut log = LogBuffer::new();
        log_debug!(log, "ota", "flushed {} bytes", 4096);
        assert!(log.is_empty());

        log.set_min_level(LogLevel::Debug);
        log_debug!(log, "ota", "flushed {} bytes", 4096);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_ring_keeps_newest() {
        let mut log = LogBuffer::new();
        for i in 0..LOG_BUFFER_SIZE + 4 {
            log_info!(log, "test", "entry {}", i);
        }
        assert_eq!(log.len(), LOG_BUFFER_SIZE);
        let first = log.iter().next().unwrap();
        assert_eq!(first.message.as_str(), "entry 4");
        let seqs: Vec<u32> = log.iter().map(|e| e.seq).collect();
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_long_message_truncated() {
        let mut log = LogBuffer::new();
        let long = "x".repeat(MAX_LOG_MESSAGE_LEN * 2);
        log_info!(log, "test", "{}", long);
        let entry = log.iter().next().unwrap();
        assert_eq!(entry.message.len(), MAX_LOG_MESSAGE_LEN);
    }
}

mod constants_tests {
    use rb_common::constants::*;

    #[test]
    fn test_layout() {
        assert_eq!(BOOT_CONFIG_ADDR, 0x1000);
        assert_eq!(FIRST_IMAGE_ADDR, 0x2000);
        assert_eq!(FIRST_IMAGE_ADDR % SECTOR_SIZE, 0);
        assert_eq!(DEFAULT_FLASH_SIZE % SECTOR_SIZE, 0);
    }

    #[test]
    fn test_record_identity() {
        assert_eq!(BOOT_CONFIG_MAGIC, 0xE1);
        assert_eq!(BOOT_CONFIG_VERSION, 1);
        assert_eq!(CHECKSUM_INIT, 0xEF);
        assert_eq!(ROM_MAGIC, 0xE9);
        assert_eq!(MAX_SLOTS, 4);
    }

    #[test]
    fn test_reset_flag_within_scratch() {
        assert_eq!(FACTORY_RESET_FLAG_OFFSET, 0x180);
        assert_eq!(FACTORY_RESET_FLAG_OFFSET % 4, 0);
        assert!(FACTORY_RESET_FLAG_OFFSET + 4 <= SCRATCH_MEMORY_SIZE);
        assert_eq!(FACTORY_RESET_MAGIC, 0x1AC3_F5E7);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for rb-hal
//!
//! HAL error codes and their mapping into the unified error type, default
//! trait methods, the GPIO-backed LED indicator, and the host doubles used
//! by the engine test suites.

const ALL_HAL_ERRORS: [rb_hal::HalError; 7] = [
    rb_hal::HalError::FlashReadFailed,
    rb_hal::HalError::FlashEraseFailed,
    rb_hal::HalError::FlashWriteFailed,
    rb_hal::HalError::FlashOutOfBounds,
    rb_hal::HalError::ScratchOutOfBounds,
    rb_hal::HalError::ScratchMisaligned,
    rb_hal::HalError::GpioError,
];

mod error_tests {
    use super::ALL_HAL_ERRORS;
    use rb_hal::HalError;
    use std::collections::HashSet;

    #[test]
    fn test_error_codes_unique() {
        let unique: HashSet<u16> = ALL_HAL_ERRORS.iter().map(HalError::code).collect();
        assert_eq!(unique.len(), ALL_HAL_ERRORS.len());
    }

    #[test]
    fn test_error_codes_in_hal_range() {
        for e in ALL_HAL_ERRORS {
            assert_eq!(e.code() & 0xFF00, 0x0300, "{e:?}");
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", HalError::FlashEraseFailed),
            "[0x0312] flash erase failed"
        );
    }
}

mod error_conversion_tests {
    use rb_common::Error;
    use rb_hal::HalError;

    #[test]
    fn test_flash_errors_convert() {
        assert_eq!(Error::from(HalError::FlashEraseFailed), Error::EraseFailed);
        assert_eq!(Error::from(HalError::FlashWriteFailed), Error::WriteFailed);
        assert_eq!(Error::from(HalError::FlashReadFailed), Error::FlashError);
        assert_eq!(Error::from(HalError::FlashOutOfBounds), Error::FlashError);
    }

    #[test]
    fn test_other_errors_convert() {
        assert_eq!(Error::from(HalError::ScratchOutOfBounds), Error::ScratchMemoryError);
        assert_eq!(Error::from(HalError::ScratchMisaligned), Error::ScratchMemoryError);
        assert_eq!(Error::from(HalError::GpioError), Error::GpioError);
    }

    #[test]
    fn test_question_mark_converts() {
        fn erase() -> Result<(), Error> {
            Err(HalError::FlashEraseFailed)?;
            Ok(())
        }
        assert_eq!(erase(), Err(Error::EraseFailed));
    }
}

mod trait_default_tests {
    //! A minimal driver only implements the required methods; the defaults
    //! supply the rest.

    use rb_hal::error::HalResult;
    use rb_hal::{DelayInterface, FlashInterface, ScratchMemoryInterface};

    struct RomFlash {
        bytes: [u8; 0x4000],
    }

    impl FlashInterface for RomFlash {
        fn capacity(&self) -> u32 {
            self.bytes.len() as u32
        }
        fn read(&self, address: u32, buffer: &mut [u8]) -> HalResult<()> {
            let start = address as usize;
            buffer.copy_from_slice(&self.bytes[start..start + buffer.len()]);
            Ok(())
        }
        fn write(&mut self, _address: u32, _data: &[u8]) -> HalResult<()> {
            Ok(())
        }
        fn erase_sector(&mut self, _index: u32) -> HalResult<()> {
            Ok(())
        }
    }

    struct WordScratch {
        words: [u8; 16],
    }

    impl ScratchMemoryInterface for WordScratch {
        fn read(&self, offset: u32, buffer: &mut [u8]) -> HalResult<()> {
            let start = offset as usize;
            buffer.copy_from_slice(&self.words[start..start + buffer.len()]);
            Ok(())
        }
        fn write(&mut self, offset: u32, data: &[u8]) -> HalResult<()> {
            let start = offset as usize;
            self.words[start..start + data.len()].copy_from_slice(data);
            Ok(())
        }
    }

    struct CountingDelay(u64);

    impl DelayInterface for CountingDelay {
        fn delay_us(&mut self, us: u32) {
            self.0 += u64::from(us);
        }
    }

    #[test]
    fn test_flash_defaults() {
        let mut bytes = [0xFFu8; 0x4000];
        bytes[..4].copy_from_slice(&[0x40, 0x20, 0x16, 0xEF]);
        let flash = RomFlash { bytes };
        assert_eq!(flash.sector_count(), 4);
        assert_eq!(flash.identity(), Ok(0xEF16_2040));
    }

    #[test]
    fn test_scratch_word_defaults() {
        let mut scratch = WordScratch { words: [0; 16] };
        scratch.write_word(8, 0x1AC3_F5E7).unwrap();
        assert_eq!(&scratch.words[8..12], &[0xE7, 0xF5, 0xC3, 0x1A]);
        assert_eq!(scratch.read_word(8), Ok(0x1AC3_F5E7));
    }

    #[test]
    fn test_delay_ms_default() {
        let mut delay = CountingDelay(0);
        delay.delay_ms(100);
        assert_eq!(delay.0, 100_000);
    }
}

mod indicator_tests {
    use rb_hal::sim::{SimDelay, SimPin};
    use rb_hal::{LedIndicator, Polarity, StatusIndicator};

    #[test]
    fn test_active_high() {
        let mut led = LedIndicator::new(SimPin::default(), SimDelay::default(), Polarity::ActiveHigh);
        led.init();
        led.on();
        led.off();
        let (pin, _) = led.release();
        assert!(pin.output);
        assert_eq!(pin.levels, vec![false, true, false]);
    }

    #[test]
    fn test_active_low() {
        let mut led = LedIndicator::new(SimPin::default(), SimDelay::default(), Polarity::ActiveLow);
        led.init();
        led.on();
        let (pin, _) = led.release();
        assert_eq!(pin.levels, vec![true, false]);
        assert_eq!(pin.level(), Some(false));
    }

    #[test]
    fn test_blink_pattern_and_timing() {
        let mut led = LedIndicator::new(SimPin::default(), SimDelay::default(), Polarity::ActiveHigh);
        led.init();
        led.blink(5, 100);
        let (pin, delay) = led.release();

        // init low, then on/off per blink
        assert_eq!(pin.levels.len(), 1 + 2 * 5);
        assert_eq!(pin.level(), Some(false));
        // five on-times and four gaps
        assert_eq!(delay.total_us, 9 * 100_000);
    }

    #[test]
    fn test_blink_zero_is_noop() {
        let mut led = LedIndicator::new(SimPin::default(), SimDelay::default(), Polarity::ActiveHigh);
        led.init();
        led.blink(0, 100);
        let (pin, delay) = led.release();
        assert_eq!(pin.levels, vec![false]);
        assert_eq!(delay.total_us, 0);
    }

    #[test]
    fn test_gpio_failure_swallowed() {
        // Never initialised: the pin rejects every level change.
        let mut led = LedIndicator::new(SimPin::default(), SimDelay::default(), Polarity::ActiveHigh);
        led.on();
        led.blink(2, 10);
        let (pin, delay) = led.release();
        assert!(pin.levels.is_empty());
        assert_eq!(delay.total_us, 3 * 10_000);
    }
}

mod sim_tests {
    use rb_common::constants::SECTOR_SIZE;
    use rb_hal::sim::{FlashOp, IndicatorEvent, SimFlash, SimIndicator, SimReboot, REBOOT_PANIC};
    use rb_hal::{FlashInterface, RebootInterface, StatusIndicator};

    #[test]
    fn test_fresh_flash_is_erased() {
        let flash = SimFlash::new(2 * SECTOR_SIZE);
        assert_eq!(flash.capacity(), 2 * SECTOR_SIZE);
        assert!(flash.contents(0, 2 * SECTOR_SIZE as usize).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_ops_recorded_in_order() {
        let mut flash = SimFlash::new(4 * SECTOR_SIZE);
        flash.erase_sector(1).unwrap();
        flash.write(SECTOR_SIZE, &[1, 2, 3]).unwrap();
        assert_eq!(
            flash.ops(),
            &[
                FlashOp::Erase { sector: 1 },
                FlashOp::Write { address: SECTOR_SIZE, len: 3 }
            ]
        );
        flash.clear_ops();
        assert!(flash.ops().is_empty());
        assert_eq!(flash.contents(SECTOR_SIZE, 3), &[1, 2, 3]);
    }

    #[test]
    fn test_preload_bypasses_log() {
        let mut flash = SimFlash::new(SECTOR_SIZE);
        flash.preload(0, &[0x00, 0x11]);
        assert!(flash.ops().is_empty());
        let mut buf = [0u8; 2];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x11]);
    }

    #[test]
    fn test_indicator_state() {
        let mut indicator = SimIndicator::new();
        assert!(!indicator.is_on());
        indicator.init();
        indicator.on();
        assert!(indicator.is_on());
        indicator.blink(3, 50);
        assert!(!indicator.is_on());
        assert_eq!(
            indicator.events.last(),
            Some(&IndicatorEvent::Blink { count: 3, delay_ms: 50 })
        );
    }

    #[test]
    fn test_reboot_traps() {
        let result = std::panic::catch_unwind(|| {
            let mut reboot = SimReboot;
            reboot.restart();
        });
        let payload = result.unwrap_err();
        let message = payload
            .downcast_ref::<String>()
            .map(String::as_str)
            .unwrap_or_default();
        assert_eq!(message, REBOOT_PANIC);
    }
}

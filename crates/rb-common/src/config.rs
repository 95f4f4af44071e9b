// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Engine configuration
//!
//! Build-time tunables of the update engine. Values are fixed when the
//! bootloader is linked; nothing here is persisted.

use crate::constants::DEFAULT_FLASH_SIZE;

/// Engine-wide configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Update session configuration
    pub update: UpdateConfig,
    /// Factory reset configuration
    pub reset: ResetConfig,
    /// Flash layout configuration
    pub layout: LayoutConfig,
}

impl EngineConfig {
    /// Default configuration
    pub const DEFAULT: Self = Self {
        update: UpdateConfig::DEFAULT,
        reset: ResetConfig::DEFAULT,
        layout: LayoutConfig::DEFAULT,
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Update session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Reject writes past the size declared at `begin` (when non-zero)
    pub enforce_declared_size: bool,
}

impl UpdateConfig {
    /// Default update configuration
    pub const DEFAULT: Self = Self {
        enforce_declared_size: true,
    };
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Factory reset configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetConfig {
    /// Number of confirmation blinks before the reset is applied
    pub blink_count: u8,
    /// On and off time of each confirmation blink
    pub blink_delay_ms: u32,
}

impl ResetConfig {
    /// Default factory reset configuration
    pub const DEFAULT: Self = Self {
        blink_count: 5,
        blink_delay_ms: 100,
    };
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Flash layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Flash size used when the device cannot be identified
    pub default_flash_size: u32,
}

impl LayoutConfig {
    /// Default layout configuration
    pub const DEFAULT: Self = Self {
        default_flash_size: DEFAULT_FLASH_SIZE,
    };
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

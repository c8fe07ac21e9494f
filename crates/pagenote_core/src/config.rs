//! Document handling configuration.
//!
//! # Invariants
//! - Extension pages never use the main-sequence tag.
//! - Snapshot interval stays within `MIN_SNAPSHOT_INTERVAL_MS..=MAX_SNAPSHOT_INTERVAL_MS`.

use crate::graph::flatten::{FlattenOptions, OwnerLinkMode};
use crate::model::node::{DEFAULT_EXTENSION_TAG, MAIN_TAG};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_SNAPSHOT_INTERVAL_MS: u64 = 200;
pub const MIN_SNAPSHOT_INTERVAL_MS: u64 = 50;
pub const MAX_SNAPSHOT_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidExtensionTag(i32),
    SnapshotIntervalOutOfRange(Duration),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExtensionTag(tag) => {
                write!(f, "extension tag must differ from main tag {MAIN_TAG}, got {tag}")
            }
            Self::SnapshotIntervalOutOfRange(interval) => write!(
                f,
                "snapshot interval {}ms outside {MIN_SNAPSHOT_INTERVAL_MS}..={MAX_SNAPSHOT_INTERVAL_MS}ms",
                interval.as_millis()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Settings for loading, editing and saving one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Owner resolution used when saving extension chains.
    pub owner_link_mode: OwnerLinkMode,
    /// Tag stamped on newly created extension pages.
    pub extension_tag: i32,
    /// Period of the host's canvas capture task.
    pub snapshot_interval: Duration,
    /// Open a synthesized document instead of failing on undecodable bytes.
    pub fallback_on_decode_error: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            owner_link_mode: OwnerLinkMode::default(),
            extension_tag: DEFAULT_EXTENSION_TAG,
            snapshot_interval: Duration::from_millis(DEFAULT_SNAPSHOT_INTERVAL_MS),
            fallback_on_decode_error: true,
        }
    }
}

impl DocumentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension_tag == MAIN_TAG {
            return Err(ConfigError::InvalidExtensionTag(self.extension_tag));
        }
        let millis = self.snapshot_interval.as_millis();
        if millis < u128::from(MIN_SNAPSHOT_INTERVAL_MS)
            || millis > u128::from(MAX_SNAPSHOT_INTERVAL_MS)
        {
            return Err(ConfigError::SnapshotIntervalOutOfRange(
                self.snapshot_interval,
            ));
        }
        Ok(())
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            owner_link_mode: self.owner_link_mode,
        }
    }
}

/// Clamps a host-supplied snapshot interval. `None` and `0` mean default.
pub fn normalize_snapshot_interval_ms(value: Option<u64>) -> u64 {
    match value {
        None | Some(0) => DEFAULT_SNAPSHOT_INTERVAL_MS,
        Some(ms) => ms.clamp(MIN_SNAPSHOT_INTERVAL_MS, MAX_SNAPSHOT_INTERVAL_MS),
    }
}

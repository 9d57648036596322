// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Boot-time configuration of the interrupt layer (TOML)
//! OWNERS: @kernel-team
//! PUBLIC API: IrqConfig (from_toml_str/load), ConfigError
//! DEPENDS_ON: serde, toml
//! INVARIANTS: Every key is optional; unknown keys are rejected
//!
//! ```toml
//! tick_threshold = 4      # slice boundary on the 5th tick
//! io_mailbox_slots = 1    # buffered status words per device instance
//! debug = false           # per-interrupt trace
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tick::DEFAULT_TICK_THRESHOLD;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`IrqConfig`].
    #[error("failed to parse config {path}: {source}")]
    ParseFile {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
    /// An in-memory document is not valid TOML for [`IrqConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables of the interrupt layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IrqConfig {
    /// Clock ticks counted before the next one is a slice boundary.
    pub tick_threshold: u32,
    /// Slot capacity of every I/O mailbox; 0 means hand-off only.
    pub io_mailbox_slots: usize,
    /// Emit a trace line for every interrupt.
    pub debug: bool,
}

impl IrqConfig {
    /// Default slot capacity of each I/O mailbox.
    pub const DEFAULT_IO_MAILBOX_SLOTS: usize = 1;

    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }
}

impl Default for IrqConfig {
    fn default() -> Self {
        Self {
            tick_threshold: DEFAULT_TICK_THRESHOLD,
            io_mailbox_slots: Self::DEFAULT_IO_MAILBOX_SLOTS,
            debug: false,
        }
    }
}

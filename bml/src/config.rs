// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Session configuration.
//!
//! [`SessionConfig`] gathers the values a host supplies when it creates an
//! input session: how many channels to buffer, how deep each buffer is, which
//! stream to look for, and the collaborator timeouts. Every field has a
//! default, so a JSON document only needs to name what it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, stream::StreamFilter};

/// Default number of buffered channels.
pub const DEFAULT_CHANNEL_COUNT: usize = 8;

/// Default per-channel buffer depth in samples.
pub const DEFAULT_BUFFER_CAPACITY: usize = 2000;

/// Default declared source rate in Hz.
pub const DEFAULT_SOURCE_RATE: f64 = 512.0;

/// Configuration of an input session.
///
/// # Examples
///
/// ```
/// use bml::config::SessionConfig;
///
/// # fn main() -> Result<(), bml::Error> {
/// let config = SessionConfig::from_json(r#"{ "channel_count": 4 }"#)?;
/// assert_eq!(config.channel_count, 4);
/// assert_eq!(config.buffer_capacity, 2000);
/// assert_eq!(config.filter.value, "EEG");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of channels buffered; stream channels beyond it are ignored.
    pub channel_count: usize,

    /// Samples retained per channel.
    pub buffer_capacity: usize,

    /// Declared source rate used when resampling.
    pub source_rate: f64,

    /// Discovery filter.
    pub filter: StreamFilter,

    /// How long discovery may wait for candidates, in milliseconds.
    pub resolve_timeout_ms: u64,

    /// Upper bound of one blocking pull, in milliseconds. Also bounds how long
    /// a stop request waits for the ingest loop.
    pub pull_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            channel_count: DEFAULT_CHANNEL_COUNT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            source_rate: DEFAULT_SOURCE_RATE,
            filter: StreamFilter::default(),
            resolve_timeout_ms: 1000,
            pull_timeout_ms: 200,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the document is malformed
    /// - any error returned by [`Self::validate`]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that cannot describe a working session.
    ///
    /// Nothing is coerced: a zero channel count or a non-positive rate is an error.
    pub fn validate(&self) -> Result<()> {
        if self.channel_count == 0 {
            return Err(Error::InvalidChannelCount(self.channel_count));
        }
        if self.buffer_capacity == 0 {
            return Err(Error::InvalidCapacity(self.buffer_capacity));
        }
        Error::check_rate("source", self.source_rate)?;
        if self.pull_timeout_ms == 0 {
            return Err(Error::InvalidTimeout {
                which: "pull",
                millis: self.pull_timeout_ms,
            });
        }
        Ok(())
    }

    /// Discovery timeout as a [`Duration`].
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Pull timeout as a [`Duration`].
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_millis(self.pull_timeout_ms)
    }
}

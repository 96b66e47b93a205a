// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for BML operations.
//!
//! Configuration problems are rejected when a component is constructed.
//! Everything on the audio-rate path (buffer reads, resampling, rendering)
//! degrades gracefully instead of returning an error, so the variants below
//! only ever surface from constructors, the stream collaborator, and the
//! ingest controller.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when configuring or driving the stream bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A buffer bank was requested with no channels.
    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    /// A channel buffer was requested with no storage.
    #[error("Invalid buffer capacity: {0}")]
    InvalidCapacity(usize),

    /// A sample rate was zero, negative or not finite.
    #[error("Invalid {which} rate: {rate}")]
    InvalidRate {
        /// Which side of the conversion the rate belongs to.
        which: &'static str,
        /// The rejected value.
        rate: f64,
    },

    /// A collaborator timeout was zero.
    #[error("Invalid {which} timeout: {millis} ms")]
    InvalidTimeout {
        /// Which timeout was rejected.
        which: &'static str,
        /// The rejected value in milliseconds.
        millis: u64,
    },

    /// Stream discovery returned no candidates for the filter.
    #[error("No stream found with {property}={value}")]
    NoStreamFound {
        /// Metadata property the filter matched on.
        property: String,
        /// Expected property value.
        value: String,
    },

    /// The stream collaborator could not open a discovered candidate.
    #[error("Failed to open stream: {0}")]
    Open(String),

    /// The stream collaborator failed while pulling a sample.
    #[error("Failed to pull sample: {0}")]
    Pull(String),

    /// An operation needed an active stream connection and there was none.
    #[error("Stream is not running")]
    NotRunning,

    /// A configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The ingest thread could not be spawned.
    #[error("Spawning ingest thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A generic error for failures not covered by the other variants.
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Checks that a sample rate is strictly positive and finite.
    ///
    /// `which` names the rate in the resulting error (`"source"`, `"target"`).
    pub fn check_rate(which: &'static str, rate: f64) -> Result<f64> {
        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(Error::InvalidRate { which, rate })
        }
    }
}

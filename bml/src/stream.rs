// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Stream collaborator interfaces.
//!
//! Discovery, handshake and transport of the multichannel network stream are
//! owned by an external library (for example a Lab Streaming Layer binding).
//! The ingest loop only needs the small surface defined here:
//!
//! - [`StreamResolver`]: finds candidate streams matching a [`StreamFilter`]
//!   and opens one of them
//! - [`StreamInlet`]: an open connection that yields one multichannel sample
//!   per pull
//!
//! [`synthetic`] provides an in-process implementation generating test tones.

pub mod synthetic;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Metadata filter used during discovery, e.g. `type` = `EEG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFilter {
    /// Metadata property to match.
    pub property: String,
    /// Required value of the property.
    pub value: String,
}

impl StreamFilter {
    /// Creates a filter matching `property == value`.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Checks whether `info` satisfies this filter.
    ///
    /// Known properties are `name`, `type`, `source_id` and `uid`; any other
    /// property never matches.
    pub fn matches(&self, info: &StreamInfo) -> bool {
        let actual = match self.property.as_str() {
            "name" => &info.name,
            "type" => &info.stream_type,
            "source_id" => &info.source_id,
            "uid" => &info.uid,
            _ => return false,
        };
        *actual == self.value
    }
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new("type", "EEG")
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.property, self.value)
    }
}

/// Description of a discoverable stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Human readable stream name.
    pub name: String,
    /// Content type, e.g. `EEG`.
    pub stream_type: String,
    /// Number of channels per sample.
    pub channel_count: usize,
    /// Declared sampling rate in Hz; `0.0` for irregular streams.
    pub nominal_rate: f64,
    /// Identifier of the producing device, may be empty.
    pub source_id: String,
    /// Unique identifier of this stream instance.
    pub uid: String,
}

/// Discovery side of the stream collaborator.
pub trait StreamResolver: Send + Sync + 'static {
    /// Connection type produced by [`Self::open`].
    type Inlet: StreamInlet;

    /// Returns every stream matching `filter`, waiting at most `timeout`.
    ///
    /// An empty result is not an error.
    fn find_streams(&self, filter: &StreamFilter, timeout: Duration) -> Result<Vec<StreamInfo>>;

    /// Opens a connection to a previously discovered stream.
    ///
    /// Fails with [`crate::Error::Open`] if the candidate is stale or unreachable.
    fn open(&self, info: &StreamInfo) -> Result<Self::Inlet>;
}

/// An open connection to a stream.
pub trait StreamInlet: Send + 'static {
    /// Metadata of the connected stream.
    fn info(&self) -> &StreamInfo;

    /// Pulls one multichannel sample into `values`, waiting at most `timeout`.
    ///
    /// `values` is cleared and refilled with one value per channel. Returns the
    /// sample timestamp in seconds, or `Ok(None)` if nothing arrived in time.
    fn pull_sample(&mut self, values: &mut Vec<f32>, timeout: Duration) -> Result<Option<f64>>;
}

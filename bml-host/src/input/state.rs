// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Settings and replies of the input object.

use std::fmt;

use bml::{StreamFilter, config::SessionConfig};

/// Default number of channel outlets.
pub(crate) const DEFAULT_CHANNEL_COUNT: usize = bml::config::DEFAULT_CHANNEL_COUNT;

/// Default per-channel buffer depth.
pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = bml::config::DEFAULT_BUFFER_CAPACITY;

/// Reply sent on the info outlet when no stream is connected.
pub const NOT_RUNNING_MESSAGE: &str = "LSL is not running.";

/// User-configurable settings for the input object.
///
/// Fixed at creation; the channel count is the object's first argument.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    /// Number of channel outlets and buffers
    pub channel_count: usize,

    /// Samples retained per channel between bangs
    pub buffer_capacity: usize,

    /// Stream discovery filter
    pub filter: StreamFilter,
}

impl Default for InputSettings {
    fn default() -> Self {
        InputSettings {
            channel_count: DEFAULT_CHANNEL_COUNT,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            filter: StreamFilter::default(),
        }
    }
}

impl InputSettings {
    /// Settings for an object created with `channel_count` as its argument.
    pub fn with_channels(channel_count: usize) -> Self {
        InputSettings {
            channel_count,
            ..Self::default()
        }
    }

    /// Session configuration for the ingest controller.
    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            channel_count: self.channel_count,
            buffer_capacity: self.buffer_capacity,
            filter: self.filter.clone(),
            ..SessionConfig::default()
        }
    }
}

/// Reply to an info query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfoReply<T> {
    /// The queried value of the connected stream.
    Value(T),
    /// No stream is connected.
    NotRunning,
}

impl<T> InfoReply<T> {
    /// The value, if a stream is connected.
    pub fn value(self) -> Option<T> {
        match self {
            InfoReply::Value(value) => Some(value),
            InfoReply::NotRunning => None,
        }
    }
}

impl<T> From<Option<T>> for InfoReply<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(InfoReply::NotRunning, InfoReply::Value)
    }
}

/// Formats the reply as it appears on the info outlet.
impl<T: fmt::Display> fmt::Display for InfoReply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoReply::Value(value) => write!(f, "{value}"),
            InfoReply::NotRunning => f.write_str(NOT_RUNNING_MESSAGE),
        }
    }
}

// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Per-channel buffer collection.

use std::ops::Index;

use crate::{ChannelBuffer, Error, Result};

/// Ordered set of [`ChannelBuffer`]s, one per stream channel.
///
/// The number of channels is fixed at construction. The bank is shared between
/// the ingest loop (writer) and the consumer (reader) behind an `Arc`.
///
/// # Examples
///
/// ```
/// use bml::BufferBank;
///
/// # fn main() -> Result<(), bml::Error> {
/// let bank = BufferBank::new(2, 16)?;
///
/// // The stream reports three channels; the third is ignored.
/// bank.write_frame(&[0.1, 0.2, 0.3]);
///
/// assert_eq!(bank[0].read_new(), vec![0.1]);
/// assert_eq!(bank[1].read_new(), vec![0.2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BufferBank {
    channels: Vec<ChannelBuffer>,
}

impl BufferBank {
    /// Allocates `channel_count` buffers of `capacity` samples each.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidChannelCount`] if `channel_count` is zero
    /// - [`Error::InvalidCapacity`] if `capacity` is zero
    pub fn new(channel_count: usize, capacity: usize) -> Result<Self> {
        if channel_count == 0 {
            return Err(Error::InvalidChannelCount(channel_count));
        }
        let channels = (0..channel_count)
            .map(|_| ChannelBuffer::new(capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { channels })
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always `false`: a bank has at least one channel.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Per-channel capacity in samples.
    pub fn capacity(&self) -> usize {
        self.channels[0].capacity()
    }

    /// Returns the buffer for `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.len()`. The channel count never changes after
    /// construction, so an out-of-range index is a caller bug.
    pub fn channel(&self, channel: usize) -> &ChannelBuffer {
        match self.channels.get(channel) {
            Some(buffer) => buffer,
            None => panic!(
                "channel index {channel} out of range for a bank of {} channel(s)",
                self.channels.len()
            ),
        }
    }

    /// Returns the buffer for `channel`, or `None` if out of range.
    pub fn get(&self, channel: usize) -> Option<&ChannelBuffer> {
        self.channels.get(channel)
    }

    /// Iterates over the channel buffers in channel order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChannelBuffer> {
        self.channels.iter()
    }

    /// Writes one multichannel sample, value `i` into channel `i`.
    ///
    /// Values beyond the channel count are ignored; channels without a value
    /// are left unwritten for this frame. Returns the number of channels written.
    pub fn write_frame(&self, values: &[f32]) -> usize {
        let mut written = 0;
        for (buffer, value) in self.channels.iter().zip(values) {
            buffer.write(*value);
            written += 1;
        }
        written
    }

    /// Drains the raw cursor of every channel, in channel order.
    pub fn read_new_all(&self) -> Vec<Vec<f32>> {
        self.channels.iter().map(ChannelBuffer::read_new).collect()
    }
}

impl Index<usize> for BufferBank {
    type Output = ChannelBuffer;

    fn index(&self, channel: usize) -> &ChannelBuffer {
        self.channel(channel)
    }
}

impl<'a> IntoIterator for &'a BufferBank {
    type Item = &'a ChannelBuffer;
    type IntoIter = std::slice::Iter<'a, ChannelBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

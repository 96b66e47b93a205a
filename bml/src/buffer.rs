// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Lock-free single-channel sample ring.
//!
//! [`ChannelBuffer`] holds the most recent `capacity` samples of one stream
//! channel. It is written by exactly one producer (the ingest loop) and read
//! through two independent cursors:
//!
//! - the *raw* cursor, drained by [`ChannelBuffer::read_new`] for event-driven
//!   delivery of everything that arrived since the last poll;
//! - the *resample* cursor, drained by [`ChannelBuffer::read`] /
//!   [`ChannelBuffer::read_into`] in fixed-size pulls from the audio clock.
//!
//! Each cursor must have at most one reader. The two cursors never affect each
//! other, so both consumption modes can run on the same channel at once.
//!
//! # Overwrite semantics
//!
//! Writes never block. Once a reader falls more than `capacity` samples behind
//! the writer, the oldest unread samples are silently skipped.
//!
//! # Consistency
//!
//! Samples are stored in atomic slots, so a reader can never observe a torn
//! value. The writer announces every burst in `claimed` before touching any
//! slot and publishes it in `committed` afterwards. A reader copies its window
//! first and re-checks `claimed` afterwards; any copied sample whose slot may
//! have been recycled during the copy is discarded rather than delivered.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering, fence},
};

use atomic_float::AtomicF32;

use crate::{Error, Result};

/// Fixed-capacity overwrite-on-full ring buffer for one channel of `f32` samples.
///
/// # Thread Safety
///
/// `ChannelBuffer` is `Send + Sync` and is normally shared behind an `Arc`
/// (see [`crate::BufferBank`]). The single-writer / single-reader-per-cursor
/// contract is not enforced by the type system: two concurrent writers, or
/// two concurrent readers of the same cursor, lose samples.
///
/// # Examples
///
/// ```
/// use bml::ChannelBuffer;
///
/// # fn main() -> Result<(), bml::Error> {
/// let buffer = ChannelBuffer::new(4)?;
/// buffer.write_many(&[1.0, 2.0, 3.0, 4.0, 5.0]);
///
/// // The oldest sample was overwritten.
/// assert_eq!(buffer.read_new(), vec![2.0, 3.0, 4.0, 5.0]);
/// assert!(buffer.read_new().is_empty());
///
/// // The resampling cursor is independent of the raw cursor.
/// assert_eq!(buffer.read(3), vec![2.0, 3.0, 4.0]);
/// # Ok(())
/// # }
/// ```
pub struct ChannelBuffer {
    slots: Box<[AtomicF32]>,
    /// End of the burst the writer is about to store (or has stored).
    claimed: AtomicU64,
    /// End of the last burst visible to readers.
    committed: AtomicU64,
    raw_cursor: AtomicU64,
    resample_cursor: AtomicU64,
}

impl ChannelBuffer {
    /// Creates a buffer retaining the last `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let slots = (0..capacity)
            .map(|_| AtomicF32::new(0.0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self {
            slots,
            claimed: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            raw_cursor: AtomicU64::new(0),
            resample_cursor: AtomicU64::new(0),
        })
    }

    /// Number of samples retained.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Total number of samples ever written.
    pub fn total_written(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    /// Samples a call to [`Self::read_new`] would currently return.
    pub fn unread_new(&self) -> usize {
        self.unread(&self.raw_cursor)
    }

    /// Samples currently available to [`Self::read`].
    pub fn unread_resample(&self) -> usize {
        self.unread(&self.resample_cursor)
    }

    /// Appends one sample, overwriting the oldest one if the buffer is full.
    pub fn write(&self, sample: f32) {
        // Single writer: nobody else moves `committed`.
        let index = self.committed.load(Ordering::Relaxed);
        self.claimed.store(index + 1, Ordering::Relaxed);
        fence(Ordering::Release);
        self.slot(index).store(sample, Ordering::Relaxed);
        self.committed.store(index + 1, Ordering::Release);
    }

    /// Appends a burst of samples.
    ///
    /// Equivalent to calling [`Self::write`] for each value, except that
    /// readers observe either none or all of the burst.
    pub fn write_many(&self, values: &[f32]) {
        if values.is_empty() {
            return;
        }
        let start = self.committed.load(Ordering::Relaxed);
        let end = start + values.len() as u64;
        self.claimed.store(end, Ordering::Relaxed);
        fence(Ordering::Release);
        // Only the tail of an oversized burst survives.
        let skip = values.len().saturating_sub(self.capacity());
        for (offset, value) in values.iter().enumerate().skip(skip) {
            self.slot(start + offset as u64)
                .store(*value, Ordering::Relaxed);
        }
        self.committed.store(end, Ordering::Release);
    }

    /// Returns every sample written since the previous call, oldest first.
    ///
    /// At most [`Self::capacity`] samples are returned. Returns an empty
    /// vector when nothing new has arrived.
    pub fn read_new(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.unread_new());
        self.read_new_into(&mut out);
        out
    }

    /// Appends every sample written since the previous call to `out`.
    ///
    /// Returns the number of samples appended. Reuses `out`'s allocation, so a
    /// caller that keeps the vector around does not allocate in steady state.
    pub fn read_new_into(&self, out: &mut Vec<f32>) -> usize {
        let (start, end) = self.window(&self.raw_cursor, usize::MAX);
        let base = out.len();
        out.resize(base + (end - start) as usize, 0.0);
        let lost = self.copy_validated(start, &mut out[base..]);
        out.drain(base..base + lost);
        self.raw_cursor.store(end, Ordering::Relaxed);
        out.len() - base
    }

    /// Consumes up to `n` samples from the resampling cursor.
    ///
    /// Returns fewer than `n` samples when fewer are available.
    pub fn read(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n.min(self.unread_resample())];
        let read = self.read_into(&mut out);
        out.truncate(read);
        out
    }

    /// Fills the front of `out` from the resampling cursor without allocating.
    ///
    /// Returns the number of samples written to `out`; the remainder of `out`
    /// is left untouched.
    pub fn read_into(&self, out: &mut [f32]) -> usize {
        let (start, end) = self.window(&self.resample_cursor, out.len());
        let count = (end - start) as usize;
        let lost = self.copy_validated(start, &mut out[..count]);
        if lost > 0 {
            out.copy_within(lost..count, 0);
        }
        self.resample_cursor.store(end, Ordering::Relaxed);
        count - lost
    }

    fn slot(&self, index: u64) -> &AtomicF32 {
        &self.slots[(index % self.slots.len() as u64) as usize]
    }

    fn unread(&self, cursor: &AtomicU64) -> usize {
        let (start, end) = self.window(cursor, usize::MAX);
        (end - start) as usize
    }

    /// Readable range `[start, end)` for `cursor`, at most `limit` samples long.
    fn window(&self, cursor: &AtomicU64, limit: usize) -> (u64, u64) {
        let head = self.committed.load(Ordering::Acquire);
        let oldest = head.saturating_sub(self.capacity() as u64);
        let start = cursor.load(Ordering::Relaxed).max(oldest);
        let end = head.min(start.saturating_add(limit as u64));
        (start, end)
    }

    /// Copies samples starting at absolute index `start` into `dst`.
    ///
    /// Returns how many leading samples of `dst` must be discarded because the
    /// writer may have recycled their slots while they were being copied.
    fn copy_validated(&self, start: u64, dst: &mut [f32]) -> usize {
        for (offset, value) in dst.iter_mut().enumerate() {
            *value = self.slot(start + offset as u64).load(Ordering::Relaxed);
        }
        fence(Ordering::Acquire);
        let claimed = self.claimed.load(Ordering::Relaxed);
        let valid_from = claimed.saturating_sub(self.capacity() as u64);
        (valid_from.saturating_sub(start) as usize).min(dst.len())
    }
}

impl fmt::Debug for ChannelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBuffer")
            .field("capacity", &self.capacity())
            .field("total_written", &self.total_written())
            .field("unread_new", &self.unread_new())
            .field("unread_resample", &self.unread_resample())
            .finish()
    }
}

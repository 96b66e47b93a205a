// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-size block rendering on the audio clock.
//!
//! [`BlockRenderer`] turns the variable supply of source-rate samples held in
//! channel buffers into exactly `frames` target-rate samples per audio tick.
//!
//! ## Per-block schedule
//! 1. Emit converted samples left over from the previous tick (the carry).
//! 2. While frames are missing, request `round(source_rate * missing /
//!    target_rate)` source samples (at least one) through the buffer's
//!    resampling cursor, resample them, emit what fits and keep the surplus
//!    in the carry.
//! 3. Only when the buffer runs dry is the remaining gap filled with the
//!    last known value (hold-last).
//!
//! Rendering never fails and never blocks.

use std::collections::VecDeque;

use tracing::trace;

use crate::{BufferBank, ChannelBuffer, Resampler, Result, source_samples_for};

/// Per-output-channel conversion state.
#[derive(Debug)]
struct ChannelState {
    resampler: Resampler,
    /// Scratch for source samples pulled from the buffer.
    source: Vec<f32>,
    /// Scratch for converted samples.
    converted: Vec<f32>,
    /// Converted samples not yet emitted.
    carry: VecDeque<f32>,
    /// Output samples held because the buffer ran dry.
    underrun_samples: u64,
}

/// Renders fixed-size output blocks from channel buffers, one resampler per channel.
///
/// Scratch storage grows to fit the largest block seen and is then reused, so
/// a renderer driven with a constant block size stops allocating after the
/// first tick.
///
/// # Examples
///
/// ```
/// use bml::{BlockRenderer, BufferBank};
///
/// # fn main() -> Result<(), bml::Error> {
/// let bank = BufferBank::new(1, 2000)?;
/// bank[0].write_many(&[0.25; 32]);
///
/// let mut renderer = BlockRenderer::new(512.0, 44_100.0, 1)?;
/// let mut block = [0.0f32; 64];
/// renderer.render(&bank, &mut [&mut block[..]]);
///
/// assert!(block.iter().all(|v| *v == 0.25));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BlockRenderer {
    source_rate: f64,
    target_rate: f64,
    channels: Vec<ChannelState>,
}

impl BlockRenderer {
    /// Creates a renderer for `channels` output channels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRate`] if either rate is not positive.
    pub fn new(source_rate: f64, target_rate: f64, channels: usize) -> Result<Self> {
        let resampler = Resampler::new(source_rate, target_rate)?;
        let channels = (0..channels)
            .map(|_| ChannelState {
                resampler: resampler.clone(),
                source: Vec::new(),
                converted: Vec::new(),
                carry: VecDeque::new(),
                underrun_samples: 0,
            })
            .collect();
        Ok(Self {
            source_rate,
            target_rate,
            channels,
        })
    }

    /// Source rate in Hz.
    pub fn source_rate(&self) -> f64 {
        self.source_rate
    }

    /// Target rate in Hz.
    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    /// Number of output channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Source samples a block of `frames` frames nominally consumes.
    pub fn source_samples_for(&self, frames: usize) -> usize {
        source_samples_for(frames, self.source_rate, self.target_rate)
    }

    /// Total output samples filled with the held value on `channel` because
    /// its buffer ran dry.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    pub fn underrun_samples(&self, channel: usize) -> u64 {
        self.channels[channel].underrun_samples
    }

    /// Renders one block per output channel from the matching bank channel.
    ///
    /// Output channel `i` reads bank channel `i`. Outputs beyond the renderer's
    /// channel count or the bank's channel count are filled with silence.
    pub fn render(&mut self, bank: &BufferBank, outputs: &mut [&mut [f32]]) {
        for (channel, out) in outputs.iter_mut().enumerate() {
            match bank.get(channel) {
                Some(buffer) if channel < self.channels.len() => {
                    self.render_channel(channel, buffer, out)
                }
                _ => out.fill(0.0),
            }
        }
    }

    /// Renders exactly `out.len()` samples for `channel` from `buffer`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channel_count()`.
    pub fn render_channel(&mut self, channel: usize, buffer: &ChannelBuffer, out: &mut [f32]) {
        let (source_rate, target_rate) = (self.source_rate, self.target_rate);
        let state = &mut self.channels[channel];
        let frames = out.len();

        let mut filled = 0;
        while filled < frames {
            let Some(value) = state.carry.pop_front() else {
                break;
            };
            out[filled] = value;
            filled += 1;
        }
        if filled == frames {
            return;
        }

        while filled < frames {
            let missing = frames - filled;
            let request = source_samples_for(missing, source_rate, target_rate).max(1);
            state.source.resize(request, 0.0);
            let got = buffer.read_into(&mut state.source);
            if got == 0 {
                break;
            }

            state.converted.clear();
            state
                .resampler
                .resample_into(&state.source[..got], &mut state.converted);
            let take = missing.min(state.converted.len());
            out[filled..filled + take].copy_from_slice(&state.converted[..take]);
            state.carry.extend(&state.converted[take..]);
            filled += take;
        }

        if filled < frames {
            let held = frames - filled;
            state.underrun_samples += held as u64;
            trace!(channel, held, "Channel buffer underrun, holding last value");
            state.resampler.hold_into(&mut out[filled..]);
        }
    }
}

// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Streaming linear-interpolation sample rate converter.

use crate::{Error, Result};

/// Stateful linear resampler from a source rate to a target rate.
///
/// Each call to [`Resampler::resample`] continues exactly where the previous
/// one stopped: the fractional read position and the last source sample are
/// carried over, so a signal split into arbitrary blocks converts to the same
/// output as the unsplit signal.
///
/// The output lags the input by one source sample: interpolation between the
/// last sample of one block and the first sample of the next happens during
/// the next call.
///
/// One instance handles one channel. Multichannel streams need one resampler
/// per channel (see [`crate::BlockRenderer`]).
///
/// # Examples
///
/// ```
/// use bml::Resampler;
///
/// # fn main() -> Result<(), bml::Error> {
/// let mut resampler = Resampler::new(512.0, 44_100.0)?;
/// let out = resampler.resample(&[0.5; 10]);
///
/// assert!((out.len() as i64 - 861).abs() <= 1);
/// assert!(out.iter().all(|v| *v == 0.5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resampler {
    source_rate: f64,
    target_rate: f64,
    /// Source samples advanced per output sample.
    step: f64,
    /// Read position; 0.0 is the held sample, 1.0 the first sample of the current block.
    phase: f64,
    held: Option<f32>,
}

impl Resampler {
    /// Creates a resampler converting from `source_rate` to `target_rate` Hz.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRate`] if either rate is not a positive, finite number.
    pub fn new(source_rate: f64, target_rate: f64) -> Result<Self> {
        let source_rate = Error::check_rate("source", source_rate)?;
        let target_rate = Error::check_rate("target", target_rate)?;
        Ok(Self {
            source_rate,
            target_rate,
            step: source_rate / target_rate,
            phase: 0.0,
            held: None,
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

    /// Output samples produced per source sample (`target_rate / source_rate`).
    pub fn ratio(&self) -> f64 {
        self.target_rate / self.source_rate
    }

    /// Last source sample seen, or `None` before the first non-empty input.
    pub fn last_sample(&self) -> Option<f32> {
        self.held
    }

    /// Forgets the phase and the held sample.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.held = None;
    }

    /// Converts a block of source-rate samples to target-rate samples.
    pub fn resample(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.expected_output(input.len()));
        self.resample_into(input, &mut out);
        out
    }

    /// Appends the conversion of `input` to `out`.
    ///
    /// Returns the number of samples appended. An empty `input` appends nothing
    /// and leaves the state untouched.
    pub fn resample_into(&mut self, input: &[f32], out: &mut Vec<f32>) -> usize {
        let Some(&last) = input.last() else {
            return 0;
        };
        let held = *self.held.get_or_insert(input[0]);
        let len = input.len() as f64;
        let before = out.len();
        while self.phase < len {
            let index = self.phase as usize;
            let frac = (self.phase - index as f64) as f32;
            let from = if index == 0 { held } else { input[index - 1] };
            let to = input[index];
            out.push(from + (to - from) * frac);
            self.phase += self.step;
        }
        self.phase -= len;
        self.held = Some(last);
        out.len() - before
    }

    /// Produces `count` samples holding the last known source value.
    ///
    /// Used to keep an output clock fed when no source data is available.
    /// Yields silence before any input has been seen. The phase is unchanged.
    pub fn hold(&self, count: usize) -> Vec<f32> {
        vec![self.held.unwrap_or(0.0); count]
    }

    /// Fills `out` with the held value, like [`Self::hold`] without allocating.
    pub fn hold_into(&self, out: &mut [f32]) {
        out.fill(self.held.unwrap_or(0.0));
    }

    fn expected_output(&self, input_len: usize) -> usize {
        (input_len as f64 * self.ratio()).ceil() as usize + 1
    }
}

/// Number of source samples covering `frames` output frames.
///
/// Computes `round(source_rate * frames / target_rate)`. The consumer owns the
/// scheduling decision; this is the shared arithmetic.
///
/// ```
/// assert_eq!(bml::source_samples_for(64, 512.0, 44_100.0), 1);
/// assert_eq!(bml::source_samples_for(44_100, 512.0, 44_100.0), 512);
/// ```
pub fn source_samples_for(frames: usize, source_rate: f64, target_rate: f64) -> usize {
    (source_rate * frames as f64 / target_rate).round() as usize
}

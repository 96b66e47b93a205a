// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Upsampling Signal Object
//!
//! This module implements the upsample object, which turns lists of raw
//! stream values into an audio-rate signal.
//!
//! ## Messages
//! - `dspsetup <rate>`: the host announces its audio sample rate
//! - `list` on the first inlet: raw stream values, appended to the buffer
//! - `bang` on the second inlet: (re)creates the resampler from the declared
//!   stream rate and the audio rate, and reports both on the logs outlet
//!
//! ## Attributes
//! - `lslSamplerate`: declared rate of the incoming values (default 512)
//!
//! ## Architecture
//! - **Buffer**: values arrive on the scheduler thread and are consumed on the
//!   audio thread through a lock-free [`ChannelBuffer`]
//! - **Perform**: each audio tick pulls the source samples the block covers,
//!   resamples them and writes the result to every output channel

use std::sync::Arc;

use bml::{BlockRenderer, ChannelBuffer};
use tracing::{debug, info, warn};

/// Audio callback (buffer to output block)
mod render;

/// State structures (settings, renderer)
mod state;

pub use state::UpsampleSettings;
use state::{Context, State};

/// The upsample object.
#[derive(Debug)]
pub struct UpsampleObject {
    settings: UpsampleSettings,
    buffer: Arc<ChannelBuffer>,
    context: Context,
}

impl UpsampleObject {
    /// Creates an uninitialized object that outputs silence.
    ///
    /// # Errors
    /// Returns [`bml::Error::InvalidCapacity`] for a zero buffer capacity.
    pub fn new(settings: UpsampleSettings) -> bml::Result<Self> {
        let buffer = Arc::new(ChannelBuffer::new(settings.buffer_capacity)?);
        Ok(UpsampleObject {
            settings,
            buffer,
            context: Context::default(),
        })
    }

    /// Settings currently in effect.
    pub fn settings(&self) -> &UpsampleSettings {
        &self.settings
    }

    /// Handles `dspsetup`.
    ///
    /// A changed rate discards the current resampler until the next
    /// [`Self::initialize`].
    pub fn dsp_setup(&mut self, audio_rate: f64) {
        if self.context.audio_rate != Some(audio_rate) && self.context.state.take().is_some() {
            debug!("Audio rate changed to {audio_rate}, resampler needs initializing");
        }
        self.context.audio_rate = Some(audio_rate);
    }

    /// Sets the `lslSamplerate` attribute; applies from the next [`Self::initialize`].
    pub fn set_stream_rate(&mut self, rate: f64) {
        self.settings.stream_rate = rate;
    }

    /// Declared rate of the incoming values.
    pub fn stream_rate(&self) -> f64 {
        self.settings.stream_rate
    }

    /// Audio rate announced by the host, if any.
    pub fn audio_rate(&self) -> Option<f64> {
        self.context.audio_rate
    }

    /// Handles a `list` of raw stream values.
    pub fn data_in(&self, values: &[f32]) {
        self.buffer.write_many(values);
    }

    /// The incoming value buffer, for feeding from another thread.
    pub fn buffer(&self) -> &Arc<ChannelBuffer> {
        &self.buffer
    }

    /// Handles the initialize `bang`.
    ///
    /// Creates the resampler when the audio rate is known and both rates are
    /// valid, then returns the two lines sent to the logs outlet.
    pub fn initialize(&mut self) -> Vec<String> {
        let stream_rate = self.settings.stream_rate;
        let audio_rate = self.context.audio_rate.unwrap_or(0.0);

        if audio_rate != 0.0 {
            match BlockRenderer::new(stream_rate, audio_rate, 1) {
                Ok(renderer) => self.context.state = Some(State { renderer }),
                Err(err) => {
                    warn!("Cannot initialize resampler: {err}");
                    self.context.state = None;
                }
            }
        }

        let lines = vec![
            format!("LSL Sample Rate: {stream_rate}"),
            format!("Audio Sample Rate: {audio_rate}"),
        ];
        for line in &lines {
            info!("{line}");
        }
        lines
    }

    /// `true` once a resampler exists.
    pub fn is_initialized(&self) -> bool {
        self.context.state.is_some()
    }

    /// Audio callback: fills every output channel with one block.
    pub fn perform(&mut self, outputs: &mut [&mut [f32]]) {
        render::perform(&mut self.context, &self.buffer, outputs);
    }
}

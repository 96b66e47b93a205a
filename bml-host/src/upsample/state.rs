// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! State Management for the Upsample Object
//!
//! - User settings (declared stream rate, buffer depth)
//! - Runtime state (the renderer, present only once initialized)

use bml::BlockRenderer;

/// Default declared stream rate in Hz.
pub(crate) const DEFAULT_STREAM_RATE: f64 = bml::config::DEFAULT_SOURCE_RATE;

/// Default depth of the incoming value buffer.
pub(crate) const DEFAULT_BUFFER_CAPACITY: usize = bml::config::DEFAULT_BUFFER_CAPACITY;

/// User-configurable settings for the upsample object.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsampleSettings {
    /// Rate of the incoming values (`lslSamplerate` attribute)
    pub stream_rate: f64,

    /// Samples retained until the audio callback consumes them
    pub buffer_capacity: usize,
}

impl Default for UpsampleSettings {
    fn default() -> Self {
        UpsampleSettings {
            stream_rate: DEFAULT_STREAM_RATE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Runtime state, created by `initialize` once the audio rate is known.
#[derive(Debug)]
pub struct State {
    /// Converts buffered values to audio-rate blocks
    pub renderer: BlockRenderer,
}

/// Context wrapper for the object's mutable state.
///
/// `state` is `None` until the object is initialized.
#[derive(Debug, Default)]
pub struct Context {
    /// Audio rate announced by the last DSP setup
    pub audio_rate: Option<f64>,

    /// The object's state (None when not initialized)
    pub state: Option<State>,
}

// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Stream Input Object
//!
//! This module implements the input object, which connects to an external
//! multichannel stream in the background and hands the received samples to
//! the host on demand.
//!
//! ## Messages
//! - `int` on the data inlet: `1` starts receiving, `0` stops, anything else
//!   is ignored
//! - `bang` on the data inlet: emits the samples received since the previous
//!   bang, one list per channel outlet; channels with nothing new stay silent
//! - `nchannels` / `samplerate` on the info inlet: reports the connected
//!   stream's channel count or nominal rate, or "LSL is not running."
//!
//! ## Outlets
//! One list outlet per channel (`LSL Out 1` ... `LSL Out N`) followed by the
//! `Info Out` outlet.

use std::sync::Arc;

use bml::{BufferBank, Ingest, StartOutcome, StreamInfo, StreamResolver};
use tracing::{debug, info};

/// Settings and info replies
mod state;

pub use state::{InfoReply, InputSettings, NOT_RUNNING_MESSAGE};

/// The input object.
///
/// Owns the ingest controller and, through it, one buffer per channel
/// outlet.
pub struct InputObject<R: StreamResolver> {
    settings: InputSettings,
    ingest: Ingest<R>,
}

impl<R: StreamResolver> InputObject<R> {
    /// Creates an idle input object.
    ///
    /// # Errors
    /// Returns an error if the settings describe no channels or no buffer.
    pub fn new(resolver: Arc<R>, settings: InputSettings) -> bml::Result<Self> {
        let ingest = Ingest::new(resolver, settings.session_config())?;
        Ok(InputObject { settings, ingest })
    }

    /// Settings the object was created with.
    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Names of the outlets, channel outlets first.
    pub fn outlet_names(&self) -> Vec<String> {
        (1..=self.settings.channel_count)
            .map(|channel| format!("LSL Out {channel}"))
            .chain(std::iter::once("Info Out".to_string()))
            .collect()
    }

    /// Handles an `int` on the data inlet.
    ///
    /// # Errors
    /// Returns [`bml::Error::Spawn`] if the ingest thread could not be started.
    pub fn toggle(&self, value: i64) -> bml::Result<()> {
        match value {
            1 => {
                if self.ingest.start()? == StartOutcome::Started {
                    info!("Looking for a stream with {}", self.settings.filter);
                }
            }
            0 => self.ingest.stop(),
            other => debug!("Ignoring toggle value {other}"),
        }
        Ok(())
    }

    /// Handles a `bang` on the data inlet.
    ///
    /// Returns `(outlet index, values)` for every channel that received
    /// samples since the previous bang, in outlet order.
    pub fn bang(&self) -> Vec<(usize, Vec<f32>)> {
        self.ingest
            .bank()
            .iter()
            .enumerate()
            .filter_map(|(channel, buffer)| {
                let values = buffer.read_new();
                (!values.is_empty()).then_some((channel, values))
            })
            .collect()
    }

    /// Handles `nchannels` on the info inlet.
    pub fn nchannels(&self) -> InfoReply<usize> {
        self.ingest.status().channel_count().into()
    }

    /// Handles `samplerate` on the info inlet.
    pub fn samplerate(&self) -> InfoReply<f64> {
        self.ingest.status().nominal_rate().into()
    }

    /// Metadata of the connected stream.
    ///
    /// # Errors
    /// Returns [`bml::Error::NotRunning`] when no stream is connected.
    pub fn stream_info(&self) -> bml::Result<StreamInfo> {
        match self.ingest.status() {
            bml::StreamStatus::Running(info) => Ok(info),
            bml::StreamStatus::NotRunning => Err(bml::Error::NotRunning),
        }
    }

    /// `true` while connected to a stream.
    pub fn is_running(&self) -> bool {
        self.ingest.is_running()
    }

    /// The channel buffers written by the ingest loop.
    pub fn bank(&self) -> &Arc<BufferBank> {
        self.ingest.bank()
    }

    /// The ingest controller.
    pub fn ingest(&self) -> &Ingest<R> {
        &self.ingest
    }
}

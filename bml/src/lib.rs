// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! # BML - biosignal to audio stream bridge
//!
//! Moves samples from an asynchronous, variable-rate multichannel network
//! stream (EEG and similar biosignal or telemetry feeds) into a fixed-rate
//! real-time audio pipeline.
//!
//! ## Overview
//!
//! A background thread pulls one multichannel sample at a time from the
//! external stream and writes each channel value into its own lock-free ring
//! buffer. A deadline-bound consumer reads those buffers without ever
//! blocking, either by draining everything new on demand (event-driven
//! "bang" delivery) or by pulling fixed amounts per audio tick and resampling
//! them to the audio rate.
//!
//! ### Key Concepts
//!
//! - **Channel buffer**: overwrite-on-full SPSC ring with independent raw and
//!   resampling cursors ([`ChannelBuffer`])
//! - **Buffer bank**: one channel buffer per stream channel ([`BufferBank`])
//! - **Ingest**: cancellable background loop feeding the bank ([`Ingest`])
//! - **Resampler**: stateful linear converter between rates ([`Resampler`])
//! - **Block renderer**: fixed-size output blocks on the audio clock ([`BlockRenderer`])
//!
//! ## Architecture
//!
//! ```text
//! StreamResolver ──► Ingest thread ──► BufferBank ──┬─► read_new()   (poll / bang)
//!                                                   └─► BlockRenderer (audio tick)
//!                                                        └─ Resampler per channel
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//! use bml::{BlockRenderer, Ingest, config::SessionConfig};
//! use bml::stream::synthetic::{SyntheticResolver, SyntheticStream};
//!
//! # fn main() -> Result<(), bml::Error> {
//! let resolver = SyntheticResolver::new()
//!     .with_stream(SyntheticStream::new("demo", "EEG", 8, 512.0));
//! let config = SessionConfig::default();
//! let ingest = Ingest::new(Arc::new(resolver), config.clone())?;
//! ingest.start()?;
//!
//! let mut renderer = BlockRenderer::new(config.source_rate, 48_000.0, 2)?;
//! let (mut left, mut right) = ([0.0f32; 256], [0.0f32; 256]);
//! for _ in 0..100 {
//!     renderer.render(ingest.bank(), &mut [&mut left[..], &mut right[..]]);
//!     std::thread::sleep(Duration::from_millis(5));
//! }
//!
//! ingest.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`BufferBank`] and [`ChannelBuffer`] are `Send + Sync`; one writer and one
//!   reader per cursor may use them concurrently without locks
//! - [`Resampler`] and [`BlockRenderer`] are plain mutable state owned by the
//!   audio thread
//! - [`Ingest`] may be driven from any thread; start and stop are serialized

mod bank;
mod buffer;
mod error;
mod ingest;
mod render;
mod resample;

pub mod config;
pub mod stream;

pub use bank::BufferBank;
pub use buffer::ChannelBuffer;
pub use error::{Error, Result};
pub use ingest::{ExitReason, Ingest, IngestState, StartOutcome, StreamStatus};
pub use render::BlockRenderer;
pub use resample::{Resampler, source_samples_for};
pub use stream::{StreamFilter, StreamInfo, StreamInlet, StreamResolver};

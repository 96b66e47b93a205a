// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Host objects for the BML stream bridge
//!
//! This crate wraps the `bml` core in the two objects a patching host such as
//! Max exposes to users:
//!
//! - **input**: connects to a biosignal stream in the background and, on every
//!   bang, emits the samples that arrived since the previous bang, one list per
//!   channel
//! - **upsample**: receives raw stream values as lists and plays them back as
//!   an audio-rate signal
//!
//! ## Host Concepts (for developers new to patching environments)
//! - **Inlet / outlet**: typed message ports of an object; each host message
//!   maps to one method here
//! - **Bang**: a trigger message without payload
//! - **DSP setup**: the host announces its audio sample rate before any
//!   signal processing starts
//! - **Perform**: the audio callback; it must never block
//!
//! The objects are generic over [`bml::StreamResolver`], so the same code runs
//! against a network stream binding or the in-process synthetic source.

/// Stream input object (background ingest, bang delivery, info queries)
pub mod input;

/// Upsampling signal object (list input, audio-rate output)
pub mod upsample;

pub use input::{InfoReply, InputObject, InputSettings};
pub use upsample::{UpsampleObject, UpsampleSettings};

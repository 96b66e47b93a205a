// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Audio callback of the upsample object.
//!
//! The object has a single input stream. It is resampled once into the first
//! output channel and copied to every other output channel, so all channels
//! carry the same signal.

use bml::ChannelBuffer;
use tracing::trace;

use crate::upsample::state::Context;

/// Fills `outputs` with one block of audio.
///
/// Writes silence while the object is not initialized. Never blocks.
pub(crate) fn perform(context: &mut Context, buffer: &ChannelBuffer, outputs: &mut [&mut [f32]]) {
    let Some((first, rest)) = outputs.split_first_mut() else {
        return;
    };
    match context.state.as_mut() {
        Some(state) => state.renderer.render_channel(0, buffer, first),
        None => {
            trace!("Not initialized, writing silence");
            first.fill(0.0);
        }
    }
    for output in rest {
        let frames = output.len().min(first.len());
        output[..frames].copy_from_slice(&first[..frames]);
        output[frames..].fill(0.0);
    }
}

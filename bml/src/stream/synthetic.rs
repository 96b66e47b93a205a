// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! In-process stream source producing one sine tone per channel.
//!
//! Useful for demos and tests where no network stream is available. Channel
//! `c` carries a tone at `frequency * (c + 1)` Hz.

use std::{
    f64::consts::TAU,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{
    Error, Result,
    stream::{StreamFilter, StreamInfo, StreamInlet, StreamResolver},
};

/// Definition of one synthetic stream.
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    /// Advertised metadata.
    pub info: StreamInfo,
    /// Tone frequency of channel 0 in Hz.
    pub frequency: f64,
    /// Peak amplitude.
    pub amplitude: f32,
    /// Stop producing after this many samples (the inlet then only times out).
    pub limit: Option<u64>,
    /// Pace samples at the nominal rate instead of producing them as fast as pulled.
    pub realtime: bool,
}

impl SyntheticStream {
    /// Creates a paced, unlimited 10 Hz stream with a fresh UID.
    pub fn new(
        name: impl Into<String>,
        stream_type: impl Into<String>,
        channel_count: usize,
        nominal_rate: f64,
    ) -> Self {
        Self {
            info: StreamInfo {
                name: name.into(),
                stream_type: stream_type.into(),
                channel_count,
                nominal_rate,
                source_id: String::new(),
                uid: Uuid::new_v4().to_string(),
            },
            frequency: 10.0,
            amplitude: 1.0,
            limit: None,
            realtime: true,
        }
    }

    /// Sets the channel 0 tone frequency.
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Sets the peak amplitude.
    pub fn amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Limits the stream to `samples` samples.
    pub fn limit(mut self, samples: u64) -> Self {
        self.limit = Some(samples);
        self
    }

    /// Enables or disables pacing at the nominal rate.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }
}

/// Resolver over a fixed list of [`SyntheticStream`]s.
#[derive(Debug, Default)]
pub struct SyntheticResolver {
    streams: Vec<SyntheticStream>,
    opened: AtomicUsize,
}

impl SyntheticResolver {
    /// Creates a resolver that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discoverable stream.
    pub fn with_stream(mut self, stream: SyntheticStream) -> Self {
        self.streams.push(stream);
        self
    }

    /// Number of inlets opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Acquire)
    }
}

impl StreamResolver for SyntheticResolver {
    type Inlet = SyntheticInlet;

    fn find_streams(&self, filter: &StreamFilter, _timeout: Duration) -> Result<Vec<StreamInfo>> {
        Ok(self
            .streams
            .iter()
            .filter(|stream| filter.matches(&stream.info))
            .map(|stream| stream.info.clone())
            .collect())
    }

    fn open(&self, info: &StreamInfo) -> Result<Self::Inlet> {
        let stream = self
            .streams
            .iter()
            .find(|stream| stream.info.uid == info.uid)
            .ok_or_else(|| Error::Open(format!("unknown stream uid {}", info.uid)))?;
        self.opened.fetch_add(1, Ordering::AcqRel);
        Ok(SyntheticInlet {
            stream: stream.clone(),
            produced: 0,
            started: Instant::now(),
        })
    }
}

/// Open connection to a [`SyntheticStream`].
#[derive(Debug)]
pub struct SyntheticInlet {
    stream: SyntheticStream,
    produced: u64,
    started: Instant,
}

impl SyntheticInlet {
    /// Seconds since stream start of sample `index`.
    fn time_of(&self, index: u64) -> f64 {
        let rate = self.stream.info.nominal_rate;
        if rate > 0.0 {
            index as f64 / rate
        } else {
            self.started.elapsed().as_secs_f64()
        }
    }
}

impl StreamInlet for SyntheticInlet {
    fn info(&self) -> &StreamInfo {
        &self.stream.info
    }

    fn pull_sample(&mut self, values: &mut Vec<f32>, timeout: Duration) -> Result<Option<f64>> {
        if self.stream.limit.is_some_and(|limit| self.produced >= limit) {
            thread::sleep(timeout);
            return Ok(None);
        }
        let timestamp = self.time_of(self.produced);
        if self.stream.realtime && self.stream.info.nominal_rate > 0.0 {
            let due = self.started + Duration::from_secs_f64(timestamp);
            let now = Instant::now();
            if due > now {
                let wait = due - now;
                if wait > timeout {
                    thread::sleep(timeout);
                    return Ok(None);
                }
                thread::sleep(wait);
            }
        }

        values.clear();
        values.extend((0..self.stream.info.channel_count).map(|channel| {
            let frequency = self.stream.frequency * (channel + 1) as f64;
            self.stream.amplitude * (TAU * frequency * timestamp).sin() as f32
        }));
        self.produced += 1;
        Ok(Some(timestamp))
    }
}

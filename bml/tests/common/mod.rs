// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use bml::{Error, Result, StreamFilter, StreamInfo, StreamInlet, StreamResolver};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes tracing output (respects the RUST_LOG environment variable).
pub fn setup_logging() {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .init();
    });
}

/// Builds stream metadata for tests.
pub fn stream_info(name: &str, stream_type: &str, channel_count: usize, rate: f64) -> StreamInfo {
    StreamInfo {
        name: name.to_string(),
        stream_type: stream_type.to_string(),
        channel_count,
        nominal_rate: rate,
        source_id: format!("{name}-source"),
        uid: format!("{name}-uid"),
    }
}

/// What an inlet does once its scripted frames are used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterScript {
    /// Keep timing out.
    Idle,
    /// Fail the pull.
    Fail,
}

/// Resolver replaying a fixed list of frames, counting how often it is used.
pub struct ScriptedResolver {
    pub info: Option<StreamInfo>,
    pub frames: Vec<Vec<f32>>,
    pub after: AfterScript,
    pub discovery_delay: Duration,
    pub finds: AtomicUsize,
    pub opens: AtomicUsize,
}

impl ScriptedResolver {
    /// A resolver whose discovery always comes back empty.
    pub fn empty() -> Self {
        Self {
            info: None,
            frames: Vec::new(),
            after: AfterScript::Idle,
            discovery_delay: Duration::ZERO,
            finds: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
        }
    }

    /// A resolver exposing one stream that replays `frames`.
    pub fn with_frames(info: StreamInfo, frames: Vec<Vec<f32>>) -> Self {
        Self {
            info: Some(info),
            frames,
            ..Self::empty()
        }
    }

    pub fn after(mut self, after: AfterScript) -> Self {
        self.after = after;
        self
    }

    pub fn discovery_delay(mut self, delay: Duration) -> Self {
        self.discovery_delay = delay;
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

impl StreamResolver for ScriptedResolver {
    type Inlet = ScriptedInlet;

    fn find_streams(&self, filter: &StreamFilter, _timeout: Duration) -> Result<Vec<StreamInfo>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.discovery_delay);
        Ok(self
            .info
            .iter()
            .filter(|info| filter.matches(info))
            .cloned()
            .collect())
    }

    fn open(&self, info: &StreamInfo) -> Result<Self::Inlet> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedInlet {
            info: info.clone(),
            frames: self.frames.iter().cloned().collect(),
            after: self.after,
            pulled: 0,
        })
    }
}

pub struct ScriptedInlet {
    info: StreamInfo,
    frames: VecDeque<Vec<f32>>,
    after: AfterScript,
    pulled: u64,
}

impl StreamInlet for ScriptedInlet {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_sample(&mut self, values: &mut Vec<f32>, timeout: Duration) -> Result<Option<f64>> {
        match self.frames.pop_front() {
            Some(frame) => {
                values.clear();
                values.extend(frame);
                self.pulled += 1;
                Ok(Some(self.pulled as f64))
            }
            None => match self.after {
                AfterScript::Idle => {
                    thread::sleep(timeout);
                    Ok(None)
                }
                AfterScript::Fail => Err(Error::Pull("connection lost".to_string())),
            },
        }
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Convenience wrapper for sharing a resolver with an `Ingest` while keeping a handle.
pub fn shared<R>(resolver: R) -> Arc<R> {
    Arc::new(resolver)
}

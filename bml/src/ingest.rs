// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Background stream ingest.
//!
//! [`Ingest`] owns the buffer bank of an input session and a background
//! thread that connects to the external stream and copies every pulled
//! multichannel sample into the bank.
//!
//! ## State machine
//! ```text
//!        start()                 connected
//! Idle ──────────► Connecting ─────────────► Running
//!  ▲                   │                        │ stop()
//!  │  no stream /      │                        ▼
//!  └── open failure ◄──┘◄──────────────────── Stopping
//! ```
//!
//! - Only one loop can be active: `start` is a compare-and-swap from `Idle`,
//!   so repeated or concurrent start requests are no-ops.
//! - `stop` raises a cancellation flag and joins the thread. The loop checks
//!   the flag before every pull, and every pull is bounded by the configured
//!   pull timeout, so `stop` returns within roughly one pull.
//! - When the loop ends for any reason the connection is dropped, the status
//!   reverts to [`StreamStatus::NotRunning`], and the reason stays queryable
//!   through [`Ingest::last_exit`].

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    BufferBank, Error, Result,
    config::SessionConfig,
    stream::{StreamFilter, StreamInfo, StreamInlet, StreamResolver},
};

/// Lifecycle state of the ingest loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IngestState {
    /// No loop is active.
    Idle = 0,
    /// Discovering and opening a stream.
    Connecting = 1,
    /// Pulling samples.
    Running = 2,
    /// Stop requested, waiting for the loop to exit.
    Stopping = 3,
}

impl From<u8> for IngestState {
    fn from(value: u8) -> Self {
        match value {
            1 => IngestState::Connecting,
            2 => IngestState::Running,
            3 => IngestState::Stopping,
            _ => IngestState::Idle,
        }
    }
}

/// Connection status reported to info queries.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus {
    /// No connection is active.
    NotRunning,
    /// Connected to the described stream.
    Running(StreamInfo),
}

impl StreamStatus {
    /// Channel count reported by the connected stream.
    pub fn channel_count(&self) -> Option<usize> {
        match self {
            StreamStatus::NotRunning => None,
            StreamStatus::Running(info) => Some(info.channel_count),
        }
    }

    /// Nominal rate reported by the connected stream.
    pub fn nominal_rate(&self) -> Option<f64> {
        match self {
            StreamStatus::NotRunning => None,
            StreamStatus::Running(info) => Some(info.nominal_rate),
        }
    }
}

/// Why the most recent ingest loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// A stop was requested.
    Stopped,
    /// Discovery returned no candidate.
    NoStreamFound,
    /// Discovery, open or pull failed.
    Failed(String),
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new loop was spawned.
    Started,
    /// A loop was already connecting or running; nothing changed.
    AlreadyActive,
}

/// State shared between the controller and the loop thread.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    cancel: AtomicBool,
    status: Mutex<StreamStatus>,
    last_exit: Mutex<Option<ExitReason>>,
    samples: AtomicU64,
}

impl Shared {
    fn set_state(&self, state: IngestState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: IngestState, to: IngestState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Returns the shared state to `Idle` when the loop thread exits, even by panic.
struct IdleOnExit<'a> {
    shared: &'a Shared,
    reason: Option<ExitReason>,
}

impl Drop for IdleOnExit<'_> {
    fn drop(&mut self) {
        let reason = self
            .reason
            .take()
            .unwrap_or_else(|| ExitReason::Failed("ingest loop panicked".to_string()));
        *self.shared.status.lock() = StreamStatus::NotRunning;
        *self.shared.last_exit.lock() = Some(reason);
        self.shared.set_state(IngestState::Idle);
    }
}

/// Controller of the background ingest loop and owner of the buffer bank.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use bml::{Ingest, StartOutcome, config::SessionConfig};
/// use bml::stream::synthetic::{SyntheticResolver, SyntheticStream};
///
/// # fn main() -> Result<(), bml::Error> {
/// let resolver = SyntheticResolver::new()
///     .with_stream(SyntheticStream::new("demo", "EEG", 8, 512.0));
/// let ingest = Ingest::new(Arc::new(resolver), SessionConfig::default())?;
///
/// assert_eq!(ingest.start()?, StartOutcome::Started);
/// assert_eq!(ingest.start()?, StartOutcome::AlreadyActive);
///
/// std::thread::sleep(std::time::Duration::from_millis(100));
/// let fresh = ingest.bank()[0].read_new();
/// println!("{} new samples on channel 0", fresh.len());
///
/// ingest.stop();
/// # Ok(())
/// # }
/// ```
pub struct Ingest<R: StreamResolver> {
    bank: Arc<BufferBank>,
    resolver: Arc<R>,
    config: SessionConfig,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R: StreamResolver> Ingest<R> {
    /// Creates an idle controller with a fresh buffer bank sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`SessionConfig::validate`].
    pub fn new(resolver: Arc<R>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let bank = Arc::new(BufferBank::new(
            config.channel_count,
            config.buffer_capacity,
        )?);
        Ok(Self {
            bank,
            resolver,
            config,
            shared: Arc::new(Shared {
                state: AtomicU8::new(IngestState::Idle as u8),
                cancel: AtomicBool::new(false),
                status: Mutex::new(StreamStatus::NotRunning),
                last_exit: Mutex::new(None),
                samples: AtomicU64::new(0),
            }),
            handle: Mutex::new(None),
        })
    }

    /// The buffer bank written by the loop.
    pub fn bank(&self) -> &Arc<BufferBank> {
        &self.bank
    }

    /// The configuration this controller was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IngestState {
        self.shared.state.load(Ordering::Acquire).into()
    }

    /// `true` while a loop is connecting, running or stopping.
    pub fn is_active(&self) -> bool {
        self.state() != IngestState::Idle
    }

    /// `true` while connected and pulling.
    pub fn is_running(&self) -> bool {
        self.state() == IngestState::Running
    }

    /// Connection status for info queries.
    pub fn status(&self) -> StreamStatus {
        self.shared.status.lock().clone()
    }

    /// Why the most recent loop ended, or `None` if no loop has ended yet.
    pub fn last_exit(&self) -> Option<ExitReason> {
        self.shared.last_exit.lock().clone()
    }

    /// Multichannel samples written into the bank since construction.
    pub fn samples_ingested(&self) -> u64 {
        self.shared.samples.load(Ordering::Relaxed)
    }

    /// Spawns the ingest loop unless one is already active.
    ///
    /// Returns immediately; discovery happens on the loop thread.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Spawn`] if the thread could not be created. The
    /// controller is then back in [`IngestState::Idle`].
    pub fn start(&self) -> Result<StartOutcome> {
        let mut handle = self.handle.lock();
        if !self
            .shared
            .transition(IngestState::Idle, IngestState::Connecting)
        {
            debug!("Ingest loop already active, ignoring start request");
            return Ok(StartOutcome::AlreadyActive);
        }
        // Reap a loop that ended on its own.
        if let Some(finished) = handle.take() {
            let _ = finished.join();
        }
        self.shared.cancel.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let bank = Arc::clone(&self.bank);
        let resolver = Arc::clone(&self.resolver);
        let settings = LoopSettings {
            filter: self.config.filter.clone(),
            resolve_timeout: self.config.resolve_timeout(),
            pull_timeout: self.config.pull_timeout(),
        };
        let spawned = thread::Builder::new()
            .name("bml-ingest".into())
            .spawn(move || run(&shared, &bank, resolver.as_ref(), &settings));
        match spawned {
            Ok(joiner) => {
                *handle = Some(joiner);
                Ok(StartOutcome::Started)
            }
            Err(err) => {
                self.shared.set_state(IngestState::Idle);
                Err(err.into())
            }
        }
    }

    /// Requests the loop to stop and waits for it to exit.
    ///
    /// A no-op when no loop is active.
    pub fn stop(&self) {
        let mut handle = self.handle.lock();
        let Some(joiner) = handle.take() else {
            return;
        };
        if !self
            .shared
            .transition(IngestState::Running, IngestState::Stopping)
        {
            self.shared
                .transition(IngestState::Connecting, IngestState::Stopping);
        }
        self.shared.cancel.store(true, Ordering::Release);
        if joiner.join().is_err() {
            warn!("Ingest loop panicked");
        }
    }

    /// Waits for the active loop to end on its own, without cancelling it.
    ///
    /// Intended for loops expected to terminate by themselves, e.g. when no
    /// stream is available. Returns immediately when no loop is active.
    pub fn wait(&self) {
        let mut handle = self.handle.lock();
        if let Some(joiner) = handle.take()
            && joiner.join().is_err()
        {
            warn!("Ingest loop panicked");
        }
    }
}

impl<R: StreamResolver> Drop for Ingest<R> {
    /// Stops and joins the loop thread.
    fn drop(&mut self) {
        self.stop();
    }
}

/// Values the loop thread needs from the configuration.
struct LoopSettings {
    filter: StreamFilter,
    resolve_timeout: Duration,
    pull_timeout: Duration,
}

/// Body of the loop thread.
fn run<R: StreamResolver>(
    shared: &Shared,
    bank: &BufferBank,
    resolver: &R,
    settings: &LoopSettings,
) {
    let mut guard = IdleOnExit {
        shared,
        reason: None,
    };
    let reason = match connect(shared, resolver, settings) {
        Ok(inlet) => pull_loop(shared, bank, inlet, settings.pull_timeout),
        Err(reason) => reason,
    };
    guard.reason = Some(reason);
}

/// Discovers and opens the first stream matching the filter.
fn connect<R: StreamResolver>(
    shared: &Shared,
    resolver: &R,
    settings: &LoopSettings,
) -> std::result::Result<R::Inlet, ExitReason> {
    if shared.cancelled() {
        return Err(ExitReason::Stopped);
    }
    let candidates = resolver
        .find_streams(&settings.filter, settings.resolve_timeout)
        .map_err(|err| {
            warn!("Stream discovery failed: {err}");
            ExitReason::Failed(err.to_string())
        })?;
    let Some(candidate) = candidates.first() else {
        let err = Error::NoStreamFound {
            property: settings.filter.property.clone(),
            value: settings.filter.value.clone(),
        };
        warn!("{err}");
        return Err(ExitReason::NoStreamFound);
    };
    let inlet = resolver.open(candidate).map_err(|err| {
        warn!("Failed to open stream \"{}\": {err}", candidate.name);
        ExitReason::Failed(err.to_string())
    })?;

    let info = inlet.info().clone();
    info!(
        "Connected to stream \"{}\" ({} channel(s) at {} Hz)",
        info.name, info.channel_count, info.nominal_rate
    );
    *shared.status.lock() = StreamStatus::Running(info);
    shared.transition(IngestState::Connecting, IngestState::Running);
    Ok(inlet)
}

/// Pulls samples into the bank until cancelled or the inlet fails.
fn pull_loop<I: StreamInlet>(
    shared: &Shared,
    bank: &BufferBank,
    mut inlet: I,
    pull_timeout: Duration,
) -> ExitReason {
    let stream_channels = inlet.info().channel_count;
    if stream_channels != bank.len() {
        debug!(
            "Stream has {} channel(s), buffering {}",
            stream_channels,
            bank.len()
        );
    }
    let mut values = Vec::with_capacity(stream_channels);
    let reason = loop {
        if shared.cancelled() {
            break ExitReason::Stopped;
        }
        match inlet.pull_sample(&mut values, pull_timeout) {
            Ok(Some(_timestamp)) => {
                bank.write_frame(&values);
                shared.samples.fetch_add(1, Ordering::Relaxed);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("Pulling from stream \"{}\" failed: {err}", inlet.info().name);
                break ExitReason::Failed(err.to_string());
            }
        }
    };
    info!("Disconnected from stream \"{}\"", inlet.info().name);
    reason
}

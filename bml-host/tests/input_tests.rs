// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Input object: toggle, bang delivery and info queries.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use bml::stream::synthetic::{SyntheticResolver, SyntheticStream};
use bml_host::{InfoReply, InputObject, InputSettings, input::NOT_RUNNING_MESSAGE};
use tracing_test::traced_test;

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn tones(channel_count: usize, limit: u64) -> Arc<SyntheticResolver> {
    Arc::new(
        SyntheticResolver::new().with_stream(
            SyntheticStream::new("tones", "EEG", channel_count, 512.0)
                .realtime(false)
                .limit(limit),
        ),
    )
}

#[test]
fn defaults_match_an_object_without_arguments() {
    let settings = InputSettings::default();
    assert_eq!(settings.channel_count, 8);
    assert_eq!(settings.buffer_capacity, 2000);
    assert_eq!(settings.filter.to_string(), "type=EEG");
    assert_eq!(InputSettings::with_channels(2).channel_count, 2);
}

#[test]
fn outlets_are_channels_then_info() {
    let input = InputObject::new(tones(3, 0), InputSettings::with_channels(3)).unwrap();
    assert_eq!(
        input.outlet_names(),
        vec!["LSL Out 1", "LSL Out 2", "LSL Out 3", "Info Out"]
    );
}

#[test]
fn info_queries_before_start_report_not_running() {
    let input = InputObject::new(tones(4, 0), InputSettings::default()).unwrap();
    assert_eq!(input.nchannels(), InfoReply::NotRunning);
    assert_eq!(input.samplerate(), InfoReply::NotRunning);
    assert_eq!(input.nchannels().to_string(), NOT_RUNNING_MESSAGE);
    assert_eq!(NOT_RUNNING_MESSAGE, "LSL is not running.");
    assert!(matches!(input.stream_info(), Err(bml::Error::NotRunning)));
}

#[test]
fn bang_before_start_emits_nothing() {
    let input = InputObject::new(tones(8, 0), InputSettings::default()).unwrap();
    assert!(input.bang().is_empty());
}

#[test]
#[traced_test]
fn toggle_on_connects_and_bang_drains_new_samples() {
    let input = InputObject::new(tones(4, 50), InputSettings::with_channels(2)).unwrap();
    input.toggle(1).unwrap();
    assert!(logs_contain("Looking for a stream with type=EEG"));
    assert!(wait_until(|| input.ingest().samples_ingested() == 50));

    assert_eq!(input.nchannels(), InfoReply::Value(4));
    assert_eq!(input.samplerate(), InfoReply::Value(512.0));
    assert_eq!(input.samplerate().to_string(), "512");
    assert_eq!(input.stream_info().unwrap().name, "tones");

    let lists = input.bang();
    assert_eq!(lists.len(), 2);
    for (outlet, (channel, values)) in lists.iter().enumerate() {
        assert_eq!(*channel, outlet);
        assert_eq!(values.len(), 50);
    }
    assert!(input.bang().is_empty());

    input.toggle(0).unwrap();
    assert!(!input.is_running());
    assert_eq!(input.nchannels(), InfoReply::NotRunning);
}

#[test]
fn only_channels_with_new_samples_are_emitted() {
    let input = InputObject::new(tones(1, 0), InputSettings::with_channels(3)).unwrap();
    input.bank().write_frame(&[0.5, 0.25]);
    input.bank()[1].write(0.125);

    let expected: Vec<(usize, Vec<f32>)> = vec![(0, vec![0.5]), (1, vec![0.25, 0.125])];
    assert_eq!(input.bang(), expected);
}

#[test]
fn repeated_toggle_on_opens_a_single_connection() {
    let resolver = tones(2, 10);
    let input = InputObject::new(Arc::clone(&resolver), InputSettings::with_channels(2)).unwrap();
    input.toggle(1).unwrap();
    input.toggle(1).unwrap();
    assert!(wait_until(|| input.is_running()));
    input.toggle(1).unwrap();
    input.toggle(0).unwrap();
    assert_eq!(resolver.opened(), 1);
}

#[test]
#[traced_test]
fn other_toggle_values_are_ignored() {
    let input = InputObject::new(tones(2, 0), InputSettings::with_channels(2)).unwrap();
    input.toggle(7).unwrap();
    input.toggle(-1).unwrap();
    assert!(!input.ingest().is_active());
    assert!(logs_contain("Ignoring toggle value 7"));
}

#[test]
fn toggle_off_while_idle_is_harmless() {
    let input = InputObject::new(tones(2, 0), InputSettings::with_channels(2)).unwrap();
    input.toggle(0).unwrap();
    input.toggle(0).unwrap();
    assert!(!input.is_running());
}

#[test]
fn missing_stream_leaves_the_object_not_running() {
    let resolver = Arc::new(SyntheticResolver::new());
    let input = InputObject::new(resolver, InputSettings::default()).unwrap();
    input.toggle(1).unwrap();
    input.ingest().wait();
    assert_eq!(input.nchannels(), InfoReply::NotRunning);
    assert_eq!(
        input.ingest().last_exit(),
        Some(bml::ExitReason::NoStreamFound)
    );
}

#[test]
fn zero_channels_are_rejected() {
    assert!(InputObject::new(tones(1, 0), InputSettings::with_channels(0)).is_err());
}

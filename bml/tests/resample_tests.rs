// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Resampler behaviour: steady state, determinism, continuity across calls.

use approx::assert_relative_eq;
use bml::{Error, Resampler, source_samples_for};

#[test]
fn constant_input_stays_constant_at_any_ratio() {
    for (source, target) in [
        (512.0, 44_100.0),
        (44_100.0, 512.0),
        (250.0, 48_000.0),
        (1000.0, 1000.0),
        (48_000.0, 44_100.0),
    ] {
        let mut resampler = Resampler::new(source, target).unwrap();
        for block in [1usize, 3, 10, 64, 7] {
            let out = resampler.resample(&vec![-0.75; block]);
            assert!(
                out.iter().all(|v| *v == -0.75),
                "{source} -> {target} with block {block}"
            );
        }
    }
}

#[test]
fn upsampling_ten_samples_to_audio_rate() {
    let mut resampler = Resampler::new(512.0, 44_100.0).unwrap();
    let out = resampler.resample(&[0.5; 10]);
    let expected = (10.0f64 * 44_100.0 / 512.0).round() as i64;
    assert!((out.len() as i64 - expected).abs() <= 1, "got {}", out.len());
    for v in out {
        assert_relative_eq!(v, 0.5);
    }
}

#[test]
fn identical_resamplers_produce_identical_output() {
    let first: Vec<f32> = (0..37).map(|i| (i as f32 * 0.3).sin()).collect();
    let second: Vec<f32> = (0..23).map(|i| (i as f32 * 0.7).cos()).collect();

    let mut a = Resampler::new(500.0, 44_100.0).unwrap();
    let mut b = Resampler::new(500.0, 44_100.0).unwrap();
    let out_a = [a.resample(&first), a.resample(&second)].concat();
    let out_b = [b.resample(&first), b.resample(&second)].concat();
    assert_eq!(out_a, out_b);
}

#[test]
fn split_blocks_match_a_single_block() {
    let signal: Vec<f32> = (0..200).map(|i| (i as f32 * 0.05).sin()).collect();

    let mut whole = Resampler::new(256.0, 1000.0).unwrap();
    let expected = whole.resample(&signal);

    let mut split = Resampler::new(256.0, 1000.0).unwrap();
    let mut actual = Vec::new();
    for chunk in signal.chunks(13) {
        split.resample_into(chunk, &mut actual);
    }

    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(&expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-5);
    }
}

#[test]
fn interpolates_linearly_between_samples() {
    let mut resampler = Resampler::new(1.0, 4.0).unwrap();
    resampler.resample(&[0.0]);
    let out = resampler.resample(&[1.0]);
    assert_eq!(out.len(), 4);
    for (v, expected) in out.iter().zip([0.0, 0.25, 0.5, 0.75]) {
        assert_relative_eq!(*v, expected);
    }
}

#[test]
fn downsampling_skips_samples() {
    let mut resampler = Resampler::new(4.0, 1.0).unwrap();
    let out = resampler.resample(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(out, vec![0.0, 3.0]);
}

#[test]
fn empty_input_produces_nothing_and_keeps_state() {
    let mut resampler = Resampler::new(512.0, 44_100.0).unwrap();
    assert!(resampler.resample(&[]).is_empty());
    assert_eq!(resampler.last_sample(), None);
    resampler.resample(&[0.2]);
    assert!(resampler.resample(&[]).is_empty());
    assert_eq!(resampler.last_sample(), Some(0.2));
}

#[test]
fn hold_repeats_last_sample() {
    let mut resampler = Resampler::new(512.0, 44_100.0).unwrap();
    assert_eq!(resampler.hold(3), vec![0.0; 3]);
    resampler.resample(&[0.1, 0.9]);
    assert_eq!(resampler.hold(2), vec![0.9; 2]);
    resampler.reset();
    assert_eq!(resampler.last_sample(), None);
}

#[test]
fn non_positive_rates_are_rejected() {
    for (source, target) in [
        (0.0, 44_100.0),
        (-1.0, 44_100.0),
        (512.0, 0.0),
        (512.0, f64::NAN),
        (f64::INFINITY, 44_100.0),
    ] {
        assert!(
            matches!(
                Resampler::new(source, target),
                Err(Error::InvalidRate { .. })
            ),
            "{source} -> {target}"
        );
    }
}

#[test]
fn source_sample_schedule_rounds() {
    assert_eq!(source_samples_for(512, 512.0, 44_100.0), 6);
    assert_eq!(source_samples_for(64, 512.0, 44_100.0), 1);
    assert_eq!(source_samples_for(0, 512.0, 44_100.0), 0);
    assert_eq!(source_samples_for(480, 48_000.0, 48_000.0), 480);
}

#[test]
fn rates_are_reported() {
    let resampler = Resampler::new(512.0, 44_100.0).unwrap();
    assert_eq!(resampler.source_rate(), 512.0);
    assert_eq!(resampler.target_rate(), 44_100.0);
    assert_relative_eq!(resampler.ratio(), 44_100.0 / 512.0);
}

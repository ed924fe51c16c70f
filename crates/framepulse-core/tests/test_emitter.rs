mod common;

use std::sync::Arc;
use std::time::Instant;

use approx::assert_relative_eq;

use framepulse_core::config::ProgressConfig;
use framepulse_core::emitter::{make_emitter, NoOpEmitter, ProgressEmitter, TrackingEmitter};
use framepulse_core::message::Message;
use framepulse_core::unit::{Roi, UnitId};

use common::{manual_clock, secs, FakeUnit, RecordingChannel};

/// 40 frames of 100 elements with a 4 s threshold: 1000 elements/s.
fn unit() -> FakeUnit {
    FakeUnit::new(7, 40, 100)
}

// ---------------------------------------------------------------------------
// Threshold rate
// ---------------------------------------------------------------------------

#[test]
fn test_threshold_rate_from_expected_elements() {
    let emitter = TrackingEmitter::new(&unit(), None, &ProgressConfig::default());
    assert_relative_eq!(emitter.threshold_rate(), 1000.0);
}

#[test]
fn test_threshold_rate_accounts_for_roi() {
    let roi = Roi::every_nth(40, 2);
    let emitter = TrackingEmitter::new(&unit(), Some(&roi), &ProgressConfig::default());
    assert_relative_eq!(emitter.threshold_rate(), 500.0);
}

#[test]
fn test_threshold_rate_uses_configured_time() {
    let config = ProgressConfig {
        threshold_part_time_secs: 2.0,
        ..Default::default()
    };
    let emitter = TrackingEmitter::new(&unit(), None, &config);
    assert_relative_eq!(emitter.threshold_rate(), 2000.0);
}

// ---------------------------------------------------------------------------
// Send decision
// ---------------------------------------------------------------------------

#[test]
fn test_first_chunk_never_sends() {
    for (elements, start) in [(1u64, 0.0), (100, 5.0), (1_000_000, 1000.0)] {
        let clock = manual_clock();
        clock.set(secs(start));
        let mut emitter =
            TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
        assert_eq!(emitter.should_send(elements), None);
        assert_eq!(emitter.pending_elements(), elements);
    }
}

#[test]
fn test_first_chunk_elements_are_carried_forward() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    assert_eq!(emitter.should_send(100), None);
    clock.advance(secs(2.0));
    assert_eq!(emitter.should_send(100), Some(200));
    assert_eq!(emitter.pending_elements(), 0);
}

#[test]
fn test_chunks_at_threshold_rate_never_send() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    // 2000 elements every 2 s is exactly 1000 elements/s.
    assert_eq!(emitter.should_send(2000), None);
    for _ in 0..20 {
        clock.advance(secs(2.0));
        assert_eq!(emitter.should_send(2000), None);
    }
}

#[test]
fn test_slow_chunks_send_on_every_eligible_chunk() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    // 100 elements every 2 s is 50 elements/s, far below a tenth of the threshold.
    assert_eq!(emitter.should_send(100), None);
    clock.advance(secs(2.0));
    assert_eq!(emitter.should_send(100), Some(200));
    for _ in 0..10 {
        clock.advance(secs(2.0));
        assert_eq!(emitter.should_send(100), Some(100));
    }
}

#[test]
fn test_slow_chunks_within_min_interval_are_held_back() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    assert_eq!(emitter.should_send(100), None);
    clock.advance(secs(0.5));
    assert_eq!(emitter.should_send(100), None);
    clock.advance(secs(0.5));
    // Exactly the minimum interval is not enough.
    assert_eq!(emitter.should_send(100), None);
    clock.advance(secs(0.5));
    assert_eq!(emitter.should_send(100), Some(400));
}

#[test]
fn test_last_sent_is_not_moved_by_a_send() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    emitter.should_send(100);
    clock.advance(secs(2.0));
    assert_eq!(emitter.should_send(100), Some(200));
    // Only 0.1 s after the last send, but elapsed is still measured from the
    // first chunk.
    clock.advance(secs(0.1));
    assert_eq!(emitter.should_send(100), Some(100));
}

#[test]
fn test_zero_elapsed_does_not_send() {
    let clock = manual_clock();
    let config = ProgressConfig {
        min_message_interval_secs: 0.0,
        ..Default::default()
    };
    let mut emitter = TrackingEmitter::with_clock(&unit(), None, &config, clock.clone());
    emitter.should_send(0);
    assert_eq!(emitter.should_send(0), None);
    assert_eq!(emitter.should_send(10), None);
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[test]
fn test_tracking_emitter_sends_messages() {
    let channel = RecordingChannel::new();
    let clock = manual_clock();
    let unit = unit().with_channel(channel.clone());
    let mut emitter =
        TrackingEmitter::with_clock(&unit, None, &ProgressConfig::default(), clock.clone());

    emitter.signal_start();
    emitter.signal_chunk_complete(100);
    clock.advance(secs(3.0));
    emitter.signal_chunk_complete(50);
    emitter.signal_complete();

    let id = UnitId(7);
    assert_eq!(
        channel.messages(),
        vec![
            Message::UnitStart { unit: id },
            Message::ChunkComplete {
                unit: id,
                elements: 150
            },
            Message::UnitComplete { unit: id },
        ]
    );
}

#[test]
fn test_fast_unit_sends_only_start_and_complete() {
    let channel = RecordingChannel::new();
    let clock = manual_clock();
    let unit = unit().with_channel(channel.clone());
    let mut emitter =
        TrackingEmitter::with_clock(&unit, None, &ProgressConfig::default(), clock.clone());

    emitter.signal_start();
    for _ in 0..40 {
        clock.advance(secs(0.01));
        emitter.signal_chunk_complete(100);
    }
    emitter.signal_complete();
    assert_eq!(channel.len(), 2);
}

#[test]
fn test_tracking_emitter_without_channel_is_silent() {
    let clock = manual_clock();
    let mut emitter =
        TrackingEmitter::with_clock(&unit(), None, &ProgressConfig::default(), clock.clone());
    emitter.signal_start();
    emitter.signal_chunk_complete(100);
    clock.advance(secs(5.0));
    emitter.signal_chunk_complete(100);
    emitter.signal_complete();
    assert_eq!(emitter.pending_elements(), 0);
}

#[test]
fn test_noop_emitter_high_frequency_loop() {
    let channel = RecordingChannel::new();
    let unit = unit().with_channel(channel.clone());
    let mut emitter = make_emitter(&unit, None, &ProgressConfig::disabled());

    let start = Instant::now();
    emitter.signal_start();
    for _ in 0..10_000 {
        emitter.signal_chunk_complete(100);
    }
    emitter.signal_complete();
    assert_eq!(channel.len(), 0);
    assert!(start.elapsed().as_millis() < 500);
}

#[test]
fn test_make_emitter_enabled_tracks() {
    let channel = RecordingChannel::new();
    let unit = unit().with_channel(channel.clone());
    let mut emitter = make_emitter(&unit, None, &ProgressConfig::default());
    emitter.signal_start();
    assert_eq!(channel.messages(), vec![Message::UnitStart { unit: UnitId(7) }]);
}

#[test]
fn test_noop_emitter_is_object_safe() {
    let mut emitters: Vec<Box<dyn ProgressEmitter>> = vec![Box::new(NoOpEmitter)];
    let channel: Arc<RecordingChannel> = RecordingChannel::new();
    let unit = unit().with_channel(channel.clone());
    emitters.push(Box::new(TrackingEmitter::new(
        &unit,
        None,
        &ProgressConfig::default(),
    )));
    for e in &mut emitters {
        e.signal_complete();
    }
    assert_eq!(channel.len(), 1);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for the wearable link and the recording controller,
//! driven through the scripted mock adapter.

mod common;

use common::logged_in_app;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use workout_tracker::peripheral::frame::{encode, ExerciseSummaryFrame, HeartRateFrame};
use workout_tracker::peripheral::link::{COMMAND_UUID, HEART_RATE_UUID, SUMMARY_UUID};
use workout_tracker::peripheral::mock::MockAdapter;
use workout_tracker::peripheral::{LinkConfig, LinkEvent, LinkState, PeripheralLink, StopOutcome};
use workout_tracker::services::{Recorder, StopResult};

fn heart_rate(bpm: f64) -> Vec<u8> {
    encode(&HeartRateFrame { heart_rate: bpm }).unwrap()
}

fn summary(exercise: &str, reps: u32) -> Vec<u8> {
    encode(&ExerciseSummaryFrame {
        exercise: exercise.to_string(),
        reps,
    })
    .unwrap()
}

fn new_link(
    adapter: &Arc<MockAdapter>,
    paused: bool,
) -> (
    Arc<PeripheralLink>,
    Arc<AtomicBool>,
    tokio::sync::mpsc::UnboundedReceiver<LinkEvent>,
) {
    let paused = Arc::new(AtomicBool::new(paused));
    let (link, events) = PeripheralLink::new(
        adapter.clone(),
        LinkConfig::default(),
        Arc::clone(&paused),
    );
    (Arc::new(link), paused, events)
}

#[tokio::test]
async fn test_start_connects_to_named_device() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, _paused, _events) = new_link(&adapter, false);

    assert!(link.start().await);

    assert_eq!(link.state().await, LinkState::Connected);
    assert_eq!(adapter.connected_ids(), vec!["mock-WorkoutTracker"]);
    assert_eq!(adapter.stop_scan_count(), 1);
    let connection = adapter.connection();
    assert_eq!(connection.negotiated_mtu(), 512);
    assert!(connection.is_subscribed(HEART_RATE_UUID));
    assert!(!connection.is_subscribed(SUMMARY_UUID));
}

#[tokio::test(start_paused = true)]
async fn test_scan_times_out_without_matching_name() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker 2"));
    let (link, _paused, _events) = new_link(&adapter, false);

    assert!(!link.start().await);

    assert_eq!(link.state().await, LinkState::Idle);
    assert!(adapter.connected_ids().is_empty());
    assert_eq!(adapter.scan_count(), 1);
    assert_eq!(adapter.stop_scan_count(), 1);
}

#[tokio::test]
async fn test_heart_rate_is_relayed_unless_paused() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, paused, mut events) = new_link(&adapter, false);
    assert!(link.start().await);
    let connection = adapter.connection();

    assert!(connection.notify(HEART_RATE_UUID, heart_rate(88.0)));
    assert_eq!(events.recv().await, Some(LinkEvent::HeartRate(88.0)));

    // Subscription stays open while paused; frames are dropped
    paused.store(true, Ordering::SeqCst);
    assert!(connection.notify(HEART_RATE_UUID, heart_rate(90.0)));
    connection.notify(HEART_RATE_UUID, b"garbage".to_vec());
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    paused.store(false, Ordering::SeqCst);
    assert!(connection.notify(HEART_RATE_UUID, heart_rate(91.0)));

    assert_eq!(events.recv().await, Some(LinkEvent::HeartRate(91.0)));
}

#[tokio::test]
async fn test_stop_handshake() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, _paused, mut events) = new_link(&adapter, false);
    assert!(link.start().await);
    let connection = adapter.connection();

    assert_eq!(link.request_stop().await.unwrap(), StopOutcome::Requested);
    assert_eq!(link.state().await, LinkState::StopRequested);

    let writes = connection.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, COMMAND_UUID);
    assert_eq!(writes[0].1, b"eyJjb21tYW5kIjoic3RvcCJ9".to_vec());
    assert!(connection.is_subscribed(SUMMARY_UUID));

    assert!(connection.notify(SUMMARY_UUID, summary("squat", 12)));
    assert_eq!(
        events.recv().await,
        Some(LinkEvent::ExerciseSummary {
            exercise: "squat".to_string(),
            reps: 12
        })
    );
    assert_eq!(connection.unsubscribed(), vec![SUMMARY_UUID]);
    assert!(!connection.is_subscribed(SUMMARY_UUID));
}

#[tokio::test]
async fn test_stop_without_connection_never_writes() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, _paused, _events) = new_link(&adapter, false);

    assert_eq!(link.request_stop().await.unwrap(), StopOutcome::NotConnected);
    assert!(adapter.connection().writes().is_empty());
    assert_eq!(link.state().await, LinkState::Idle);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, _paused, mut events) = new_link(&adapter, false);
    assert!(link.start().await);

    link.disconnect().await;
    link.on_focus_lost().await;

    assert_eq!(link.state().await, LinkState::Disconnected);
    assert_eq!(adapter.connection().disconnect_count(), 1);
    assert_eq!(adapter.release_count(), 1);
    assert_eq!(events.recv().await, Some(LinkEvent::Disconnected));
    assert!(events.try_recv().is_err());

    // A fresh start is allowed after a disconnect
    assert!(link.start().await);
    assert_eq!(link.state().await, LinkState::Connected);
}

#[tokio::test]
async fn test_each_disconnect_releases_adapter() {
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, _paused, _events) = new_link(&adapter, false);

    for cycle in 1..=3 {
        assert!(link.start().await);
        assert_eq!(adapter.release_count(), cycle - 1);
        link.disconnect().await;
        assert_eq!(adapter.release_count(), cycle);
    }
    assert_eq!(adapter.scan_count(), 3);
}

#[tokio::test]
async fn test_recorder_stop_without_device_only_resets() {
    let (t, _account) = logged_in_app().await;
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, paused, _events) = new_link(&adapter, true);
    let recorder = Recorder::with_link(t.app.recordings.clone(), link, paused);
    let writes_before = t.memory.write_count();

    recorder.handle_event(LinkEvent::HeartRate(95.0)).await.unwrap();
    let result = recorder.stop().await.unwrap();

    assert!(matches!(result, StopResult::Reset));
    assert!(adapter.connection().writes().is_empty());
    assert_eq!(t.memory.write_count(), writes_before);
    let monitor = recorder.monitor().await;
    assert_eq!(monitor.current(), 70.0);
    assert_eq!(monitor.window(), vec![70.0]);
}

#[tokio::test]
async fn test_recorder_uploads_summary_from_device() {
    let (t, _account) = logged_in_app().await;
    let sets = t.app.config.collections.sets.clone();
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, paused, mut events) = new_link(&adapter, true);
    assert!(link.start().await);
    let recorder = Recorder::with_link(t.app.recordings.clone(), Arc::clone(&link), paused);
    let connection = adapter.connection();

    recorder.play().await;
    for bpm in [100.0, 111.0] {
        connection.notify(HEART_RATE_UUID, heart_rate(bpm));
        let event = events.recv().await.unwrap();
        recorder.handle_event(event).await.unwrap();
    }
    assert_eq!(recorder.monitor().await.average(), Some(105.5));

    let result = recorder.stop().await.unwrap();
    assert!(matches!(result, StopResult::AwaitingSummary));
    assert!(!recorder.summary_handled().await);
    assert_eq!(t.memory.count(&sets), 0);

    connection.notify(SUMMARY_UUID, summary("deadlift", 6));
    let event = events.recv().await.unwrap();
    let uploaded = recorder.handle_event(event).await.unwrap().unwrap();

    assert_eq!(uploaded.set.exercise, "deadlift");
    assert_eq!(uploaded.set.reps, 6);
    assert_eq!(uploaded.set.avg_heart_rate, 105);
    assert_eq!(t.memory.count(&sets), 1);
    assert_eq!(link.state().await, LinkState::Disconnected);
    assert!(recorder.summary_handled().await);
}

#[tokio::test]
async fn test_focus_lost_during_stop_handshake_uploads_nothing() {
    let (t, _account) = logged_in_app().await;
    let sets = t.app.config.collections.sets.clone();
    let adapter = Arc::new(MockAdapter::with_device("WorkoutTracker"));
    let (link, paused, mut events) = new_link(&adapter, true);
    assert!(link.start().await);
    let recorder = Recorder::with_link(t.app.recordings.clone(), Arc::clone(&link), paused);
    let connection = adapter.connection();

    recorder.play().await;
    connection.notify(HEART_RATE_UUID, heart_rate(99.0));
    let event = events.recv().await.unwrap();
    recorder.handle_event(event).await.unwrap();

    let result = recorder.stop().await.unwrap();
    assert!(matches!(result, StopResult::AwaitingSummary));
    assert!(connection.is_subscribed(SUMMARY_UUID));

    recorder.on_focus_lost().await;

    assert_eq!(link.state().await, LinkState::Disconnected);
    assert!(recorder.summary_handled().await);
    assert!(!recorder.is_playing());
    assert_eq!(adapter.release_count(), 1);
    // A late summary has nowhere to go
    assert!(!connection.notify(SUMMARY_UUID, summary("squat", 10)));

    while let Ok(event) = events.try_recv() {
        assert_eq!(event, LinkEvent::Disconnected);
        assert!(recorder.handle_event(event).await.unwrap().is_none());
    }
    assert_eq!(t.memory.count(&sets), 0);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_recorder_uploads_fallback_sets() {
    let (t, _account) = logged_in_app().await;
    let recorder = Recorder::simulated(t.app.recordings.clone());

    assert!(recorder.toggle_play().await);
    tokio::time::sleep(Duration::from_millis(2_600)).await;

    let monitor = recorder.monitor().await;
    assert!(monitor.sample_count() >= 4);
    assert!(monitor
        .window()
        .iter()
        .all(|bpm| (60.0..=120.0).contains(bpm)));

    let StopResult::Uploaded(uploaded) = recorder.stop().await.unwrap() else {
        panic!("simulation stop should upload");
    };
    let exercises: Vec<_> = uploaded
        .iter()
        .map(|u| (u.set.exercise.as_str(), u.set.reps))
        .collect();
    assert_eq!(exercises, vec![("bench press", 15), ("deadlift", 9)]);
    // Both sets land in the same workout
    assert_eq!(uploaded[0].set.workout_id, uploaded[1].set.workout_id);
    assert!(!recorder.is_playing());
}

#[tokio::test]
async fn test_simulated_stop_before_any_sample_uses_baseline() {
    let (t, _account) = logged_in_app().await;
    let recorder = Recorder::simulated(t.app.recordings.clone());

    let StopResult::Uploaded(uploaded) = recorder.stop().await.unwrap() else {
        panic!("simulation stop should upload");
    };

    assert!(uploaded.iter().all(|u| u.set.avg_heart_rate == 70));
}

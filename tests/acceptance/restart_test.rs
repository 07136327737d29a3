//! Persistence across simulated restarts.

use super::common::{shared, Fixture, ADMIN};
use cycle_clock::{Checkpoint, CycleClock};
use cycle_common::{ClockError, Timestamp};

#[test]
fn test_restart_mid_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle-state.json");

    let fixture = Fixture::new(0);
    fixture.time.set(Timestamp(150));
    fixture.clock.request_length_change(ADMIN, 10).unwrap();
    let before = fixture.clock.status().unwrap();
    fixture.clock.checkpoint().save(&path).unwrap();
    drop(fixture);

    // A new process starts later and reloads the file.
    let restored = CycleClock::restore(Checkpoint::load(&path).unwrap()).unwrap();
    assert_eq!(restored.status(Timestamp(150)).unwrap(), before);
    assert_eq!(restored.current_cycle(Timestamp(199)).unwrap().get(), 1);
    assert_eq!(restored.current_cycle(Timestamp(200)).unwrap().get(), 2);
    assert_eq!(restored.current_cycle(Timestamp(215)).unwrap().get(), 3);
}

#[test]
fn test_restart_then_further_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle-state.json");

    let fixture = Fixture::new(0);
    fixture.time.set(Timestamp(100));
    fixture.clock.request_length_change(ADMIN, 10).unwrap();
    fixture.clock.checkpoint().save(&path).unwrap();

    let restored = CycleClock::restore(Checkpoint::load(&path).unwrap()).unwrap();
    let time = fixture.time.clone();
    let clock = shared(restored, &time);

    time.set(Timestamp(205));
    let pivot = clock.request_length_change(ADMIN, 50).unwrap();
    assert_eq!(pivot.start_index.get(), 3);
    assert_eq!(pivot.start_time, Timestamp(210));
    clock.checkpoint().save(&path).unwrap();

    let again = CycleClock::restore(Checkpoint::load(&path).unwrap()).unwrap();
    assert_eq!(again.current_cycle(Timestamp(50)).unwrap().get(), 0);
    assert_eq!(again.current_cycle(Timestamp(205)).unwrap().get(), 2);
    assert_eq!(again.current_cycle(Timestamp(260)).unwrap().get(), 4);
}

#[test]
fn test_tampered_checkpoint_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle-state.json");

    let fixture = Fixture::new(0);
    fixture.time.set(Timestamp(100));
    fixture.clock.request_length_change(ADMIN, 10).unwrap();

    let mut json: serde_json::Value =
        serde_json::from_str(&fixture.clock.checkpoint().to_json().unwrap()).unwrap();
    json["segments"][1]["start_time"] = serde_json::json!(250);
    std::fs::write(&path, json.to_string()).unwrap();

    let checkpoint = Checkpoint::load(&path).unwrap();
    assert!(matches!(
        CycleClock::restore(checkpoint),
        Err(ClockError::InvalidCheckpoint(_))
    ));
}

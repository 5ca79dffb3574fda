use pollreg_core::clock::{Clock, ManualClock};
use pollreg_core::registry::{PollError, PollRegistry};
use pollreg_core::snapshot::SnapshotStore;
use pollreg_core::store::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;

fn id32(seed: u8) -> [u8; 32] {
    [seed; 32]
}

fn registry_at(now_ms: u64) -> (PollRegistry, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now_ms));
    let registry = PollRegistry::with_parts(Arc::new(MemoryStore::new()), Arc::clone(&clock) as Arc<dyn Clock>);
    (registry, clock)
}

fn temp_data_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pollreg-{}-{}", name, std::process::id()))
}

#[test]
fn snapshot_round_trip_preserves_registry_state() {
    let (registry, clock) = registry_at(1_000);
    let pre_a = id32(1);
    let pre_b = id32(2);
    let id_a = registry.create_poll(&pre_a, 3, 50_000).expect("create a");
    let id_b = registry.create_poll(&pre_b, 2, 60_000).expect("create b");
    registry.cast_vote(&pre_a, 1, 3, 50_000, &id32(10)).expect("vote");
    registry.cast_vote(&pre_a, 3, 3, 50_000, &id32(11)).expect("vote");
    registry.cast_vote(&pre_b, 2, 2, 60_000, &id32(10)).expect("vote");

    let dir = temp_data_dir("roundtrip");
    let store = SnapshotStore::new(&dir).expect("snapshot store");
    store.save(&registry.snapshot()).expect("save");

    let loaded = store.load().expect("load").expect("snapshot present");
    let restored = PollRegistry::from_snapshot(loaded, clock).expect("restore");

    assert_eq!(restored.poll_count(), 2);
    assert_eq!(restored.get_poll(&id_a), registry.get_poll(&id_a));
    assert_eq!(restored.get_poll(&id_b), registry.get_poll(&id_b));
    let status = restored.get_vote_status(&id_a, &id32(11));
    assert!(status.has_voted);
    assert_eq!(status.option_id, 3);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn restored_registry_still_enforces_single_vote() {
    let (registry, clock) = registry_at(1_000);
    let pre = id32(3);
    registry.create_poll(&pre, 2, 50_000).expect("create");
    registry.cast_vote(&pre, 1, 2, 50_000, &id32(30)).expect("vote");

    let restored =
        PollRegistry::from_snapshot(registry.snapshot(), clock).expect("restore");
    assert_eq!(
        restored.cast_vote(&pre, 2, 2, 50_000, &id32(30)),
        Err(PollError::AlreadyVoted)
    );
    // A fresh identity can still vote on the restored record.
    let id = restored
        .cast_vote(&pre, 2, 2, 50_000, &id32(31))
        .expect("new vote");
    assert_eq!(restored.get_poll(&id).vote_counts, vec![1, 1]);
}

#[test]
fn snapshots_are_deterministic() {
    let (registry, _clock) = registry_at(1_000);
    for seed in 0..8u8 {
        let pre = id32(seed);
        registry.create_poll(&pre, 2, 50_000).expect("create");
        registry
            .cast_vote(&pre, 1, 2, 50_000, &id32(100 + seed))
            .expect("vote");
    }

    let first = serde_json::to_string(&registry.snapshot()).expect("serialize");
    let second = serde_json::to_string(&registry.snapshot()).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn version_mismatch_is_rejected() {
    let (registry, clock) = registry_at(1_000);
    let mut snapshot = registry.snapshot();
    snapshot.version += 1;
    assert!(PollRegistry::from_snapshot(snapshot, clock).is_err());
}

#[test]
fn missing_snapshot_file_loads_as_none() {
    let dir = temp_data_dir("missing");
    let store = SnapshotStore::new(&dir).expect("snapshot store");
    assert!(store.load().expect("load").is_none());
    std::fs::remove_dir_all(&dir).ok();
}

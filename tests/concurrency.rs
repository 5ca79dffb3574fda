// Per-record atomicity under racing callers.

use pollreg_core::clock::ManualClock;
use pollreg_core::events::RegistryEvent;
use pollreg_core::registry::{PollError, PollRegistry};
use pollreg_core::store::MemoryStore;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 16;

fn id32(seed: u8) -> [u8; 32] {
    [seed; 32]
}

fn shared_registry_at(now_ms: u64) -> Arc<PollRegistry> {
    let clock = Arc::new(ManualClock::new(now_ms));
    Arc::new(PollRegistry::with_parts(
        Arc::new(MemoryStore::new()),
        clock,
    ))
}

fn run_race<F>(registry: &Arc<PollRegistry>, op: F) -> Vec<Result<[u8; 32], PollError>>
where
    F: Fn(&PollRegistry, usize) -> Result<[u8; 32], PollError> + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let mut handles = Vec::with_capacity(THREADS);
    for i in 0..THREADS {
        let registry = Arc::clone(registry);
        let op = Arc::clone(&op);
        handles.push(thread::spawn(move || op(&registry, i)));
    }
    handles
        .into_iter()
        .map(|h| h.join().expect("thread join"))
        .collect()
}

#[test]
fn racing_same_identity_votes_admit_exactly_one() {
    let registry = shared_registry_at(1_000);
    let pre = id32(1);
    registry.create_poll(&pre, 3, 60_000).expect("create");

    let voter = id32(10);
    let results = run_race(&registry, move |reg, i| {
        let option_id = (i % 3) as u8 + 1;
        reg.cast_vote(&pre, option_id, 3, 60_000, &voter)
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| **r == Err(PollError::AlreadyVoted))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(already, THREADS - 1);

    let id = results.iter().find_map(|r| r.ok()).expect("winning id");
    let view = registry.get_poll(&id);
    assert_eq!(view.vote_counts.iter().sum::<u64>(), 1);
}

#[test]
fn racing_distinct_identities_all_land() {
    let registry = shared_registry_at(1_000);
    let pre = id32(2);
    registry.create_poll(&pre, 4, 60_000).expect("create");

    let results = run_race(&registry, move |reg, i| {
        let voter = id32(100 + i as u8);
        let option_id = (i % 4) as u8 + 1;
        reg.cast_vote(&pre, option_id, 4, 60_000, &voter)
    });
    assert!(results.iter().all(|r| r.is_ok()));

    let id = results[0].expect("id");
    let view = registry.get_poll(&id);
    assert_eq!(view.vote_counts.iter().sum::<u64>(), THREADS as u64);
    for i in 0..THREADS {
        let status = registry.get_vote_status(&id, &id32(100 + i as u8));
        assert!(status.has_voted);
        assert_eq!(status.option_id, (i % 4) as u8 + 1);
    }
}

#[test]
fn racing_creates_admit_exactly_one() {
    let registry = shared_registry_at(1_000);
    let pre = id32(3);

    let results = run_race(&registry, move |reg, _| reg.create_poll(&pre, 2, 60_000));

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let dup = results
        .iter()
        .filter(|r| **r == Err(PollError::PollAlreadyExists))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(dup, THREADS - 1);
    assert_eq!(registry.poll_count(), 1);
}

#[test]
fn racing_auto_creating_votes_allocate_one_record() {
    let registry = shared_registry_at(1_000);
    let events = registry.subscribe();
    let pre = id32(4);

    let results = run_race(&registry, move |reg, i| {
        let voter = id32(200 + i as u8);
        reg.cast_vote(&pre, 1, 2, 60_000, &voter)
    });
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(registry.poll_count(), 1);

    let created = events
        .try_iter()
        .filter(|e| matches!(e, RegistryEvent::PollCreated { .. }))
        .count();
    assert_eq!(created, 1);

    let id = results[0].expect("id");
    assert_eq!(
        registry.get_poll(&id).vote_counts,
        vec![THREADS as u64, 0]
    );
}

#[test]
fn distinct_polls_do_not_interfere() {
    let registry = shared_registry_at(1_000);

    let results = run_race(&registry, move |reg, i| {
        let pre = id32(i as u8);
        let voter = id32(50);
        reg.cast_vote(&pre, 1, 2, 60_000, &voter)
    });
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(registry.poll_count(), THREADS);

    // One identity voting on many polls is fine; the rule is per record.
    for result in results {
        let id = result.expect("id");
        let status = registry.get_vote_status(&id, &id32(50));
        assert!(status.has_voted);
    }
}

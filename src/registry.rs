// State-transition logic of the registry: deterministic poll identification,
// create-or-reuse, single-vote-per-identity, deadline-gated mutation.

use crate::clock::{Clock, SystemClock};
use crate::events::RegistryEvent;
use crate::poll::{Identity, PollId, PollRecord, PollView, PreId, VoteStatus, derive_poll_id};
use crate::store::{MemoryStore, RecordStore};
use crate::{MAX_OPTION_COUNT, MIN_OPTION_COUNT};
use std::fmt;
use std::sync::{Arc, Mutex, mpsc};

/// Every failure is a rejected operation with no side effect; all are safe to
/// retry or abandon by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    InvalidOptionCount,
    DeadlineInPast,
    PollAlreadyExists,
    PollExpired,
    AlreadyVoted,
    InvalidOption,
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PollError::InvalidOptionCount => "option count outside 2..=6",
            PollError::DeadlineInPast => "deadline not in the future",
            PollError::PollAlreadyExists => "poll already exists",
            PollError::PollExpired => "poll deadline has passed",
            PollError::AlreadyVoted => "identity has already voted",
            PollError::InvalidOption => "option id outside 1..=option_count",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for PollError {}

/// Owns all poll records. Clone the surrounding Arc to share across threads;
/// all operations take `&self`.
pub struct PollRegistry {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    subscribers: Mutex<Vec<mpsc::Sender<RegistryEvent>>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::with_parts(Arc::new(MemoryStore::new()), Arc::new(SystemClock::new()))
    }

    /// Storage and clock are injected so the registry is testable with an
    /// in-memory fake and a manual clock.
    pub fn with_parts(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        PollRegistry {
            store,
            clock,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers an observer for advisory notifications. A receiver that goes
    /// away is dropped on the next emission.
    pub fn subscribe(&self) -> mpsc::Receiver<RegistryEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().expect("subscribers lock").push(tx);
        rx
    }

    pub fn poll_count(&self) -> usize {
        self.store.len()
    }

    /// One-shot creation. Re-deriving the same id is only possible by
    /// resubmitting identical parameters, so a collision here is a logical
    /// duplicate, not an attack.
    pub fn create_poll(
        &self,
        pre_id: &PreId,
        option_count: u8,
        deadline_ms: u64,
    ) -> Result<PollId, PollError> {
        let now = self.clock.now_ms();
        check_creation(option_count, deadline_ms, now)?;

        let id = derive_poll_id(pre_id, option_count, deadline_ms);
        let (inserted, result) = self.store.update_or_insert(
            &id,
            &|| PollRecord::new(option_count, deadline_ms),
            &mut |_| Ok(()),
        );
        result?;
        if !inserted {
            return Err(PollError::PollAlreadyExists);
        }

        self.emit(RegistryEvent::PollCreated {
            poll_id: id,
            pre_id: *pre_id,
            option_count,
            deadline_ms,
        });
        Ok(id)
    }

    /// Votes on the record derived from the poll-defining triple,
    /// auto-creating it if absent (first-voter-defines-the-poll: callers must
    /// agree out-of-band on the canonical triple). The expiry, double-vote and
    /// option checks plus the two-field mutation run as one indivisible step
    /// per record.
    pub fn cast_vote(
        &self,
        pre_id: &PreId,
        option_id: u8,
        option_count: u8,
        deadline_ms: u64,
        voter: &Identity,
    ) -> Result<PollId, PollError> {
        let id = derive_poll_id(pre_id, option_count, deadline_ms);
        let now = self.clock.now_ms();

        // Auto-creation validates exactly like create_poll. Only probes when
        // the record is absent, so an established poll never re-checks its
        // own creation parameters.
        if self.store.get(&id).is_none() {
            check_creation(option_count, deadline_ms, now)?;
        }

        let voter = *voter;
        let (inserted, result) = self.store.update_or_insert(
            &id,
            &|| PollRecord::new(option_count, deadline_ms),
            &mut |record| {
                if now > record.deadline_ms {
                    return Err(PollError::PollExpired);
                }
                if record.votes_by_identity.contains_key(&voter) {
                    return Err(PollError::AlreadyVoted);
                }
                if option_id == 0 || option_id > record.option_count {
                    return Err(PollError::InvalidOption);
                }
                record.votes_by_identity.insert(voter, option_id);
                let slot = &mut record.vote_counts[(option_id - 1) as usize];
                *slot = slot.saturating_add(1);
                Ok(())
            },
        );

        if inserted {
            self.emit(RegistryEvent::PollCreated {
                poll_id: id,
                pre_id: *pre_id,
                option_count,
                deadline_ms,
            });
        }
        result?;
        self.emit(RegistryEvent::VoteCast {
            poll_id: id,
            voter,
            option_id,
        });
        Ok(id)
    }

    /// Total lookup: the zero/default view with `exists = false` for an
    /// unknown id.
    pub fn get_poll(&self, id: &PollId) -> PollView {
        match self.store.get(id) {
            Some(record) => PollView::from(&record),
            None => PollView::absent(),
        }
    }

    pub fn get_vote_status(&self, id: &PollId, identity: &Identity) -> VoteStatus {
        match self.store.get(id).and_then(|r| r.option_of(identity)) {
            Some(option_id) => VoteStatus {
                has_voted: true,
                option_id,
            },
            None => VoteStatus::none(),
        }
    }

    /// False for an unknown poll: an absent poll has no deadline to compare
    /// against. Monotonic in time for a known poll.
    pub fn is_expired(&self, id: &PollId) -> bool {
        match self.store.get(id) {
            Some(record) => self.clock.now_ms() > record.deadline_ms,
            None => false,
        }
    }

    /// Derive-then-get convenience; no independent logic.
    pub fn get_poll_by_params(
        &self,
        pre_id: &PreId,
        option_count: u8,
        deadline_ms: u64,
    ) -> PollView {
        let id = derive_poll_id(pre_id, option_count, deadline_ms);
        self.get_poll(&id)
    }

    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    fn emit(&self, event: RegistryEvent) {
        let mut subs = self.subscribers.lock().expect("subscribers lock");
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for PollRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_creation(option_count: u8, deadline_ms: u64, now_ms: u64) -> Result<(), PollError> {
    if !(MIN_OPTION_COUNT..=MAX_OPTION_COUNT).contains(&option_count) {
        return Err(PollError::InvalidOptionCount);
    }
    if deadline_ms <= now_ms {
        return Err(PollError::DeadlineInPast);
    }
    Ok(())
}

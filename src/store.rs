// Keyed record store behind the registry. The trait keeps the registry
// storage-agnostic; MemoryStore is the reference implementation.
//
// Locking discipline (per-record atomicity):
// - the outer RwLock guards structural growth of the map only;
// - each record's Mutex serializes every mutation of that record;
// - distinct PollIds never contend on a record lock.

use crate::poll::{PollId, PollRecord};
use crate::registry::PollError;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

pub type UpdateFn<'a> = &'a mut dyn FnMut(&mut PollRecord) -> Result<(), PollError>;

/// Append-only keyed store: records are inserted at most once per key and
/// never removed.
pub trait RecordStore: Send + Sync {
    /// Snapshot copy of one record; None for an unknown key.
    fn get(&self, id: &PollId) -> Option<PollRecord>;

    /// Insert `init()` if the key is absent, then run `update` on the record.
    /// Both steps happen inside the record's critical section, so two racing
    /// callers agree on one insertion and see each other's updates in order.
    /// Returns whether this call performed the insertion, and `update`'s
    /// result. On Err the record is unchanged.
    fn update_or_insert(
        &self,
        id: &PollId,
        init: &dyn Fn() -> PollRecord,
        update: UpdateFn<'_>,
    ) -> (bool, Result<(), PollError>);

    /// Copy of the full record set, for snapshots. Ordering is unspecified.
    fn export(&self) -> Vec<(PollId, PollRecord)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<PollId, Arc<Mutex<PollRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild a store from exported records (snapshot restore). Later
    /// duplicates of a key are ignored, matching append-only semantics.
    pub fn from_records(records: Vec<(PollId, PollRecord)>) -> Self {
        let mut map = HashMap::with_capacity(records.len());
        for (id, record) in records {
            map.entry(id).or_insert_with(|| Arc::new(Mutex::new(record)));
        }
        MemoryStore {
            records: RwLock::new(map),
        }
    }

    fn slot(&self, id: &PollId) -> Option<Arc<Mutex<PollRecord>>> {
        let map = self.records.read().expect("records lock");
        map.get(id).cloned()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, id: &PollId) -> Option<PollRecord> {
        let slot = self.slot(id)?;
        let record = slot.lock().expect("record lock");
        Some(record.clone())
    }

    fn update_or_insert(
        &self,
        id: &PollId,
        init: &dyn Fn() -> PollRecord,
        update: UpdateFn<'_>,
    ) -> (bool, Result<(), PollError>) {
        // Fast path: the key already exists, no write lock on the map.
        let (inserted, slot) = match self.slot(id) {
            Some(slot) => (false, slot),
            None => {
                let mut map = self.records.write().expect("records lock");
                match map.entry(*id) {
                    // Lost the insertion race to another caller.
                    Entry::Occupied(entry) => (false, entry.get().clone()),
                    Entry::Vacant(entry) => {
                        let slot = Arc::new(Mutex::new(init()));
                        entry.insert(Arc::clone(&slot));
                        (true, slot)
                    }
                }
            }
        };

        let mut record = slot.lock().expect("record lock");
        (inserted, update(&mut record))
    }

    fn export(&self) -> Vec<(PollId, PollRecord)> {
        let map = self.records.read().expect("records lock");
        map.iter()
            .map(|(id, slot)| {
                let record = slot.lock().expect("record lock");
                (*id, record.clone())
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.records.read().expect("records lock").len()
    }
}

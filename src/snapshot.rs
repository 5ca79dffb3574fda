// Snapshot persistence: versioned JSON, written tmp-then-rename.
// Snapshots are deterministic (sorted) so identical registries produce
// identical files.

use crate::SNAPSHOT_VERSION;
use crate::clock::Clock;
use crate::poll::{Identity, PollId, PollRecord};
use crate::registry::PollRegistry;
use crate::store::MemoryStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedPoll {
    pub poll_id: PollId,
    pub deadline_ms: u64,
    pub option_count: u8,
    pub vote_counts: Vec<u64>,
    pub votes: Vec<(Identity, u8)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedRegistry {
    pub version: u8,
    pub polls: Vec<PersistedPoll>,
}

impl PersistedPoll {
    fn from_record(poll_id: PollId, record: &PollRecord) -> Self {
        let mut votes: Vec<(Identity, u8)> = record
            .votes_by_identity
            .iter()
            .map(|(identity, option)| (*identity, *option))
            .collect();
        votes.sort_by(|a, b| a.0.cmp(&b.0));
        PersistedPoll {
            poll_id,
            deadline_ms: record.deadline_ms,
            option_count: record.option_count,
            vote_counts: record.vote_counts.clone(),
            votes,
        }
    }

    fn into_record(self) -> (PollId, PollRecord) {
        let record = PollRecord {
            deadline_ms: self.deadline_ms,
            option_count: self.option_count,
            vote_counts: self.vote_counts,
            votes_by_identity: self.votes.into_iter().collect(),
        };
        (self.poll_id, record)
    }
}

impl PollRegistry {
    pub fn snapshot(&self) -> PersistedRegistry {
        let mut polls: Vec<PersistedPoll> = self
            .store()
            .export()
            .iter()
            .map(|(id, record)| PersistedPoll::from_record(*id, record))
            .collect();
        polls.sort_by(|a, b| a.poll_id.cmp(&b.poll_id));
        PersistedRegistry {
            version: SNAPSHOT_VERSION,
            polls,
        }
    }

    pub fn from_snapshot(
        snapshot: PersistedRegistry,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, String> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(format!(
                "snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            ));
        }
        let records = snapshot
            .polls
            .into_iter()
            .map(PersistedPoll::into_record)
            .collect();
        let store = Arc::new(MemoryStore::from_records(records));
        Ok(PollRegistry::with_parts(store, clock))
    }
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, String> {
        fs::create_dir_all(&data_dir).map_err(|e| format!("{}", e))?;
        Ok(Self {
            path: data_dir.as_ref().join("registry_snapshot.json"),
        })
    }

    pub fn load(&self) -> Result<Option<PersistedRegistry>, String> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path).map_err(|e| format!("{}", e))?;
        let snap =
            serde_json::from_slice::<PersistedRegistry>(&data).map_err(|e| format!("{}", e))?;
        Ok(Some(snap))
    }

    pub fn save(&self, snapshot: &PersistedRegistry) -> Result<(), String> {
        let data = serde_json::to_vec_pretty(snapshot).map_err(|e| format!("{}", e))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(|e| format!("{}", e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| format!("{}", e))?;
        Ok(())
    }
}

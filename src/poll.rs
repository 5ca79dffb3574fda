// Core poll types and deterministic id derivation.
// A PollId is a content-derived key: independent callers reach the same
// record by hashing the same (pre_id, option_count, deadline) triple.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Caller-supplied preliminary identifier, combined with option count and
/// deadline to derive the PollId.
pub type PreId = [u8; 32];

/// Opaque caller reference for the one-vote-per-identity rule.
pub type Identity = [u8; 32];

/// Primary key of one poll record. Always computed, never assigned.
pub type PollId = [u8; 32];

/// Domain tag keeping poll-id digests disjoint from any other sha256 use.
pub const POLL_ID_DOMAIN: &[u8] = b"pollreg/poll-id/v1";

/// Pure derivation: sha256 over the exact byte encoding
/// (domain tag, pre_id, option_count as one byte, deadline_ms big-endian).
/// Distinct triples cannot collide except via sha256 itself.
pub fn derive_poll_id(pre_id: &PreId, option_count: u8, deadline_ms: u64) -> PollId {
    let mut hasher = Sha256::new();
    hasher.update(POLL_ID_DOMAIN);
    hasher.update(pre_id);
    hasher.update([option_count]);
    hasher.update(deadline_ms.to_be_bytes());
    hasher.finalize().into()
}

/// One poll's mutable state. Existence is keyed-store membership; a record,
/// once inserted, is never removed and its deadline/option_count never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub deadline_ms: u64,
    pub option_count: u8,
    /// One counter per option, index = option_id - 1.
    pub vote_counts: Vec<u64>,
    /// Identity -> chosen option (always in 1..=option_count).
    pub votes_by_identity: HashMap<Identity, u8>,
}

impl PollRecord {
    pub fn new(option_count: u8, deadline_ms: u64) -> Self {
        PollRecord {
            deadline_ms,
            option_count,
            vote_counts: vec![0; option_count as usize],
            votes_by_identity: HashMap::new(),
        }
    }

    pub fn option_of(&self, identity: &Identity) -> Option<u8> {
        self.votes_by_identity.get(identity).copied()
    }
}

/// Read view of a poll. `exists = false` carries the zero/default fields, so
/// lookups are total and an unknown id is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView {
    pub deadline_ms: u64,
    pub vote_counts: Vec<u64>,
    pub option_count: u8,
    pub exists: bool,
}

impl PollView {
    pub fn absent() -> Self {
        PollView {
            deadline_ms: 0,
            vote_counts: Vec::new(),
            option_count: 0,
            exists: false,
        }
    }
}

impl From<&PollRecord> for PollView {
    fn from(record: &PollRecord) -> Self {
        PollView {
            deadline_ms: record.deadline_ms,
            vote_counts: record.vote_counts.clone(),
            option_count: record.option_count,
            exists: true,
        }
    }
}

/// Read view of one identity's vote. `option_id = 0` means "has not voted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteStatus {
    pub has_voted: bool,
    pub option_id: u8,
}

impl VoteStatus {
    pub fn none() -> Self {
        VoteStatus {
            has_voted: false,
            option_id: 0,
        }
    }
}

// Advisory notifications for external observers (indexers, UIs).
// Delivery is best-effort; no registry read depends on it.

use crate::poll::{Identity, PollId, PreId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    PollCreated {
        poll_id: PollId,
        pre_id: PreId,
        option_count: u8,
        deadline_ms: u64,
    },
    VoteCast {
        poll_id: PollId,
        voter: Identity,
        option_id: u8,
    },
}

// Poll registry core: deterministic, in-memory, audit-first.

pub mod clock;
pub mod events;
pub mod ffi;
pub mod poll;
pub mod registry;
pub mod snapshot;
pub mod store;

// Global bounds for poll option counts
pub const MIN_OPTION_COUNT: u8 = 2;
pub const MAX_OPTION_COUNT: u8 = 6;

/// Bumped whenever the persisted snapshot layout changes.
pub const SNAPSHOT_VERSION: u8 = 1;

// No ambient wall clock access in the core; time is injected explicitly.

/*
Intentionally avoids:
- async
- global mutable state
- external IO outside the snapshot module
*/

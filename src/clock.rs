// Injected time source. The registry never reads the wall clock directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond clock. Must be monotonic-enough that a poll, once observed
/// expired, never again appears open.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock folded through a high-water mark: a backward OS clock step is
/// clamped to the largest timestamp already handed out.
#[derive(Debug, Default)]
pub struct SystemClock {
    high_water_ms: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            high_water_ms: AtomicU64::new(0),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let prev = self.high_water_ms.fetch_max(wall, Ordering::Relaxed);
        wall.max(prev)
    }
}

/// Deterministic clock for tests and simulations; advances only on request.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::Relaxed);
    }

    /// Clamped to the current value: manual time never runs backward.
    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.fetch_max(now_ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

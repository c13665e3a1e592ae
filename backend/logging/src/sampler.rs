//! Per-second sampling of repeated records.
//!
//! Counters live in a fixed table of `levels x BUCKETS` atomics, keyed by
//! an FNV-1a hash of the message. Hash collisions share a counter, which
//! only makes sampling slightly more aggressive for the colliding messages.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracelog_config::SamplingConfig;
use tracelog_core::Level;

const BUCKETS: usize = 4096;
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct Counter {
    reset_at: AtomicI64,
    count: AtomicU64,
}

impl Counter {
    fn incr(&self, now: i64, tick: i64) -> u64 {
        let reset_at = self.reset_at.load(Ordering::Acquire);
        if reset_at > now {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }

        // New tick: whoever wins the CAS restarts the count.
        self.count.store(1, Ordering::Release);
        if self
            .reset_at
            .compare_exchange(reset_at, now + tick, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        1
    }
}

/// Lets the first `initial` records per (level, message) and tick
/// through, then every `thereafter`-th.
#[derive(Debug)]
pub struct Sampler {
    counters: Box<[Counter]>,
    initial: u64,
    thereafter: u64,
    tick_nanos: i64,
}

impl Sampler {
    pub fn new(config: SamplingConfig) -> Self {
        let counters = (0..Level::ALL.len() * BUCKETS).map(|_| Counter::default()).collect();
        Self {
            counters,
            initial: config.initial,
            thereafter: config.thereafter,
            tick_nanos: TICK.as_nanos() as i64,
        }
    }

    pub fn sample(&self, level: Level, message: &str) -> bool {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        self.sample_at(level, message, now)
    }

    /// Same as [`Sampler::sample`] with an explicit clock reading in
    /// nanoseconds since the epoch.
    pub fn sample_at(&self, level: Level, message: &str, now_nanos: i64) -> bool {
        let idx = level.as_u8() as usize * BUCKETS + (fnv1a(message) as usize % BUCKETS);
        let n = self.counters[idx].incr(now_nanos, self.tick_nanos);
        if n <= self.initial {
            return true;
        }
        if self.thereafter == 0 {
            return false;
        }
        (n - self.initial) % self.thereafter == 0
    }
}

fn fnv1a(s: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    s.bytes().fold(OFFSET, |hash, b| (hash ^ b as u32).wrapping_mul(PRIME))
}

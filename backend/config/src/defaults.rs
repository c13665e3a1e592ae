//! Default values applied when a configuration leaves a setting out.

/// Records let through per (level, message) key in each one-second tick.
pub const DEFAULT_SAMPLING_INITIAL: u64 = 1000;

/// After the initial burst, every N-th identical record is kept.
pub const DEFAULT_SAMPLING_THEREAFTER: u64 = 100;

/// Size cap for a single log file before an early rotation.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Pending alert events before new ones are dropped.
pub const DEFAULT_ALERT_QUEUE_CAPACITY: usize = 1024;

/// Concurrent deliveries to the alerting backend.
pub const DEFAULT_ALERT_MAX_IN_FLIGHT: usize = 16;

/// Per-event delivery timeout.
pub const DEFAULT_ALERT_TIMEOUT_MS: u64 = 5_000;

/// Directory holding the default log file.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Recipient value that makes a message visible to every participant.
pub const BROADCAST: &str = "Todos";

/// Status text appended when a participant registers.
pub const JOIN_TEXT: &str = "entra na sala...";

/// Status text appended when the sweeper evicts a participant.
pub const LEAVE_TEXT: &str = "sai da sala...";

/// Default period between presence sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 15;

/// Default maximum heartbeat gap before a participant is evicted, in seconds.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 10;

/// Default bound on a single store operation, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Format of the display-only `time` field on messages.
pub const TIME_FORMAT: &str = "%H:%M:%S";

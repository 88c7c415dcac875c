// Single source of truth for all default values.

// --- Evaluation ---
pub const DEFAULT_EVALUATION_INTERVAL_SECS: u64 = 3600; // 1 hour
pub const DEFAULT_RUN_ESCALATION: bool = true;

// --- Notification ---
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 8;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "vigil.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Observability ---
pub const DEFAULT_LOG_FILTER: &str = "vigil=info";

// --- Rules ---
pub const DEFAULT_ESCALATE_AFTER_DAYS: u32 = 3;
pub const DEFAULT_ESCALATION_RECIPIENT: &str = "compliance-manager";
pub const DEFAULT_RECIPIENT: &str = "compliance-officer";

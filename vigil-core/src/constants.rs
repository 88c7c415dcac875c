/// Vigil system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Actor recorded when the scheduler resolves an alert whose obligation was renewed.
pub const AUTO_RESOLVE_ACTOR: &str = "system:auto-resolved";

/// Error recorded on pending notifications left behind when the worker stops
/// before delivery settles.
pub const ABANDONED_AT_SHUTDOWN: &str = "abandoned: engine stopped before delivery settled";

/// Error recorded at startup on pending notifications from an earlier run.
pub const ABANDONED_BEFORE_RESTART: &str = "abandoned: engine restarted before delivery settled";

/// Seconds in one day, used for day-granularity expiry arithmetic.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Page size used when a paged listing asks for zero alerts.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page a paged listing returns.
pub const MAX_PAGE_SIZE: usize = 1_000;

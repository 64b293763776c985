//! Shared constants for optchain.

/// MySQL connection pool: maximum connections.
pub const MYSQL_POOL_MAX_CONNECTIONS: u32 = 10;

/// MySQL connection pool: default acquire/connect timeout in seconds.
pub const MYSQL_CONNECT_TIMEOUT_SECS: u64 = 10;

/// MySQL connection pool: idle timeout in seconds.
pub const MYSQL_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// MySQL connection pool: connections are recycled after this many seconds.
pub const MYSQL_POOL_MAX_LIFETIME_SECS: u64 = 3600;

/// Rows per multi-row `INSERT`. Keeps bind parameters far below MySQL's 65 535 limit.
pub const UPSERT_CHUNK_ROWS: usize = 500;

/// Maximum number of rows any paginated query returns.
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Largest price or strike accepted from a CSV. Keeps strike ticks far inside `i64`.
pub const MAX_PRICE: f64 = 10_000_000.0;

/// Largest accepted `STRIKE_INCREMENT`.
pub const MAX_STRIKE_INCREMENT: f64 = 10_000.0;

/// Rows shown on the preview page when no limit is requested.
pub const PREVIEW_ROWS: usize = 10;

/// Strikes shown on each side of the ATM strike when not requested.
pub const DEFAULT_STRIKE_STEPS: u32 = 10;

/// Upper bound on requested strike steps.
pub const MAX_STRIKE_STEPS: u32 = 100;

/// Regular session open, UTC (hour, minute).
pub const SESSION_OPEN_UTC: (u32, u32) = (13, 30);

/// Regular session close, UTC (hour, minute). Inclusive.
pub const SESSION_CLOSE_UTC: (u32, u32) = (20, 15);

/// Skipped-row details retained per upload; the count is always exact.
pub const MAX_REPORTED_ROW_ISSUES: usize = 20;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default maximum request body size (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

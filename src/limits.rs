//! Server configuration limits and timeouts
//!
//! # Defaults
//!
//! The defaults reproduce the classic behavior of this server: one connection
//! is accepted, fully served and closed before the next one is accepted.
//! Everything else (timeouts, header budget, shape sizes) is a safety net
//! that a well-behaved client never notices.
//!
//! All limit structures can be deserialized from the `[limits]` table of the
//! configuration file (see [`Config`](crate::config::Config)). Durations are
//! written in milliseconds.
//!
//! # Examples
//!
//! ```no_run
//! use fun_web::limits::{Concurrency, ConnLimits, ServerLimits};
//! use std::time::Duration;
//!
//! let server_limits = ServerLimits {
//!     concurrency: Concurrency::Workers(8),
//!     ..ServerLimits::default()
//! };
//! let conn_limits = ConnLimits {
//!     socket_read_timeout: Duration::from_secs(5),
//!     ..ConnLimits::default()
//! };
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Controls how accepted connections are scheduled.
///
/// # Connection management
/// ```text
///                      [------------]
///                      [ Tcp accept ]
///                      [------------]
///                            ||
///          Sequential        ||        Workers(n)
///       //===================/\====================\\
///       ||                                          ||
///       \/                                          \/
/// [--------------]   No   /----------------\   Yes   [--------------]
/// [ Serve inline ]        | Queue is full? | ======> [ Sending 503  ]
/// [--------------]        \----------------/         [--------------]
///                                 || No
///                                 \/
///                         [--------------]       [----------------]
///                         [ Add to queue ] =====> [ n worker tasks ]
///                         [--------------]       [----------------]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerLimits {
    /// Connection scheduling mode (default: [`Concurrency::Sequential`]).
    pub concurrency: Concurrency,

    /// Maximum number of accepted connections waiting for a worker
    /// (default: `250`). Only used with [`Concurrency::Workers`].
    ///
    /// When the queue is full, new connections immediately receive a
    /// `503 Service Unavailable` response and are closed.
    pub max_pending_connections: usize,

    /// Strategy for idle worker tasks (default: `Sleep(50μs)`).
    pub wait_strategy: WaitStrategy,

    /// Listen backlog passed to the operating system (default: `128`).
    pub backlog: i32,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::Sequential,
            max_pending_connections: 250,
            wait_strategy: WaitStrategy::Sleep(Duration::from_micros(50)),
            backlog: 128,
        }
    }
}

/// Connection scheduling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    /// One connection at a time: read, respond, close, then accept the next.
    Sequential,
    /// A fixed pool of long-lived worker tasks pulling connections from a queue.
    ///
    /// The route table is read-only and every handler keeps its state per call,
    /// so no synchronization beyond the queue itself is needed.
    Workers(usize),
}

/// Strategy for worker task waiting when no connections are available
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// While waiting, uses [`tokio::task::yield_now()`]
    ///
    /// Keeps latency minimal at the cost of a busy CPU.
    Yield,

    /// While waiting, uses [`tokio::time::sleep()`]
    #[serde(deserialize_with = "millis::deserialize")]
    Sleep(Duration),
}

/// Connection-level timeouts
///
/// Each connection carries exactly one request, so there is no keep-alive
/// lifetime to bound, only the individual socket operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnLimits {
    /// Maximum duration to wait for each header line (default: `2 seconds`)
    ///
    /// If a line does not arrive within this time, the connection is dropped
    /// without a response.
    #[serde(deserialize_with = "millis::deserialize")]
    pub socket_read_timeout: Duration,

    /// Maximum duration to write the whole response (default: `3 seconds`)
    #[serde(deserialize_with = "millis::deserialize")]
    pub socket_write_timeout: Duration,
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(2),
            socket_write_timeout: Duration::from_secs(3),
        }
    }
}

/// Request reading limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReqLimits {
    /// Maximum number of bytes read for the request line and headers
    /// together, terminators included (default: `8 KB`)
    ///
    /// Header fields are read and discarded, so this budget only protects
    /// the server from clients that never send the blank line. Exceeding it
    /// yields `431 Request Header Fields Too Large`.
    pub header_bytes: usize,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            header_bytes: 8 * 1024,
        }
    }
}

/// Configuration for response buffer allocation.
///
/// # Buffer Management
///
/// ```rust
/// # use fun_web::limits::RespLimits;
/// # let limits = RespLimits::default();
/// # let mut buffer: Vec<()> = Vec::with_capacity(limits.default_capacity);
/// #
/// // `buffer` is Vec
/// if buffer.capacity() > limits.max_capacity {
///     buffer = Vec::with_capacity(limits.default_capacity);
/// } else {
///     buffer.clear();
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RespLimits {
    /// Initial buffer capacity allocated for responses (default: `1024 B`)
    pub default_capacity: usize,
    /// Capacity above which a worker's buffer is reallocated instead of
    /// reused (default: `64 KB`)
    pub max_capacity: usize,
}

impl Default for RespLimits {
    fn default() -> Self {
        Self {
            default_capacity: 1024,
            max_capacity: 64 * 1024,
        }
    }
}

/// Bounds for the ASCII-art generators
///
/// `howMany` is clamped to `max_count` and the starting radius or side
/// length to `max_size`. With the defaults a single response stays below
/// a few megabytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShapeLimits {
    /// Maximum number of shapes per response (default: `64`)
    pub max_count: i32,
    /// Maximum starting radius or side length (default: `128`)
    pub max_size: i32,
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            max_count: 64,
            max_size: 128,
        }
    }
}

/// Grouped limits, as found in the `[limits]` table of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub server: ServerLimits,
    pub connection: ConnLimits,
    pub request: ReqLimits,
    pub response: RespLimits,
    pub shapes: ShapeLimits,
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }
}

//! 错误类型
//!
//! 配置错误在构造阶段返回，仿真过程中不会出现；不变量违反表示内核本身有 bug，
//! 一旦出现立即终止本次运行，避免污染后续统计。

use thiserror::Error;

/// 构造站点/网络时的配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown allocation policy '{0}' (expected first_idle, round_robin or faster_first)")]
    UnknownPolicy(String),

    #[error("unknown service distribution '{0}' (expected exponential, constant or uniform)")]
    UnknownDistribution(String),

    #[error("unknown client type '{0}'")]
    UnknownClientType(String),

    #[error("unknown routing outcome '{0}' (expected departure or overflow)")]
    UnknownOutcome(String),

    #[error("station '{station}': {what} must be a positive finite number, got {value}")]
    NonPositiveRate {
        station: String,
        what: &'static str,
        value: f64,
    },

    #[error("station '{station}': service cost must be finite and non-negative, got {value}")]
    InvalidCost { station: String, value: f64 },

    #[error("station '{station}': server count must be at least 1")]
    ZeroServers { station: String },

    #[error("station '{station}': capacity must be at least 1")]
    ZeroCapacity { station: String },

    #[error("station '{station}': capacity {capacity} is smaller than the server count {servers}")]
    CapacityBelowServers {
        station: String,
        capacity: usize,
        servers: usize,
    },

    #[error("station '{station}': expected 1 or {expected} {what}, got {got}")]
    LengthMismatch {
        station: String,
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("station '{station}': policy {policy} requires a finite number of servers")]
    PolicyNeedsFiniteServers { station: String, policy: String },

    #[error("station '{station}': service costs require a finite number of servers")]
    CostsNeedFiniteServers { station: String },

    #[error("station '{station}': fraction of type-B clients must lie in [0, 1], got {value}")]
    InvalidFraction { station: String, value: f64 },

    #[error("route delay must be finite and non-negative, got {0}")]
    InvalidDelay(f64),

    #[error("horizon must be finite and non-negative, got {0}")]
    InvalidHorizon(f64),

    #[error("duplicate station name '{0}'")]
    DuplicateStation(String),

    #[error("unknown station '{0}'")]
    UnknownStation(String),

    #[error("unsupported scenario schema_version {0}")]
    UnsupportedSchema(u32),

    #[error("scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 内核不变量被破坏（致命）
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("event popped out of order: at={at} < now={now}")]
    OutOfOrderEvent { at: f64, now: f64 },

    #[error("station '{station}': select_server called with no idle server")]
    NoIdleServer { station: String },

    #[error("station '{station}': server id {server} out of range (pool has {servers})")]
    UnknownServer {
        station: String,
        server: usize,
        servers: usize,
    },

    #[error("station '{station}': queue length {queue_len} != pending count {pending}")]
    QueueLengthMismatch {
        station: String,
        queue_len: usize,
        pending: usize,
    },

    #[error("station '{station}': {busy} busy servers, expected {expected}")]
    BusyServerMismatch {
        station: String,
        busy: usize,
        expected: usize,
    },

    #[error("station '{station}': pending count {pending} exceeds capacity {capacity}")]
    CapacityExceeded {
        station: String,
        pending: usize,
        capacity: usize,
    },

    #[error("station '{station}': departure for client {client} on server {server}, which is not in service there")]
    ClientNotInService {
        station: String,
        client: u64,
        server: usize,
    },

    #[error("event addressed to unknown station id {0}")]
    UnknownStation(usize),

    #[error("exponential sampling with non-positive or non-finite rate {0}")]
    InvalidRate(f64),
}

/// 顶层错误：区分配置失败、致命的内核错误与读写失败
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("fatal invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

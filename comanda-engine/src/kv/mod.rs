//! Key-value store abstraction
//!
//! The notification aggregator talks to a string KV store with per-key
//! TTL and a score-ordered index. Single-key set/get are atomic; the
//! read-then-write merge sequence is not, and no primitive here pretends
//! otherwise.
//!
//! [`MemoryKv`] is the bundled process-local implementation; a networked
//! store slots in behind the same trait.

pub mod memory;

pub use memory::MemoryKv;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// KV store errors (infra-class)
#[derive(Debug, Error)]
pub enum KvError {
    #[error("kv store unavailable: {0}")]
    Unavailable(String),

    #[error("kv backend error: {0}")]
    Backend(String),
}

pub type KvResult<T> = Result<T, KvError>;

/// String key-value store with per-key TTL and a score-ordered index
///
/// Implementations must make single-key `set`/`get`/`delete` atomic.
/// Expired keys behave as absent everywhere.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store a value, optionally bounded by a TTL
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()>;

    /// Fetch a value; None when absent or expired
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Remove a key; true when it existed
    async fn delete(&self, key: &str) -> KvResult<bool>;

    /// Whether a live key exists
    async fn exists(&self, key: &str) -> KvResult<bool>;

    /// Add a member to a score-ordered index, replacing any prior score
    async fn zadd(&self, index: &str, member: &str, score: i64) -> KvResult<()>;

    /// Members of an index by descending score, inclusive `start..=stop`
    /// positions; negative positions count from the end
    async fn zrevrange(&self, index: &str, start: isize, stop: isize) -> KvResult<Vec<String>>;

    /// Remove a member from an index; true when it was present
    async fn zrem(&self, index: &str, member: &str) -> KvResult<bool>;

    /// Refresh the TTL of a key or index; false when absent
    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool>;

    /// Health check against the backing store
    async fn ping(&self) -> KvResult<()>;
}

//! Process-local KV store
//!
//! DashMap-backed implementation with lazy TTL expiry: expired entries
//! are treated as absent on read and purged opportunistically. Suitable
//! for tests, development, and single-node deployments.

use super::{KvResult, KvStore};
use crate::utils::time::now_millis;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

struct ValueEntry {
    value: String,
    expires_at: Option<i64>,
}

impl ValueEntry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Score-ordered index. Ties sort by insertion sequence so a later add
/// with the same score lists first in `zrevrange`.
#[derive(Default)]
struct SortedIndex {
    scores: HashMap<String, (i64, u64)>,
    ordered: BTreeSet<(i64, u64, String)>,
    expires_at: Option<i64>,
}

impl SortedIndex {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn clear(&mut self) {
        self.scores.clear();
        self.ordered.clear();
        self.expires_at = None;
    }

    fn insert(&mut self, member: &str, score: i64, seq: u64) {
        if let Some((old_score, old_seq)) = self.scores.remove(member) {
            self.ordered.remove(&(old_score, old_seq, member.to_string()));
        }
        self.scores.insert(member.to_string(), (score, seq));
        self.ordered.insert((score, seq, member.to_string()));
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some((score, seq)) => {
                self.ordered.remove(&(score, seq, member.to_string()));
                true
            }
            None => false,
        }
    }
}

/// In-memory [`KvStore`] implementation
pub struct MemoryKv {
    entries: DashMap<String, ValueEntry>,
    indexes: DashMap<String, SortedIndex>,
    /// Shift applied to the wall clock; lets tests cross TTL boundaries
    /// without sleeping
    clock_offset_ms: AtomicI64,
    zadd_seq: AtomicU64,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            indexes: DashMap::new(),
            clock_offset_ms: AtomicI64::new(0),
            zadd_seq: AtomicU64::new(0),
        }
    }

    /// Move the store clock forward, expiring everything whose TTL falls
    /// inside the jump
    pub fn advance(&self, by: Duration) {
        self.clock_offset_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    fn now(&self) -> i64 {
        now_millis() + self.clock_offset_ms.load(Ordering::SeqCst)
    }

    fn deadline(&self, ttl: Option<Duration>) -> Option<i64> {
        ttl.map(|ttl| self.now() + ttl.as_millis() as i64)
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let entry = ValueEntry {
            value: value.to_string(),
            expires_at: self.deadline(ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let now = self.now();
        if let Some(entry) = self.entries.get(key)
            && !entry.is_expired(now)
        {
            return Ok(Some(entry.value.clone()));
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        let now = self.now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn zadd(&self, index: &str, member: &str, score: i64) -> KvResult<()> {
        let now = self.now();
        let seq = self.zadd_seq.fetch_add(1, Ordering::SeqCst);
        let mut zset = self.indexes.entry(index.to_string()).or_default();
        if zset.is_expired(now) {
            zset.clear();
        }
        zset.insert(member, score, seq);
        Ok(())
    }

    async fn zrevrange(&self, index: &str, start: isize, stop: isize) -> KvResult<Vec<String>> {
        let now = self.now();
        let Some(zset) = self.indexes.get(index) else {
            return Ok(Vec::new());
        };
        if zset.is_expired(now) {
            return Ok(Vec::new());
        }

        let len = zset.ordered.len() as isize;
        let resolve = |pos: isize| if pos < 0 { len + pos } else { pos };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop || start >= len {
            return Ok(Vec::new());
        }

        Ok(zset
            .ordered
            .iter()
            .rev()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|(_, _, member)| member.clone())
            .collect())
    }

    async fn zrem(&self, index: &str, member: &str) -> KvResult<bool> {
        let now = self.now();
        let Some(mut zset) = self.indexes.get_mut(index) else {
            return Ok(false);
        };
        if zset.is_expired(now) {
            zset.clear();
            return Ok(false);
        }
        Ok(zset.remove(member))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        let now = self.now();
        let deadline = now + ttl.as_millis() as i64;

        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_expired(now) {
                drop(entry);
                self.entries.remove(key);
            } else {
                entry.expires_at = Some(deadline);
                return Ok(true);
            }
        }

        if let Some(mut zset) = self.indexes.get_mut(key) {
            if zset.is_expired(now) {
                zset.clear();
                return Ok(false);
            }
            zset.expires_at = Some(deadline);
            return Ok(true);
        }

        Ok(false)
    }

    async fn ping(&self) -> KvResult<()> {
        Ok(())
    }
}

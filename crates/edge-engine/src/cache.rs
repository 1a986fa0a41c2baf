//! Result cache and in-flight request de-duplication
//!
//! The cache maps a snapshot [`Fingerprint`] to its completed
//! [`AnalysisResult`] for a bounded time window. It is injected into the
//! orchestrator behind the [`CacheStore`] trait so an external backing store
//! can be swapped in without touching the engine.
//!
//! The [`InflightTable`] is a separate structure: it de-duplicates expensive
//! concurrent runs for the same fingerprint. It is a cost optimization only;
//! two independent runs for one fingerprint are wasteful but harmless.

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use edge_core::{AnalysisResult, Fingerprint};

use crate::error::Result;

/// Key-value store for completed analysis results
///
/// `get` must return `None` for entries whose TTL has elapsed (evicting them
/// as a side effect is expected); `put` overwrites any existing entry for the
/// fingerprint and is idempotent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AnalysisResult>>;

    async fn put(&self, fingerprint: Fingerprint, result: AnalysisResult) -> Result<()>;
}

/// In-memory cache with TTL eviction on read
pub struct MemoryCache {
    cache: Mutex<TimedCache<Fingerprint, AnalysisResult>>,
}

impl MemoryCache {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(TimedCache::with_lifespan(ttl)),
        }
    }

    /// Number of live entries (expired entries may still be counted until
    /// their next lookup)
    pub async fn len(&self) -> usize {
        self.cache.lock().await.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<AnalysisResult>> {
        let mut cache = self.cache.lock().await;
        let hit = cache.cache_get(fingerprint).cloned();
        debug!(fingerprint = %fingerprint, hit = hit.is_some(), "Cache lookup");
        Ok(hit)
    }

    async fn put(&self, fingerprint: Fingerprint, result: AnalysisResult) -> Result<()> {
        let mut cache = self.cache.lock().await;
        let _ = cache.cache_set(fingerprint, result);
        Ok(())
    }
}

type ResultWatch = watch::Receiver<Option<AnalysisResult>>;
type InflightMap = HashMap<Fingerprint, ResultWatch>;

/// Outcome of joining the in-flight table for a fingerprint
pub enum Inflight {
    /// No run was in flight; the caller leads and must drop the guard (after
    /// optionally publishing) when its run ends
    Leader(InflightGuard),

    /// Another run is already in flight; await its published result
    Follower(ResultWatch),
}

/// Leadership guard for one in-flight run
///
/// Dropping the guard removes the fingerprint from the table; followers whose
/// leader dropped without publishing fall back to running themselves.
pub struct InflightGuard {
    fingerprint: Fingerprint,
    map: Arc<StdMutex<InflightMap>>,
    tx: watch::Sender<Option<AnalysisResult>>,
}

impl InflightGuard {
    /// Hand the completed result to any waiting followers
    pub fn publish(&self, result: &AnalysisResult) {
        let _ = self.tx.send(Some(result.clone()));
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.remove(&self.fingerprint);
    }
}

/// De-duplication table for concurrent runs of the same fingerprint
#[derive(Default)]
pub struct InflightTable {
    map: Arc<StdMutex<InflightMap>>,
}

impl InflightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the table for a fingerprint: become the leader if nobody is
    /// running it, otherwise follow the existing run
    pub fn join(&self, fingerprint: &Fingerprint) -> Inflight {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(rx) = map.get(fingerprint) {
            return Inflight::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        map.insert(fingerprint.clone(), rx);
        Inflight::Leader(InflightGuard {
            fingerprint: fingerprint.clone(),
            map: Arc::clone(&self.map),
            tx,
        })
    }

    /// Number of runs currently in flight
    pub fn len(&self) -> usize {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Await the result published by an in-flight leader
///
/// Returns `None` when the leader went away without publishing (failed,
/// timed out, or was cancelled); the caller should then run its own analysis.
pub async fn await_leader(mut rx: ResultWatch) -> Option<AnalysisResult> {
    loop {
        if let Some(result) = rx.borrow().clone() {
            return Some(result);
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn result(fp: &str) -> AnalysisResult {
        let now = Utc::now();
        AnalysisResult {
            fingerprint: Fingerprint::from_raw(fp),
            created_at: now,
            expires_at: now + ChronoDuration::minutes(30),
            market_title: "T".to_string(),
            foundational: None,
            historical: None,
            sentiment: None,
            outcome_estimates: None,
            total_elapsed_seconds: 1.0,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let fp = Fingerprint::from_raw("abc");
        cache.put(fp.clone(), result("abc")).await.expect("put");

        let hit = cache.get(&fp).await.expect("get");
        assert!(hit.is_some());
        assert_eq!(hit.map(|r| r.market_title), Some("T".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryCache::new(Duration::from_millis(30));
        let fp = Fingerprint::from_raw("abc");
        cache.put(fp.clone(), result("abc")).await.expect("put");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get(&fp).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let fp = Fingerprint::from_raw("abc");

        let mut first = result("abc");
        first.total_elapsed_seconds = 1.0;
        let mut second = result("abc");
        second.total_elapsed_seconds = 2.0;

        cache.put(fp.clone(), first).await.expect("put");
        cache.put(fp.clone(), second).await.expect("put");

        let hit = cache.get(&fp).await.expect("get").expect("hit");
        assert_eq!(hit.total_elapsed_seconds, 2.0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_inflight_leader_then_follower() {
        let table = InflightTable::new();
        let fp = Fingerprint::from_raw("abc");

        let Inflight::Leader(guard) = table.join(&fp) else {
            panic!("first join should lead");
        };
        let Inflight::Follower(rx) = table.join(&fp) else {
            panic!("second join should follow");
        };

        guard.publish(&result("abc"));
        let followed = await_leader(rx).await;
        assert!(followed.is_some());

        drop(guard);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_follower_sees_leader_vanish() {
        let table = InflightTable::new();
        let fp = Fingerprint::from_raw("abc");

        let Inflight::Leader(guard) = table.join(&fp) else {
            panic!("first join should lead");
        };
        let Inflight::Follower(rx) = table.join(&fp) else {
            panic!("second join should follow");
        };

        // Leader cancelled without publishing
        drop(guard);
        assert!(await_leader(rx).await.is_none());

        // Table is clean; the follower can now lead its own run
        assert!(matches!(table.join(&fp), Inflight::Leader(_)));
    }
}

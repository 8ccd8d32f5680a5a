use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::clock::Clock;

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub keys: usize,
    pub hits: u64,
    pub misses: u64,
}

/// 读穿结果，`cached` 表示值是否来自缓存
#[derive(Debug, Clone)]
pub struct CacheLookup<V> {
    pub value: V,
    pub cached: bool,
}

/// 进程内 TTL 缓存
///
/// 过期判断发生在读取时，后台清理只是顺便回收内存。
pub struct CacheStore<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> CacheStore<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let found = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            _ => None,
        };

        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.entries.remove_if(key, |_, entry| !entry.is_live(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// 写入或覆盖，TTL 从此刻重新计算
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let ttl = chrono::Duration::milliseconds(ttl.as_millis() as i64);
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    /// 命中直接返回；未命中调用 `compute`，成功才写入缓存
    ///
    /// 同一个键的并发未命中不会合并，可能各自调用一次 `compute`，后写者覆盖。
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            tracing::debug!("cache hit: {}", key);
            return Ok(CacheLookup {
                value,
                cached: true,
            });
        }

        tracing::debug!("cache miss: {}", key);
        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(CacheLookup {
            value,
            cached: false,
        })
    }

    /// 清空全部条目，返回删除数量
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, _| {
            removed += 1;
            false
        });
        removed
    }

    /// 删除已过期条目，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// `keys` 只统计未过期的条目
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        CacheStats {
            keys: self
                .entries
                .iter()
                .filter(|entry| entry.value().is_live(now))
                .count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    tracing::info!("cache sweep removed {} expired entries", removed);
                }
            }
        })
    }
}

//! 级联下拉的响应缓存
//!
//! 以 `(链节点 id, 父级值)` 为键缓存后端返回的记录列表，支持：
//! - TTL 过期：查询时惰性检查，过期项直接删除并视为未命中，不做后台清理
//! - 可选容量限制：超过容量淘汰最久未使用的项
//! - 可注入时钟：便于测试 TTL 行为
//!
//! # 使用示例
//!
//! ```rust
//! use std::time::Duration;
//! use cascade_selector::data::cache::{CacheKey, ResponseCache};
//!
//! let mut cache = ResponseCache::new(Duration::from_secs(300), None);
//! cache.insert(CacheKey::new("customer", None), vec![]);
//! assert!(cache.get(&CacheKey::new("customer", None)).is_some());
//! ```

use crate::models::Record;
use linked_hash_map::LinkedHashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// 时间来源
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 系统单调时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 手动推进的时钟，用于测试
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or_default();
        self.base + offset
    }
}

/// 父级值：区分"无父级"与"父级为空字符串"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentKey {
    Root,
    Value(String),
}

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub link_id: String,
    pub parent: ParentKey,
}

impl CacheKey {
    pub fn new(link_id: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            link_id: link_id.into(),
            parent: match parent {
                Some(value) => ParentKey::Value(value.to_string()),
                None => ParentKey::Root,
            },
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            ParentKey::Root => write!(f, "{}#root", self.link_id),
            ParentKey::Value(v) => write!(f, "{}={:?}", self.link_id, v),
        }
    }
}

/// 缓存条目，包含记录和创建时间
#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<Record>,
    created_at: Instant,
}

pub struct ResponseCache {
    entries: LinkedHashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl ResponseCache {
    /// 创建使用系统时钟的缓存
    ///
    /// - `ttl`: 缓存项的生存时间
    /// - `max_entries`: 最大条目数，`None` 表示不限
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            ttl,
            max_entries,
            clock,
        }
    }

    /// 获取缓存的记录
    ///
    /// 仅当 `now - created_at < ttl` 时命中，命中项移至最近使用位置；
    /// 过期项在此处删除。
    pub fn get(&mut self, key: &CacheKey) -> Option<&[Record]> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => now.saturating_duration_since(entry.created_at) >= self.ttl,
        };

        if expired {
            tracing::debug!(key = %key, "缓存已过期");
            self.entries.remove(key);
            return None;
        }

        self.entries
            .get_refresh(key)
            .map(|entry| entry.records.as_slice())
    }

    /// 插入记录，已存在的键会刷新创建时间
    pub fn insert(&mut self, key: CacheKey, records: Vec<Record>) {
        self.entries.remove(&key);

        if let Some(max) = self.max_entries {
            while max > 0 && self.entries.len() >= max {
                if let Some((evicted, _)) = self.entries.pop_front() {
                    tracing::debug!(key = %evicted, "缓存容量已满，淘汰最久未使用项");
                }
            }
        }

        let entry = CacheEntry {
            records,
            created_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
    }

    /// 当前条目数（包含尚未被查询淘汰的过期项）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

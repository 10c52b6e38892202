//! 缓存层实现
//!
//! - `response_cache`: 级联下拉响应缓存（惰性 TTL + 可选容量限制）

pub mod response_cache;

pub use response_cache::{CacheKey, Clock, ManualClock, ParentKey, ResponseCache, SystemClock};

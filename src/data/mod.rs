//! 数据层
//!
//! - `cache`: 后端响应缓存

pub mod cache;

pub use cache::{CacheKey, ResponseCache};

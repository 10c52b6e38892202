// lib.rs - 级联下拉选择缓存，供 CLI 与 UI 层使用

pub mod core;
pub mod data;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::core::{build_http_client, init_logger, AppError, AppResult};
pub use data::cache::{CacheKey, ResponseCache};
pub use models::*;
pub use services::cascade::{
    spawn_event_loop, CascadeSelector, ChainState, FieldView, LinkState, SelectionCallback,
    SelectorEvent, SelectorOptions,
};
pub use services::source::{HttpOptionSource, OptionSource};

use std::sync::Arc;

/// 根据配置构建 HTTP 数据源并初始化选择器，返回前等待第一个字段加载完成
pub async fn selector_from_config(
    config: &AppConfig,
    options: SelectorOptions,
) -> AppResult<CascadeSelector> {
    let client = build_http_client(&config.http)?;
    let source = HttpOptionSource::new(client, &config.base_url)?;
    let options = options.with_cache(config.cache);
    let selector = CascadeSelector::initialize(config.chain.clone(), Arc::new(source), options)?;
    selector.wait_ready().await;
    Ok(selector)
}

//! 级联选择器
//!
//! `CascadeSelector` 在 `ChainState` 之上驱动异步加载：
//! 选择变化 → 级联重置下游 → 以所选值为过滤参数加载下一个字段。
//!
//! 状态保存在 `Arc<Mutex<ChainState>>` 中，锁只在同步片段内持有，
//! 因此同一字段的多次加载可以交叠；响应是否写入字段由 `ChainState::complete_load` 判定。
//! 每次状态变化后，渲染结果会发布到 `watch` 通道，供 UI 层订阅。

use crate::core::error::AppResult;
use crate::data::cache::{Clock, ResponseCache};
use crate::models::{CacheConfig, ChainLink, Snapshot};
use crate::services::cascade::state::{ChainState, FieldView, LinkState, LoadOutcome, LoadTicket};
use crate::services::source::OptionSource;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 选择变化回调：`(变化的值, 当前完整快照)`
pub type SelectionCallback = Arc<dyn Fn(&str, &Snapshot) + Send + Sync>;

#[derive(Clone, Default)]
pub struct SelectorOptions {
    pub cache: CacheConfig,
    pub on_change: Option<SelectionCallback>,
    /// 缓存使用的时钟，默认系统时钟
    pub clock: Option<Arc<dyn Clock>>,
}

impl SelectorOptions {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Snapshot) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

struct Inner {
    state: Mutex<ChainState>,
    source: Arc<dyn OptionSource>,
    on_change: Option<SelectionCallback>,
    view_tx: watch::Sender<Vec<FieldView>>,
    initial_load: Mutex<Option<JoinHandle<LinkState>>>,
}

#[derive(Clone)]
pub struct CascadeSelector {
    inner: Arc<Inner>,
}

impl CascadeSelector {
    /// 校验链配置并开始加载第一个字段（无父级过滤）
    ///
    /// 返回时第一个字段已处于 `Loading`，请求在后台任务中进行，
    /// 可用 `wait_ready` 等待其完成。必须在 tokio 运行时内调用。
    /// 链为空或配置缺失时返回 `Configuration` 错误。
    pub fn initialize(
        chain: Vec<ChainLink>,
        source: Arc<dyn OptionSource>,
        options: SelectorOptions,
    ) -> AppResult<Self> {
        let cache = match options.clock {
            Some(clock) => {
                ResponseCache::with_clock(options.cache.ttl(), options.cache.max_entries, clock)
            }
            None => ResponseCache::new(options.cache.ttl(), options.cache.max_entries),
        };
        let mut state = ChainState::new(chain, cache)?;
        let outcome = state.begin_load(0, None)?;
        let (view_tx, _) = watch::channel(state.render());

        tracing::info!(
            links = state.len(),
            ttl_secs = options.cache.ttl_secs,
            "级联选择器初始化"
        );

        let selector = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                source,
                on_change: options.on_change,
                view_tx,
                initial_load: Mutex::new(None),
            }),
        };

        if let LoadOutcome::Fetch(ticket) = outcome {
            let task = selector.clone();
            let handle = tokio::spawn(async move { task.finish_load(ticket).await });
            *selector.lock_initial_load() = Some(handle);
        }

        Ok(selector)
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_initial_load(&self) -> MutexGuard<'_, Option<JoinHandle<LinkState>>> {
        self.inner
            .initial_load
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ChainState) {
        self.inner.view_tx.send_replace(state.render());
    }

    /// 等待 `initialize` 发起的第一个字段加载完成，返回该字段的状态
    ///
    /// 只有第一次调用会等待后台任务，之后直接返回当前状态。
    pub async fn wait_ready(&self) -> Option<LinkState> {
        let handle = self.lock_initial_load().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "第一个字段的加载任务异常退出");
            }
        }
        self.link_state(0)
    }

    /// 订阅渲染结果，每次状态变化都会推送新的字段列表
    pub fn subscribe(&self) -> watch::Receiver<Vec<FieldView>> {
        self.inner.view_tx.subscribe()
    }

    /// 加载字段 `index` 的选项，返回字段的最终状态
    ///
    /// 请求失败、状态非 2xx、JSON 解析失败和 `success: false` 都只体现在字段的
    /// `Error` 状态上，不会返回给调用方；仅下标越界返回错误。
    pub async fn load_link_data(&self, index: usize, parent: Option<&str>) -> AppResult<LinkState> {
        let outcome = {
            let mut state = self.lock();
            let outcome = state.begin_load(index, parent)?;
            self.publish(&state);
            outcome
        };

        match outcome {
            LoadOutcome::Ready => Ok(LinkState::Populated),
            LoadOutcome::Fetch(ticket) => Ok(self.finish_load(ticket).await),
        }
    }

    async fn finish_load(&self, ticket: LoadTicket) -> LinkState {
        let result = self.inner.source.fetch(&ticket.request_path).await;
        match &result {
            Ok(records) => tracing::debug!(
                link = %ticket.key.link_id,
                path = %ticket.request_path,
                count = records.len(),
                "下拉选项加载完成"
            ),
            Err(e) if e.is_load_failure() => tracing::warn!(
                link = %ticket.key.link_id,
                path = %ticket.request_path,
                error = %e,
                "下拉选项加载失败"
            ),
            // 例如端点路径无法解析：同样落到字段的错误状态，但属于配置问题
            Err(e) => tracing::error!(
                link = %ticket.key.link_id,
                path = %ticket.request_path,
                error = %e,
                "下拉选项请求无法发出"
            ),
        }

        let mut state = self.lock();
        let final_state = state.complete_load(ticket, result);
        self.publish(&state);
        final_state
    }

    /// 处理字段 `index` 的选择变化
    ///
    /// 下游字段全部清空并禁用；值非空且存在下游时加载下一个字段；
    /// 最后调用 `on_change` 回调。
    pub async fn on_selection_change(&self, index: usize, value: &str) -> AppResult<()> {
        let next = {
            let mut state = self.lock();
            let next = state.apply_selection(index, value)?;
            self.publish(&state);
            next
        };

        tracing::debug!(index, value, "选择变化");

        if let Some((next_index, parent)) = next {
            self.load_link_data(next_index, Some(&parent)).await?;
        }

        if let Some(callback) = &self.inner.on_change {
            let snapshot = self.selection_snapshot();
            callback(value, &snapshot);
        }
        Ok(())
    }

    pub fn selection_snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.reset();
        self.publish(&state);
        tracing::debug!("级联选择已重置");
    }

    pub fn render(&self) -> Vec<FieldView> {
        self.lock().render()
    }

    pub fn link_state(&self, index: usize) -> Option<LinkState> {
        self.lock().state(index)
    }

    /// 按链顺序恢复一组选择（如编辑已有记录时）
    ///
    /// 每个值都按用户选择处理，触发同样的级联重置与加载。遇到缺失的字段、
    /// 空值或不在已加载选项中的值时停止。返回成功应用的字段数。
    pub async fn set_selection_programmatically(&self, values: &Snapshot) -> AppResult<usize> {
        let ids: Vec<String> = self.lock().links().iter().map(|l| l.id.clone()).collect();
        let mut applied = 0;

        for (index, id) in ids.iter().enumerate() {
            let Some(value) = values.get(id).filter(|v| !v.is_empty()) else {
                break;
            };

            let known = self.lock().has_option(index, value);
            if !known {
                tracing::warn!(link = %id, value = %value, "恢复选择失败：选项不存在");
                break;
            }

            self.on_selection_change(index, value).await?;
            applied += 1;
        }

        tracing::debug!(applied, "已恢复选择");
        Ok(applied)
    }
}

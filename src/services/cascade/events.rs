//! 消息驱动接口
//!
//! UI 层通过 mpsc 通道发送 `SelectorEvent`，事件循环按到达顺序依次处理。

use crate::core::error::AppResult;
use crate::models::Snapshot;
use crate::services::cascade::selector::CascadeSelector;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEvent {
    /// 字段 `index` 的选择变为 `value`（空串表示取消选择）
    Changed { index: usize, value: String },
    Reset,
    /// 按链顺序恢复一组选择
    Restore(Snapshot),
}

impl CascadeSelector {
    pub async fn handle_event(&self, event: SelectorEvent) -> AppResult<()> {
        match event {
            SelectorEvent::Changed { index, value } => {
                self.on_selection_change(index, &value).await
            }
            SelectorEvent::Reset => {
                self.reset();
                Ok(())
            }
            SelectorEvent::Restore(values) => {
                self.set_selection_programmatically(&values).await?;
                Ok(())
            }
        }
    }
}

/// 启动事件循环，通道关闭后任务结束
pub fn spawn_event_loop(
    selector: CascadeSelector,
    mut rx: mpsc::Receiver<SelectorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = selector.handle_event(event).await {
                tracing::warn!(error = %e, "处理选择事件失败");
            }
        }
        tracing::debug!("选择事件通道已关闭");
    })
}

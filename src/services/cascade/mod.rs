//! 级联下拉选择
//!
//! - `state`: 同步状态核心（字段状态机、级联重置、快照、渲染）
//! - `selector`: 异步驱动，负责加载与回调
//! - `events`: 基于 mpsc 的消息驱动接口

pub mod events;
pub mod selector;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{spawn_event_loop, SelectorEvent};
pub use selector::{CascadeSelector, SelectionCallback, SelectorOptions};
pub use state::{validate_chain, ChainState, FieldView, LinkState, LoadOutcome, LoadTicket};

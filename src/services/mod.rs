// 服务层模块
//
// - source: 下拉选项数据源（REST 后端）
// - cascade: 级联选择器

pub mod cascade;
pub mod source;

pub use cascade::{CascadeSelector, SelectorEvent, SelectorOptions};
pub use source::{HttpOptionSource, OptionSource};

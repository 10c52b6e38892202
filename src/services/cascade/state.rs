//! 级联链状态
//!
//! `ChainState` 是不含 I/O 的同步核心：持有链配置、每个字段的选择状态与响应缓存。
//! 网络请求由调用方完成，加载被拆成 `begin_load` / `complete_load` 两步，
//! 渲染结果 `render()` 只取决于当前状态。
//!
//! 字段状态机：`Empty → Loading → Populated`，或 `Loading → Error`；
//! 上游选择变化时，下游字段回到 `Empty`（清空并禁用）。
//!
//! 每个字段记录当前绑定的父级值。加载完成时只有父级值仍然匹配才会写入字段，
//! 因此重置或取消上游选择之后返回的响应不会重新启用字段；
//! 同一父级值的多次加载仍按完成顺序覆盖。

use crate::core::error::{AppError, AppResult};
use crate::data::cache::{CacheKey, ParentKey, ResponseCache};
use crate::models::{ChainLink, Record, SelectOption, Snapshot};
use serde::Serialize;
use std::collections::HashSet;

const LOADING_TEXT: &str = "加载中...";
const FAILED_TEXT: &str = "加载失败";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Empty,
    Loading,
    Populated,
    Error,
}

/// 单个字段的渲染结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub state: LinkState,
    pub enabled: bool,
    /// 未选择项显示的文本（加载中 / 加载失败 / 请选择）
    pub placeholder: String,
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一次未命中缓存的加载，需要调用方获取数据后交回 `complete_load`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub index: usize,
    pub key: CacheKey,
    pub request_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 缓存命中，字段已填充
    Ready,
    /// 需要请求 `ticket.request_path`
    Fetch(LoadTicket),
}

#[derive(Debug, Clone)]
struct LinkSlot {
    state: LinkState,
    options: Vec<SelectOption>,
    selected: Option<String>,
    error: Option<String>,
    /// 最近一次加载使用的父级值，字段被清空时为 None
    parent: Option<ParentKey>,
}

impl LinkSlot {
    fn empty() -> Self {
        Self {
            state: LinkState::Empty,
            options: Vec::new(),
            selected: None,
            error: None,
            parent: None,
        }
    }
}

#[derive(Debug)]
pub struct ChainState {
    links: Vec<ChainLink>,
    slots: Vec<LinkSlot>,
    cache: ResponseCache,
}

impl ChainState {
    pub fn new(links: Vec<ChainLink>, cache: ResponseCache) -> AppResult<Self> {
        validate_chain(&links)?;
        let slots = links.iter().map(|_| LinkSlot::empty()).collect();
        Ok(Self {
            links,
            slots,
            cache,
        })
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<LinkState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    pub fn has_option(&self, index: usize, value: &str) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.options.iter().any(|o| o.value == value))
    }

    fn check_index(&self, index: usize) -> AppResult<()> {
        if index < self.links.len() {
            Ok(())
        } else {
            Err(AppError::InvalidLink {
                index,
                len: self.links.len(),
            })
        }
    }

    /// 开始加载字段 `index`
    ///
    /// 字段及其下游先被清空；缓存命中时直接填充，否则进入 `Loading` 并返回请求票据。
    pub fn begin_load(&mut self, index: usize, parent: Option<&str>) -> AppResult<LoadOutcome> {
        self.check_index(index)?;
        self.clear_from(index);

        let link = &self.links[index];
        let key = CacheKey::new(link.id.clone(), parent);
        self.slots[index].parent = Some(key.parent.clone());

        if let Some(records) = self.cache.get(&key) {
            tracing::debug!(link = %link.id, key = %key, "缓存命中");
            let options = records.iter().map(|r| link.project(r)).collect();
            self.populate(index, options);
            return Ok(LoadOutcome::Ready);
        }

        let request_path = link.request_path(parent);
        self.slots[index].state = LinkState::Loading;

        Ok(LoadOutcome::Fetch(LoadTicket {
            index,
            key,
            request_path,
        }))
    }

    /// 完成加载，返回字段的最终状态
    ///
    /// 字段已被清空或已改绑其他父级值时，结果只写入缓存，字段保持不变。
    /// 同一父级值的多次加载中，后完成者覆盖先完成者。
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: AppResult<Vec<Record>>,
    ) -> LinkState {
        let index = ticket.index;
        let Some(slot) = self.slots.get(index) else {
            return LinkState::Empty;
        };

        if slot.parent.as_ref() != Some(&ticket.key.parent) {
            let current = slot.state;
            tracing::debug!(key = %ticket.key, "字段已不再等待该响应，忽略");
            if let Ok(records) = result {
                self.cache.insert(ticket.key, records);
            }
            return current;
        }

        self.clear_from(index + 1);
        match result {
            Ok(records) => {
                let link = &self.links[index];
                let options = records.iter().map(|r| link.project(r)).collect();
                self.cache.insert(ticket.key, records);
                self.populate(index, options);
            }
            Err(e) => {
                let slot = &mut self.slots[index];
                slot.state = LinkState::Error;
                slot.options.clear();
                slot.selected = None;
                slot.error = Some(e.to_string());
            }
        }

        self.slots[index].state
    }

    /// 记录字段 `index` 的选择并级联重置下游
    ///
    /// 空字符串表示取消选择。返回需要接着加载的下游字段及其父级值。
    pub fn apply_selection(
        &mut self,
        index: usize,
        value: &str,
    ) -> AppResult<Option<(usize, String)>> {
        self.check_index(index)?;

        if !value.is_empty() && !self.has_option(index, value) {
            return Err(AppError::InvalidSelection {
                link: self.links[index].id.clone(),
                value: value.to_string(),
            });
        }

        self.slots[index].selected = (!value.is_empty()).then(|| value.to_string());
        self.clear_from(index + 1);

        let next = index + 1;
        if !value.is_empty() && next < self.links.len() {
            Ok(Some((next, value.to_string())))
        } else {
            Ok(None)
        }
    }

    /// 清空第一个字段的选择，其余字段回到 `Empty`
    pub fn reset(&mut self) {
        if let Some(first) = self.slots.first_mut() {
            first.selected = None;
        }
        self.clear_from(1);
    }

    /// 当前选择快照：字段 id → 值，以及所选选项上配置的附加属性
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (link, slot) in self.links.iter().zip(&self.slots) {
            let Some(value) = slot.selected.as_deref() else {
                continue;
            };
            snapshot.insert(link.id.clone(), value.to_string());

            if let Some(option) = slot.options.iter().find(|o| o.value == value) {
                for attr in &link.data_attributes {
                    if let Some(attr_value) = option.attributes.get(attr) {
                        snapshot.insert(attr.clone(), attr_value.clone());
                    }
                }
            }
        }
        snapshot
    }

    pub fn render(&self) -> Vec<FieldView> {
        self.links
            .iter()
            .zip(&self.slots)
            .map(|(link, slot)| FieldView {
                id: link.id.clone(),
                label: link.label.clone(),
                state: slot.state,
                enabled: slot.state == LinkState::Populated,
                placeholder: match slot.state {
                    LinkState::Loading => LOADING_TEXT.to_string(),
                    LinkState::Error => FAILED_TEXT.to_string(),
                    LinkState::Empty | LinkState::Populated => link.unselected_text(),
                },
                options: slot.options.clone(),
                selected: slot.selected.clone(),
                error: slot.error.clone(),
            })
            .collect()
    }

    fn populate(&mut self, index: usize, options: Vec<SelectOption>) {
        let slot = &mut self.slots[index];
        slot.state = LinkState::Populated;
        slot.options = options;
        slot.selected = None;
        slot.error = None;
    }

    fn clear_from(&mut self, start: usize) {
        for slot in self.slots.iter_mut().skip(start) {
            *slot = LinkSlot::empty();
        }
    }
}

/// 校验链配置：非空，必填字段非空，id 不重复
///
/// 快照是扁平的键值表，附加属性名不能与任何链节点 id 或其他附加属性重名。
pub fn validate_chain(links: &[ChainLink]) -> AppResult<()> {
    if links.is_empty() {
        return Err(AppError::configuration("级联链不能为空"));
    }

    let mut ids = HashSet::new();
    for (i, link) in links.iter().enumerate() {
        let required = [
            ("id", &link.id),
            ("endpoint", &link.endpoint),
            ("value_field", &link.value_field),
            ("text_field", &link.text_field),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::configuration(format!("第 {i} 个链节点缺少 {name}")));
            }
        }
        if !ids.insert(link.id.as_str()) {
            return Err(AppError::configuration(format!("链节点 id 重复: {}", link.id)));
        }
    }

    let mut attributes = HashSet::new();
    for link in links {
        for attr in &link.data_attributes {
            if ids.contains(attr.as_str()) || !attributes.insert(attr.as_str()) {
                return Err(AppError::configuration(format!(
                    "链节点 {} 的附加属性与快照中已有的键重名: {attr}",
                    link.id
                )));
            }
        }
    }
    Ok(())
}

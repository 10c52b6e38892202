// 测试用数据源与链配置

use crate::core::error::{AppError, AppResult};
use crate::models::{ChainLink, Record};
use crate::services::source::OptionSource;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone)]
enum Canned {
    Rows(Vec<Record>),
    Status(u16),
    Backend(Option<String>),
}

/// 按请求路径返回预设结果，并记录所有请求
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<String, Canned>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, rows: Value) -> Self {
        let records = rows
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();
        self.responses
            .insert(path.to_string(), Canned::Rows(records));
        self
    }

    pub fn fail(mut self, path: &str, status: u16) -> Self {
        self.responses
            .insert(path.to_string(), Canned::Status(status));
        self
    }

    pub fn backend_failure(mut self, path: &str, message: &str) -> Self {
        self.responses.insert(
            path.to_string(),
            Canned::Backend(Some(message.to_string())),
        );
        self
    }

    pub fn delay(mut self, path: &str, by: Duration) -> Self {
        self.delays.insert(path.to_string(), by);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == path).count()
    }
}

#[async_trait]
impl OptionSource for MockSource {
    async fn fetch(&self, request_path: &str) -> AppResult<Vec<Record>> {
        self.calls.lock().unwrap().push(request_path.to_string());

        if let Some(delay) = self.delays.get(request_path) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(request_path).cloned() {
            Some(Canned::Rows(rows)) => Ok(rows),
            Some(Canned::Status(status)) => Err(AppError::Fetch {
                url: request_path.to_string(),
                status: Some(status),
                reason: "mock".to_string(),
            }),
            Some(Canned::Backend(message)) => Err(AppError::Backend {
                url: request_path.to_string(),
                message,
            }),
            None => Err(AppError::Fetch {
                url: request_path.to_string(),
                status: Some(404),
                reason: "Not Found".to_string(),
            }),
        }
    }
}

/// 客户 → 描述 → 零件
pub fn manufacturing_chain() -> Vec<ChainLink> {
    vec![
        ChainLink::new("customer", "客户", "/customers", "id", "name"),
        ChainLink::new("description", "描述", "/descriptions", "description", "description")
            .with_parent_param("customer"),
        ChainLink::new("part", "零件", "/parts", "part_no", "part_no")
            .with_parent_param("description")
            .with_data_attributes(["revision", "unit_price"]),
    ]
}

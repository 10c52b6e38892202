//! 下拉选项数据源
//!
//! `OptionSource` 是选择器与后端之间的接缝：给定请求路径返回记录列表。
//! `HttpOptionSource` 通过 REST 接口获取 `{success, data, message?}` 信封。

use crate::core::error::{AppError, AppResult};
use crate::models::{ApiEnvelope, Record};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

#[async_trait]
pub trait OptionSource: Send + Sync {
    /// 获取 `request_path`（端点 + 可选父级查询参数）对应的记录
    async fn fetch(&self, request_path: &str) -> AppResult<Vec<Record>>;
}

/// 基于 reqwest 的 REST 数据源
///
/// 请求路径相对 `base_url` 解析：`base_url` 以 `/` 结尾时，相对路径拼接在其后，
/// 以 `/` 开头的路径则替换整个 path。
#[derive(Debug, Clone)]
pub struct HttpOptionSource {
    client: Client,
    base_url: Url,
}

impl HttpOptionSource {
    pub fn new(client: Client, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::configuration(format!("base_url 无效 ({base_url}): {e}")))?;
        Ok(Self { client, base_url })
    }

    fn resolve(&self, request_path: &str) -> AppResult<Url> {
        self.base_url
            .join(request_path)
            .map_err(|e| AppError::configuration(format!("端点路径无效 ({request_path}): {e}")))
    }
}

#[async_trait]
impl OptionSource for HttpOptionSource {
    async fn fetch(&self, request_path: &str) -> AppResult<Vec<Record>> {
        let url = self.resolve(request_path)?;
        tracing::debug!(url = %url, "请求下拉选项");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::Fetch {
                url: url.to_string(),
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("非成功状态")
                    .to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| AppError::Fetch {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;

        let envelope: ApiEnvelope =
            serde_json::from_slice(&body).map_err(|e| AppError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !envelope.success {
            return Err(AppError::Backend {
                url: url.to_string(),
                message: envelope.message,
            });
        }

        Ok(envelope.data)
    }
}

use crate::core::error::{AppError, AppResult};
use crate::models::HttpConfig;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("cascade-selector/", env!("CARGO_PKG_VERSION"));

/// 构建后端请求使用的 HTTP 客户端
///
/// 未配置超时时不单独限制请求时长，失败只通过网络错误或非 2xx 状态体现。
pub fn build_http_client(config: &HttpConfig) -> AppResult<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(proxy_url) = config.proxy.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            // 为 SOCKS5 提供更友好的错误说明
            let reason = if proxy_url.starts_with("socks5") {
                format!("SOCKS5 代理初始化失败：{e}。若需要远程 DNS 解析，建议使用 socks5h://")
            } else {
                format!("代理 URL 无效: {e}")
            };
            AppError::HttpClient { reason }
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| AppError::HttpClient {
        reason: e.to_string(),
    })
}

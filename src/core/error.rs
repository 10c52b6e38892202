//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义级联选择器的所有错误类型。
//! - `Configuration`：链配置为空或字段缺失，初始化时致命
//! - `Fetch` / `Parse` / `Backend`：加载失败，由选择器在本地转为字段的错误状态

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 链配置错误（空链、字段缺失、重复 id）
    #[error("配置错误: {reason}")]
    Configuration { reason: String },

    /// 链节点下标越界
    #[error("无效的链节点下标: {index}（链长度 {len}）")]
    InvalidLink { index: usize, len: usize },

    /// 选择的值不在该字段当前的选项中
    #[error("字段 {link} 不存在选项: {value}")]
    InvalidSelection { link: String, value: String },

    /// 网络请求失败或响应状态非 2xx
    #[error("请求失败: {url}{}: {reason}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// 响应 JSON 无法解析
    #[error("解析响应失败: {url}: {reason}")]
    Parse { url: String, reason: String },

    /// 后端返回 `success: false`
    #[error("后端返回失败: {url}: {}", .message.as_deref().unwrap_or("未知错误"))]
    Backend {
        url: String,
        message: Option<String>,
    },

    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件格式错误
    #[error("配置文件格式错误: {path}: {reason}")]
    ConfigFormat { path: PathBuf, reason: String },

    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {reason}")]
    HttpClient { reason: String },
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否属于加载失败（应在字段上显示错误状态，而不是向上传播）
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Parse { .. } | Self::Backend { .. }
        )
    }
}

use crate::models::{LogConfig, LogFormat, LogLevel, LogOutput};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 初始化日志系统
///
/// 支持级别、输出格式（JSON/纯文本）和输出目标（控制台/文件/both）。
/// 只能调用一次，重复初始化返回错误。
pub fn init_logger(config: &LogConfig) -> anyhow::Result<()> {
    let filter_layer = create_env_filter(&config.level);

    let console_layer = match config.output {
        LogOutput::Console | LogOutput::Both => Some(create_console_layer(config.format)),
        LogOutput::File => None,
    };
    let file_layer = match config.output {
        LogOutput::File | LogOutput::Both => Some(create_file_layer(
            config.format,
            config.file_path.as_deref(),
        )?),
        LogOutput::Console => None,
    };

    Registry::default()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        file_path = ?config.file_path,
        "日志系统初始化完成"
    );

    Ok(())
}

/// 创建环境过滤器
///
/// 优先读取 `RUST_LOG`，否则本 crate 使用配置级别，第三方库使用 WARN
fn create_env_filter(level: &LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cascade_selector={},hyper=warn,reqwest=warn,h2=warn,tokio=warn",
            level.as_str()
        ))
    })
}

fn create_console_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cfg!(debug_assertions))
            .with_ansi(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(cfg!(debug_assertions))
            .boxed(),
    }
}

fn create_file_layer<S>(
    format: LogFormat,
    file_path: Option<&str>,
) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let log_dir = get_log_dir(file_path)?;
    let file_appender = rolling::daily(log_dir, "cascade-selector");
    let (writer, guard) = non_blocking(file_appender);

    // guard 需要存活到进程结束，否则缓冲的日志会丢失
    Box::leak(Box::new(guard));

    let layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_target(cfg!(debug_assertions))
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .boxed(),
    };
    Ok(layer)
}

/// 获取日志目录，默认 `~/.cascade-selector/logs`
fn get_log_dir(file_path: Option<&str>) -> anyhow::Result<std::path::PathBuf> {
    let dir = match file_path {
        Some(path) => std::path::PathBuf::from(path),
        None => crate::utils::config::config_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

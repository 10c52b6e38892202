use anyhow::Context;
use cascade_selector::utils::config::{default_config_path, load_config};
use cascade_selector::{init_logger, selector_from_config, SelectorOptions, Snapshot};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

/// 加载级联链，按需恢复选择，并输出各字段的渲染结果与选择快照
#[derive(Debug, Parser)]
#[command(name = "cascade-selector", version, about)]
struct Cli {
    /// 配置文件路径（.toml 或 .json），默认 ~/.cascade-selector/config.toml
    #[arg(short, long, env = "CASCADE_SELECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// 按链顺序应用的选择，格式 id=value，可重复
    #[arg(short, long = "select", value_parser = parse_selection)]
    select: Vec<(String, String)>,

    /// 应用选择后再重置整条链
    #[arg(long)]
    reset: bool,
}

fn parse_selection(raw: &str) -> Result<(String, String), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("选择格式应为 id=value: {raw}"))?;
    if id.trim().is_empty() {
        return Err(format!("选择缺少字段 id: {raw}"));
    }
    Ok((id.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config =
        load_config(&path).with_context(|| format!("读取配置失败: {}", path.display()))?;

    init_logger(&config.log)?;

    let selector = selector_from_config(&config, SelectorOptions::default())
        .await
        .context("初始化级联选择器失败")?;

    if !cli.select.is_empty() {
        let values: Snapshot = cli.select.into_iter().collect();
        let applied = selector.set_selection_programmatically(&values).await?;
        if applied < values.len() {
            tracing::warn!(applied, requested = values.len(), "部分选择未能应用");
        }
    }

    if cli.reset {
        selector.reset();
    }

    let output = json!({
        "fields": selector.render(),
        "selection": selector.selection_snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

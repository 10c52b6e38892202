use crate::core::error::{AppError, AppResult};
use crate::models::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置目录 (~/.cascade-selector)，若不存在则创建
pub fn config_dir() -> AppResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| AppError::configuration("无法获取用户主目录"))?;
    let dir = home_dir.join(".cascade-selector");
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;
    }
    Ok(dir)
}

/// 默认配置文件路径
pub fn default_config_path() -> AppResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// 读取配置文件，按扩展名选择格式（`.json` 为 JSON，其余按 TOML 解析）
pub fn load_config(path: &Path) -> AppResult<AppConfig> {
    let content = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: AppConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| AppError::ConfigFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    } else {
        toml::from_str(&content).map_err(|e| AppError::ConfigFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    };

    tracing::debug!(path = %path.display(), links = config.chain.len(), "配置已加载");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
base_url = "http://localhost:8080/api/"

[[chain]]
id = "customer"
label = "客户"
endpoint = "customers"
value_field = "id"
text_field = "name"
"#
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api/");
        assert_eq!(config.chain[0].id, "customer");
    }

    #[test]
    fn test_load_json_config_with_camel_case_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.JSON");
        fs::write(
            &path,
            r#"{
  "base_url": "http://localhost:8080/",
  "cache": {"ttl_secs": 120},
  "chain": [
    {"id": "customer", "label": "客户", "endpoint": "customers", "valueField": "id", "textField": "name"},
    {"id": "description", "label": "描述", "endpoint": "descriptions", "parentParam": "customer",
     "valueField": "description", "textField": "description"}
  ]
}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.chain[1].parent_param.as_deref(), Some("customer"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = ").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, AppError::ConfigFormat { .. }));
    }
}

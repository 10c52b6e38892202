// 级联链配置与后端数据模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 后端返回的一行记录
pub type Record = Map<String, Value>;

/// 选择快照：链节点 id / 附加属性名 → 值
pub type Snapshot = BTreeMap<String, String>;

/// 链中的一个可选择字段
///
/// 对应前端配置 `{id, label, placeholder?, endpoint, parentParam?, valueField, textField, dataAttributes?[]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    pub endpoint: String,
    #[serde(default, alias = "parentParam")]
    pub parent_param: Option<String>,
    #[serde(alias = "valueField")]
    pub value_field: String,
    #[serde(alias = "textField")]
    pub text_field: String,
    #[serde(default, alias = "dataAttributes")]
    pub data_attributes: Vec<String>,
}

impl ChainLink {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        endpoint: impl Into<String>,
        value_field: impl Into<String>,
        text_field: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            placeholder: None,
            endpoint: endpoint.into(),
            parent_param: None,
            value_field: value_field.into(),
            text_field: text_field.into(),
            data_attributes: Vec::new(),
        }
    }

    pub fn with_parent_param(mut self, param: impl Into<String>) -> Self {
        self.parent_param = Some(param.into());
        self
    }

    pub fn with_data_attributes<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_attributes = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// 未选择时显示的占位文本
    pub fn unselected_text(&self) -> String {
        self.placeholder
            .clone()
            .unwrap_or_else(|| format!("请选择{}", self.label))
    }

    /// 构建请求路径
    ///
    /// 仅当同时存在父级值和 `parent_param` 时追加查询参数，
    /// 已带 `?` 的端点使用 `&` 连接。
    pub fn request_path(&self, parent: Option<&str>) -> String {
        match (parent, self.parent_param.as_deref()) {
            (Some(value), Some(param)) => {
                let sep = if self.endpoint.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}{}={}",
                    self.endpoint,
                    sep,
                    urlencoding::encode(param),
                    urlencoding::encode(value)
                )
            }
            _ => self.endpoint.clone(),
        }
    }

    /// 将后端记录投影为下拉选项
    pub fn project(&self, record: &Record) -> SelectOption {
        let attributes = self
            .data_attributes
            .iter()
            .map(|attr| (attr.clone(), field_as_string(record, attr)))
            .collect();

        SelectOption {
            value: field_as_string(record, &self.value_field),
            text: field_as_string(record, &self.text_field),
            attributes,
        }
    }
}

/// 下拉框中的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// 后端响应信封 `{success, data, message?}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 读取记录字段，标量转字符串，缺失或 null 为空串
fn field_as_string(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn part_link() -> ChainLink {
        ChainLink::new("part", "零件", "/parts", "part_no", "name")
            .with_parent_param("description")
            .with_data_attributes(["unit_price", "uom"])
    }

    #[test]
    fn test_request_path_with_parent() {
        let link = part_link();
        assert_eq!(link.request_path(Some("Widget")), "/parts?description=Widget");
    }

    #[test]
    fn test_request_path_encodes_value() {
        let link = part_link();
        assert_eq!(
            link.request_path(Some("Bolt & Nut")),
            "/parts?description=Bolt%20%26%20Nut"
        );
    }

    #[test]
    fn test_request_path_existing_query() {
        let mut link = part_link();
        link.endpoint = "/parts?active=1".to_string();
        assert_eq!(
            link.request_path(Some("x")),
            "/parts?active=1&description=x"
        );
    }

    #[test]
    fn test_request_path_without_parent_param() {
        let link = ChainLink::new("customer", "客户", "/customers", "id", "name");
        assert_eq!(link.request_path(Some("ignored")), "/customers");
        assert_eq!(link.request_path(None), "/customers");
    }

    #[test]
    fn test_project_stringifies_scalars() {
        let link = part_link();
        let record = json!({"part_no": 1042, "name": "Bracket", "unit_price": 3.5, "uom": null})
            .as_object()
            .cloned()
            .unwrap();

        let option = link.project(&record);
        assert_eq!(option.value, "1042");
        assert_eq!(option.text, "Bracket");
        assert_eq!(option.attributes["unit_price"], "3.5");
        assert_eq!(option.attributes["uom"], "");
    }

    #[test]
    fn test_deserialize_camel_case_aliases() {
        let link: ChainLink = serde_json::from_value(json!({
            "id": "description",
            "label": "描述",
            "endpoint": "/descriptions",
            "parentParam": "customer",
            "valueField": "description",
            "textField": "description",
            "dataAttributes": ["drawing_no"]
        }))
        .unwrap();

        assert_eq!(link.parent_param.as_deref(), Some("customer"));
        assert_eq!(link.data_attributes, vec!["drawing_no".to_string()]);
        assert_eq!(link.unselected_text(), "请选择描述");
    }

    #[test]
    fn test_configured_placeholder_overrides_default_text() {
        let link: ChainLink = serde_json::from_value(json!({
            "id": "part",
            "label": "零件",
            "placeholder": "选择零件号",
            "endpoint": "/parts",
            "valueField": "part_no",
            "textField": "part_no"
        }))
        .unwrap();

        assert_eq!(link.unselected_text(), "选择零件号");
    }

    #[test]
    fn test_envelope_defaults() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_empty());
        assert!(envelope.message.is_none());
    }
}

// ==========================================
// 电商运营数据表 - 实体 Schema 定义
// ==========================================
// 职责: 描述实体字段、列标题、校验规则、唯一键、导入模式
// 约束: Schema 在目录初始化后不可变
// ==========================================

use crate::domain::types::{FieldType, ImportMode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// ==========================================
// ValidatorParams - 校验规则参数
// ==========================================
/// 内置规则使用的参数均为可选；自定义规则的其余参数保存在 `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==========================================
// ValidatorConfig - 单条校验规则配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(rename = "type")]
    pub rule_type: String,

    #[serde(default)]
    pub params: ValidatorParams,
}

impl ValidatorConfig {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            params: ValidatorParams::default(),
        }
    }

    pub fn required() -> Self {
        Self::new("required")
    }

    pub fn number() -> Self {
        Self::new("number")
    }

    pub fn non_negative() -> Self {
        Self::new("nonNegative")
    }

    pub fn positive() -> Self {
        Self::new("positive")
    }

    pub fn date() -> Self {
        Self::new("date")
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut cfg = Self::new("enum");
        cfg.params.values = Some(values.into_iter().map(Into::into).collect());
        cfg
    }

    pub fn pattern(regex: impl Into<String>, description: Option<&str>) -> Self {
        let mut cfg = Self::new("pattern");
        cfg.params.regex = Some(regex.into());
        cfg.params.description = description.map(str::to_string);
        cfg
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        let mut cfg = Self::new("range");
        cfg.params.min = min;
        cfg.params.max = max;
        cfg
    }

    /// 覆盖默认失败提示
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.params.message = Some(message.into());
        self
    }
}

// ==========================================
// FieldSpec - 字段定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// 表格列标题
    pub title: String,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// 按声明顺序执行
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

impl FieldSpec {
    pub fn new(title: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            title: title.into(),
            field_type,
            validators: Vec::new(),
        }
    }

    pub fn computed(title: impl Into<String>) -> Self {
        Self::new(title, FieldType::Computed)
    }

    pub fn with(mut self, validator: ValidatorConfig) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_computed(&self) -> bool {
        self.field_type == FieldType::Computed
    }
}

fn default_can_import() -> bool {
    true
}

// ==========================================
// EntitySchema - 实体 Schema
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    #[serde(default)]
    pub name: String,

    /// 面向用户的实体名称（如 "销售数据"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub fields: IndexMap<String, FieldSpec>,

    /// 表头必须全部包含这些标题才能识别为该实体
    #[serde(default)]
    pub required_titles: Vec<String>,

    /// 同批次内唯一的字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,

    pub import_mode: ImportMode,

    #[serde(default = "default_can_import")]
    pub can_import: bool,

    /// 仓储记录身份字段（追加导入时按此覆盖同一记录）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity: Vec<String>,

    /// 仓储索引字段
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, import_mode: ImportMode) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            fields: IndexMap::new(),
            required_titles: Vec::new(),
            unique_key: None,
            import_mode,
            can_import: true,
            identity: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn required_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    pub fn unique_key(mut self, field: impl Into<String>) -> Self {
        self.unique_key = Some(field.into());
        self
    }

    pub fn identity<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn indexes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn importable(mut self, can_import: bool) -> Self {
        self.can_import = can_import;
        self
    }

    /// 报告中使用的实体名称
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// 字段标题，缺省时回退为字段名
    pub fn field_title<'a>(&'a self, name: &'a str) -> &'a str {
        match self.fields.get(name) {
            Some(spec) if !spec.title.is_empty() => &spec.title,
            _ => name,
        }
    }

    /// 标题 → 字段名（computed 字段不从表格读取）
    pub fn title_to_field(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .filter(|(_, spec)| !spec.is_computed() && !spec.title.is_empty())
            .map(|(name, spec)| (spec.title.as_str(), name.as_str()))
            .collect()
    }
}

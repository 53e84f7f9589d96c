// ==========================================
// 电商运营数据表 - 行与记录
// ==========================================
// EntityRow: 导入/校验边界上的通用行（字段名 → 单元格值 + 行号）
// Record: 仓储中保存的规范化文档
// ==========================================

use crate::domain::dates::{format_canonical, parse_date_value};
use crate::domain::types::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 行号字段名（序列化时使用）
pub const ROW_NUMBER_FIELD: &str = "_rowNumber";

// ==========================================
// EntityRow - 表格行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// 源表格中的行号（1 起，表头为第 1 行）
    #[serde(rename = "_rowNumber")]
    pub row_number: usize,
}

impl EntityRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            fields: Map::new(),
            row_number,
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// 所有单元格均为空
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| is_empty_value(Some(v)))
    }
}

// ==========================================
// Record - 仓储文档
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// 数值读取：非数值按 0 处理
    pub fn get_f64(&self, field: &str) -> f64 {
        coerce_f64(self.0.get(field))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<EntityRow> for Record {
    fn from(row: EntityRow) -> Self {
        Self(row.fields)
    }
}

// ==========================================
// 值工具函数
// ==========================================

/// 空值: 缺失 / null / 空字符串
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// 值的规范字符串形式（整数不带小数点）
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// 数值格式化: 整数值不带小数部分
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// 解析为有限数值（字符串会先 trim）
pub fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// 数值强制转换，无法解析时为 0
pub fn coerce_f64(value: Option<&Value>) -> f64 {
    value.and_then(value_to_f64).unwrap_or(0.0)
}

/// 数值转 JSON（整数值保持为整数）
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

/// 单值规范化；去空白后为空时返回 None
pub fn normalize_value(field_type: FieldType, value: &Value) -> Option<Value> {
    let converted = match field_type {
        FieldType::Number => value_to_f64(value).map(number_value),
        FieldType::Date => parse_date_value(value).map(|d| Value::String(format_canonical(d))),
        FieldType::String | FieldType::Computed => None,
    };
    if converted.is_some() {
        return converted;
    }

    match value {
        Value::Bool(_) => Some(value.clone()),
        _ => {
            let text = value_to_string(value).trim().to_string();
            (!text.is_empty()).then_some(Value::String(text))
        }
    }
}

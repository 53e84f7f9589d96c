// ==========================================
// 电商运营数据表 - 领域类型定义
// ==========================================
// 职责: 导入模式 / 字段类型等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 导入模式 (Import Mode)
// ==========================================
// append: 累加（销售数据）
// overwrite: 整体替换（主数据）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Append,
    Overwrite,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Append => "append",
            ImportMode::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(ImportMode::Append),
            "overwrite" => Ok(ImportMode::Overwrite),
            other => Err(format!("未知的导入模式: {}", other)),
        }
    }
}

// ==========================================
// 字段类型 (Field Type)
// ==========================================
// computed 字段由系统派生，不参与校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Date,
    Computed,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::Computed => write!(f, "computed"),
        }
    }
}

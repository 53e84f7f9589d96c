// ==========================================
// 电商运营数据表 - 校验引擎
// ==========================================
// 职责: 按字段规则集校验值 / 字段 / 实体 / 批次
// 输出: 按行号组织的结构化错误（数据错误从不以 Err 返回）
// 约束: 引擎在初始化后只读，可进程内共享
// ==========================================

mod report;
mod rules;
mod validator;


pub use report::format_batch_errors;
pub use rules::{BuiltinRule, CustomRule, RegexCache, RuleOutcome};
pub use validator::ValidationEngine;

use crate::domain::record::EntityRow;
use indexmap::IndexMap;
use serde::Serialize;

// ==========================================
// FieldValidation - 字段校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidation {
    pub valid: bool,

    /// 按规则声明顺序，已带【字段标题】前缀
    pub errors: Vec<String>,
}

// ==========================================
// EntityValidation - 单行校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityValidation {
    pub valid: bool,

    /// 字段名 → 错误列表
    pub errors: IndexMap<String, Vec<String>>,

    pub row_number: usize,
}

impl EntityValidation {
    pub fn messages(&self) -> impl Iterator<Item = &String> {
        self.errors.values().flatten()
    }
}

// ==========================================
// ItemValidation - 批次中的一项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemValidation {
    #[serde(flatten)]
    pub result: EntityValidation,

    /// 原始行数据
    pub data: EntityRow,

    /// 在输入批次中的位置
    pub index: usize,
}

impl ItemValidation {
    pub fn valid(&self) -> bool {
        self.result.valid
    }

    pub fn row_number(&self) -> usize {
        self.result.row_number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

// ==========================================
// BatchValidation - 批次校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchValidation {
    pub valid: bool,

    /// 与输入顺序一致
    pub items: Vec<ItemValidation>,

    pub summary: BatchSummary,
}

impl BatchValidation {
    pub fn invalid_items(&self) -> impl Iterator<Item = &ItemValidation> {
        self.items.iter().filter(|item| !item.valid())
    }
}

// ==========================================
// ValidationContext - 实体校验上下文
// ==========================================
/// `all_data` 用于唯一键检查；`position` 为当前实体在 `all_data` 中的位置
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    pub all_data: Option<&'a [EntityRow]>,
    pub position: Option<usize>,
}

impl<'a> ValidationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all_data(all_data: &'a [EntityRow]) -> Self {
        Self {
            all_data: Some(all_data),
            position: None,
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

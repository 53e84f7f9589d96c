// ==========================================
// 电商运营数据表 - 仓储查询条件
// ==========================================
// Filter: 字段等值条件（AND），按规范字符串比较
// Query:  Filter + `$lte` 范围条件（仅 daysSinceSale）
// ==========================================

use crate::domain::record::{value_to_f64, value_to_string, Record};
use crate::domain::sales::fields;
use crate::repository::error::{RepositoryError, RepositoryResult};
use indexmap::IndexMap;
use serde_json::Value;

/// 允许 `$lte` 的字段
pub const RANGE_QUERY_FIELDS: &[&str] = &[fields::DAYS_SINCE_SALE];

/// 索引键: 值的规范字符串
pub fn index_key(value: &Value) -> String {
    value_to_string(value)
}

// ==========================================
// Filter - 等值条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: IndexMap<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 全部条件成立；缺失字段按空串比较
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            let actual = record.get(field).map(index_key).unwrap_or_default();
            actual == index_key(expected)
        })
    }
}

// ==========================================
// Query - 等值 + 范围条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    lte: Vec<(String, f64)>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            lte: Vec::new(),
        }
    }

    /// `field <= bound`
    pub fn lte(mut self, field: impl Into<String>, bound: f64) -> Self {
        self.lte.push((field.into(), bound));
        self
    }

    pub fn ranges(&self) -> impl Iterator<Item = (&str, f64)> {
        self.lte.iter().map(|(f, b)| (f.as_str(), *b))
    }

    /// 检查范围字段是否受支持
    pub fn check(&self) -> RepositoryResult<()> {
        match self
            .lte
            .iter()
            .find(|(field, _)| !RANGE_QUERY_FIELDS.contains(&field.as_str()))
        {
            Some((field, _)) => Err(RepositoryError::UnsupportedRangeField {
                field: field.clone(),
                supported: RANGE_QUERY_FIELDS.join(", "),
            }),
            None => Ok(()),
        }
    }

    /// 等值条件与范围条件均成立；非数值字段不满足范围条件
    pub fn matches(&self, record: &Record) -> bool {
        self.filter.matches(record)
            && self.lte.iter().all(|(field, bound)| {
                record
                    .get(field)
                    .and_then(value_to_f64)
                    .is_some_and(|n| n <= *bound)
            })
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Self::new(filter)
    }
}

// ==========================================
// 电商运营数据表 - 工作表
// ==========================================
// 第一行为表头，其后每行一条记录
// 单元格统一为 serde_json::Value（字符串 / 数值 / 布尔 / null）
// ==========================================

use crate::domain::record::value_to_string;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,

    /// 表头所在的表格行号（1 起）
    pub header_row: usize,

    /// 含表头在内的全部行
    pub rows: Vec<Vec<Value>>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            header_row: 1,
            rows,
        }
    }

    /// 从文本行构造（测试与 CSV 共用）
    pub fn from_text_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| Value::String(cell.into())).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row.max(1);
        self
    }

    /// 去除首尾空白后的表头
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.iter().map(|cell| value_to_string(cell).trim().to_string()).collect())
            .unwrap_or_default()
    }

    /// 数据行及其表格行号
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[Value])> {
        let first_data_row = self.header_row + 1;
        self.rows
            .iter()
            .skip(1)
            .enumerate()
            .map(move |(i, row)| (first_data_row + i, row.as_slice()))
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 整行为空（空白字符串视为空）
pub fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|cell| value_to_string(cell).trim().is_empty())
}

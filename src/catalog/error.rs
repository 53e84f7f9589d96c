// ==========================================
// 电商运营数据表 - 实体目录错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 实体目录错误类型
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("目录 JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("实体名称为空")]
    EmptyEntityName,

    #[error("实体重复定义: {0}")]
    DuplicateEntity(String),

    #[error("实体 {entity} 的 {role} 引用了未定义字段: {field}")]
    UnknownField {
        entity: String,
        role: &'static str,
        field: String,
    },

    #[error("实体 {entity} 字段 {field} 的正则无效: {message}")]
    InvalidPattern {
        entity: String,
        field: String,
        message: String,
    },
}

/// Result 类型别名
pub type CatalogResult<T> = Result<T, CatalogError>;

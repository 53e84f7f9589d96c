// ==========================================
// 电商运营数据表 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 仅表示工程性失败（I/O、SQLite、锁、非法查询），数据问题不走 Err
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 查询错误 =====
    #[error("不支持的范围查询字段: {field}（仅支持 {supported}）")]
    UnsupportedRangeField { field: String, supported: String },

    // ===== 数据库错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("记录文档损坏 (entity={entity}): {message}")]
    CorruptDocument { entity: String, message: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::DatabaseQueryError(msg),
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ==========================================
// 电商运营数据表 - 配置模块错误类型
// ==========================================

use crate::catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("锁获取失败: {0}")]
    LockError(String),

    #[error("配置读写失败: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("配置快照格式错误: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("目录配置无效: {0}")]
    Catalog(#[from] CatalogError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

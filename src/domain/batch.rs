// ==========================================
// 电商运营数据表 - 导入批次
// ==========================================
// 每次工作表导入（无论成功或被拒）记录一条批次日志
// ==========================================

use crate::domain::types::ImportMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Imported, // 已写入仓储
    Rejected, // 校验失败，整表未写入
    Skipped,  // 无法识别或不可导入
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Imported => write!(f, "IMPORTED"),
            BatchStatus::Rejected => write!(f, "REJECTED"),
            BatchStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

impl BatchStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IMPORTED" => Some(BatchStatus::Imported),
            "REJECTED" => Some(BatchStatus::Rejected),
            "SKIPPED" => Some(BatchStatus::Skipped),
            _ => None,
        }
    }
}

// ==========================================
// ImportBatch - 导入批次记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,              // 批次 ID（UUID）
    pub sheet_name: String,            // 源工作表名
    pub entity: Option<String>,        // 识别出的实体
    pub import_mode: Option<ImportMode>,
    pub status: BatchStatus,
    pub total_rows: usize,             // 数据行数（不含空行）
    pub invalid_rows: usize,           // 校验失败行数
    pub written_rows: usize,           // 写入仓储的记录数
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

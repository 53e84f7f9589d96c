// ==========================================
// 电商运营数据表 - 本地销售缓存
// ==========================================
// 首次使用时通过仓储全量扫描加载；仅在显式刷新时失效
// ==========================================

use crate::domain::record::Record;
use crate::domain::sales::{fields, PRODUCT_SALES};
use crate::repository::{Repository, RepositoryError, RepositoryResult};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// 货号 → 规范日期 → 记录
type SalesIndex = HashMap<String, HashMap<String, Record>>;

#[derive(Debug, Default)]
pub(super) struct SalesCache {
    index: Mutex<Option<SalesIndex>>,
}

impl SalesCache {
    /// 在已加载（必要时先加载）的索引上执行读取
    pub(super) fn with_index<T>(
        &self,
        repository: &dyn Repository,
        read: impl FnOnce(&SalesIndex) -> T,
    ) -> RepositoryResult<T> {
        let mut guard = self
            .index
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let index = match guard.take() {
            Some(index) => index,
            None => {
                let records = repository.find_all(PRODUCT_SALES)?;
                debug!(records = records.len(), "销售缓存加载完成");
                build_index(records)
            }
        };
        let result = read(&index);
        *guard = Some(index);
        Ok(result)
    }

    pub(super) fn clear(&self) -> RepositoryResult<()> {
        let mut guard = self
            .index
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        *guard = None;
        Ok(())
    }

    pub(super) fn is_loaded(&self) -> bool {
        self.index.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

fn build_index(records: Vec<Record>) -> SalesIndex {
    let mut index = SalesIndex::new();
    for record in records {
        let (Some(item), Some(date)) = (
            record.get_str(fields::ITEM_NUMBER).map(str::to_string),
            record.get_str(fields::SALES_DATE).map(str::to_string),
        ) else {
            continue;
        };
        index.entry(item).or_default().insert(date, record);
    }
    index
}

// ==========================================
// 电商运营数据表 - 内存仓储
// ==========================================
// 存储: 实体 → 记录列表 + 身份映射 + 每个索引字段的哈希索引
// 查询: 选取命中数最少的索引作为候选集，再逐条核对全部条件
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::domain::batch::ImportBatch;
use crate::domain::record::Record;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::{index_key, Filter, Query};
use crate::repository::{layouts_from_catalog, EntityLayout, Repository};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

// ==========================================
// EntityStore - 单个实体的存储
// ==========================================
#[derive(Debug, Default)]
struct EntityStore {
    layout: EntityLayout,
    records: Vec<Record>,
    identities: HashMap<String, usize>,
    // 字段 → 键 → 记录位置
    indexes: HashMap<String, HashMap<String, Vec<usize>>>,
}

impl EntityStore {
    fn new(layout: EntityLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    fn add_to_indexes(&mut self, pos: usize) {
        let entries: Vec<(String, String)> = self
            .layout
            .index_entries(&self.records[pos])
            .into_iter()
            .map(|(field, key, _)| (field.to_string(), key))
            .collect();
        for (field, key) in entries {
            self.indexes
                .entry(field)
                .or_default()
                .entry(key)
                .or_default()
                .push(pos);
        }
    }

    fn remove_from_indexes(&mut self, pos: usize) {
        for (field, key, _) in self.layout.index_entries(&self.records[pos]) {
            if let Some(slots) = self.indexes.get_mut(field).and_then(|m| m.get_mut(&key)) {
                slots.retain(|p| *p != pos);
            }
        }
    }

    /// 写入一条记录；身份已存在时原位覆盖
    fn upsert(&mut self, record: Record) {
        let identity = self.layout.identity_key(&record);
        if let Some(&pos) = identity.as_ref().and_then(|key| self.identities.get(key)) {
            self.remove_from_indexes(pos);
            self.records[pos] = record;
            self.add_to_indexes(pos);
            return;
        }

        let pos = self.records.len();
        self.records.push(record);
        if let Some(key) = identity {
            self.identities.insert(key, pos);
        }
        self.add_to_indexes(pos);
    }

    fn clear(&mut self) {
        self.records.clear();
        self.identities.clear();
        self.indexes.clear();
    }

    /// 全量重建身份映射与索引
    fn rebuild(&mut self) {
        let records = std::mem::take(&mut self.records);
        self.clear();
        for record in records {
            self.upsert(record);
        }
    }

    /// 候选位置：取条件中命中最少的索引字段；无可用索引时返回 None（全表扫描）
    fn candidates(&self, filter: &Filter) -> Option<Vec<usize>> {
        filter
            .conditions()
            .filter(|(field, _)| self.layout.is_indexed(field))
            .map(|(field, value)| {
                self.indexes
                    .get(field)
                    .and_then(|m| m.get(&index_key(value)))
                    .cloned()
                    .unwrap_or_default()
            })
            .min_by_key(Vec::len)
    }

    fn select(&self, query: &Query) -> Vec<Record> {
        match self.candidates(&query.filter) {
            Some(positions) => positions
                .into_iter()
                .map(|pos| &self.records[pos])
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
            None => self
                .records
                .iter()
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
        }
    }
}

// ==========================================
// MemoryRepository - 内存仓储
// ==========================================
/// 进程内索引仓储；未登记布局的实体按无身份、无索引处理
#[derive(Debug, Default)]
pub struct MemoryRepository {
    layouts: HashMap<String, EntityLayout>,
    stores: RwLock<HashMap<String, EntityStore>>,
    batches: Mutex<Vec<ImportBatch>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按目录中每个实体的 identity / indexes 建立布局
    pub fn from_catalog(catalog: &SchemaCatalog) -> Self {
        Self {
            layouts: layouts_from_catalog(catalog),
            ..Self::default()
        }
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, HashMap<String, EntityStore>>> {
        self.stores
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, HashMap<String, EntityStore>>> {
        self.stores
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn batch_log(&self) -> RepositoryResult<MutexGuard<'_, Vec<ImportBatch>>> {
        self.batches
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn store_mut<'a>(
        &self,
        stores: &'a mut HashMap<String, EntityStore>,
        entity: &str,
    ) -> &'a mut EntityStore {
        stores.entry(entity.to_string()).or_insert_with(|| {
            EntityStore::new(self.layouts.get(entity).cloned().unwrap_or_default())
        })
    }
}

impl Repository for MemoryRepository {
    fn find_all(&self, entity: &str) -> RepositoryResult<Vec<Record>> {
        let stores = self.read()?;
        Ok(stores
            .get(entity)
            .map(|store| store.records.clone())
            .unwrap_or_default())
    }

    fn find(&self, entity: &str, filter: &Filter) -> RepositoryResult<Vec<Record>> {
        self.query(entity, &Query::new(filter.clone()))
    }

    fn query(&self, entity: &str, query: &Query) -> RepositoryResult<Vec<Record>> {
        query.check()?;
        let stores = self.read()?;
        Ok(stores
            .get(entity)
            .map(|store| store.select(query))
            .unwrap_or_default())
    }

    fn insert_many(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize> {
        let mut stores = self.write()?;
        let store = self.store_mut(&mut stores, entity);
        let count = records.len();
        for record in records {
            store.upsert(record);
        }
        debug!(entity = %entity, written = count, total = store.records.len(), "内存仓储追加写入");
        Ok(count)
    }

    fn replace_all(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize> {
        let mut stores = self.write()?;
        let store = self.store_mut(&mut stores, entity);
        store.clear();
        let count = records.len();
        for record in records {
            store.upsert(record);
        }
        debug!(entity = %entity, written = count, "内存仓储覆盖写入");
        Ok(count)
    }

    fn update_all(
        &self,
        entity: &str,
        update: &mut dyn FnMut(&mut Record),
    ) -> RepositoryResult<usize> {
        let mut stores = self.write()?;
        let Some(store) = stores.get_mut(entity) else {
            return Ok(0);
        };
        store.records.iter_mut().for_each(|record| update(record));
        store.rebuild();
        Ok(store.records.len())
    }

    fn count(&self, entity: &str) -> RepositoryResult<usize> {
        let stores = self.read()?;
        Ok(stores.get(entity).map_or(0, |store| store.records.len()))
    }

    fn record_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.batch_log()?.push(batch.clone());
        Ok(())
    }

    fn list_batches(&self) -> RepositoryResult<Vec<ImportBatch>> {
        Ok(self.batch_log()?.clone())
    }
}

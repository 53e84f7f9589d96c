// ==========================================
// 电商运营数据表 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 按实体保存规范化文档，提供等值/范围查询
// 约束: 身份字段相同的记录在追加时覆盖（upsert）
// 约束: 所有 SQL 使用参数化
// ==========================================

pub mod error;
pub mod memory_repo;
pub mod query;
pub mod sqlite_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use memory_repo::MemoryRepository;
pub use query::{Filter, Query, RANGE_QUERY_FIELDS};
pub use sqlite_repo::SqliteRepository;

use crate::catalog::SchemaCatalog;
use crate::domain::batch::ImportBatch;
use crate::domain::record::{is_empty_value, value_to_f64, Record};
use crate::domain::schema::EntitySchema;
use query::index_key;
use std::collections::HashMap;

// ==========================================
// Repository Trait
// ==========================================
// 实现者: MemoryRepository / SqliteRepository
// 结果顺序不作保证，调用方按需排序
pub trait Repository: Send + Sync {
    /// 全量读取（仅用于缓存刷新等路径）
    fn find_all(&self, entity: &str) -> RepositoryResult<Vec<Record>>;

    /// 等值条件（AND）查询，优先走索引
    fn find(&self, entity: &str, filter: &Filter) -> RepositoryResult<Vec<Record>>;

    /// 等值条件查询，返回任意一条
    fn find_one(&self, entity: &str, filter: &Filter) -> RepositoryResult<Option<Record>> {
        Ok(self.find(entity, filter)?.into_iter().next())
    }

    /// 等值 + `$lte` 范围查询
    fn query(&self, entity: &str, query: &Query) -> RepositoryResult<Vec<Record>>;

    /// 追加写入；身份相同的记录被覆盖
    ///
    /// # 返回
    /// - Ok(usize): 写入（新增或覆盖）的记录数
    fn insert_many(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize>;

    /// 覆盖写入：清空该实体后写入
    fn replace_all(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize>;

    /// 逐条修改该实体的全部记录（索引随之更新）
    fn update_all(
        &self,
        entity: &str,
        update: &mut dyn FnMut(&mut Record),
    ) -> RepositoryResult<usize>;

    fn count(&self, entity: &str) -> RepositoryResult<usize>;

    /// 写入导入批次日志
    fn record_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 导入批次日志（按导入时间升序）
    fn list_batches(&self) -> RepositoryResult<Vec<ImportBatch>>;
}

// ==========================================
// EntityLayout - 实体的身份与索引字段
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLayout {
    pub identity: Vec<String>,
    pub indexes: Vec<String>,
}

/// 单个索引项: (字段, 规范字符串键, 数值)
pub type IndexEntry<'a> = (&'a str, String, Option<f64>);

const IDENTITY_SEPARATOR: char = '\u{1f}';

impl EntityLayout {
    pub fn new<I, J, S, T>(identity: I, indexes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            identity: identity.into_iter().map(Into::into).collect(),
            indexes: indexes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_schema(schema: &EntitySchema) -> Self {
        Self {
            identity: schema.identity.clone(),
            indexes: schema.indexes.clone(),
        }
    }

    /// 记录身份键；未声明身份字段或任一身份字段为空时返回 None
    pub fn identity_key(&self, record: &Record) -> Option<String> {
        if self.identity.is_empty() {
            return None;
        }
        let mut parts = Vec::with_capacity(self.identity.len());
        for field in &self.identity {
            let value = record.get(field);
            if is_empty_value(value) {
                return None;
            }
            parts.push(value.map(index_key).unwrap_or_default());
        }
        Some(parts.join(&IDENTITY_SEPARATOR.to_string()))
    }

    /// 记录在各索引字段上的键（缺失字段不建索引）
    pub fn index_entries<'a>(&'a self, record: &Record) -> Vec<IndexEntry<'a>> {
        self.indexes
            .iter()
            .filter_map(|field| {
                let value = record.get(field)?;
                Some((field.as_str(), index_key(value), value_to_f64(value)))
            })
            .collect()
    }

    pub fn is_indexed(&self, field: &str) -> bool {
        self.indexes.iter().any(|f| f == field)
    }
}

/// 从目录构建 实体名 → 布局
pub fn layouts_from_catalog(catalog: &SchemaCatalog) -> HashMap<String, EntityLayout> {
    catalog
        .iter()
        .map(|schema| (schema.name.clone(), EntityLayout::from_schema(schema)))
        .collect()
}

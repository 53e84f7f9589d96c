// ==========================================
// 电商运营数据表 - SQLite 仓储
// ==========================================
// 存储: entity_record（JSON 文档 + 身份键）+ entity_index（字段索引）
// 查询: 索引字段条件下推为 SQL 子查询，其余条件在解码后核对
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::db::{configure_sqlite_connection, init_schema, open_in_memory, open_sqlite_connection};
use crate::domain::batch::{BatchStatus, ImportBatch};
use crate::domain::record::Record;
use crate::domain::types::ImportMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::{index_key, Filter, Query};
use crate::repository::{layouts_from_catalog, EntityLayout, Repository};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// SqliteRepository - SQLite 仓储
// ==========================================
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
    layouts: HashMap<String, EntityLayout>,
}

impl SqliteRepository {
    /// 打开（或创建）数据库文件
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - catalog: 提供各实体的身份字段与索引字段
    pub fn new(db_path: &str, catalog: &SchemaCatalog) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            layouts: layouts_from_catalog(catalog),
        })
    }

    /// 内存数据库
    pub fn in_memory(catalog: &SchemaCatalog) -> RepositoryResult<Self> {
        let conn = open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            layouts: layouts_from_catalog(catalog),
        })
    }

    /// 从已有连接创建（会再次应用 PRAGMA 并确保表结构，均幂等）
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        catalog: &SchemaCatalog,
    ) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self {
            conn,
            layouts: layouts_from_catalog(catalog),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn layout(&self, entity: &str) -> Option<&EntityLayout> {
        self.layouts.get(entity)
    }

    fn select(&self, entity: &str, query: &Query) -> RepositoryResult<Vec<Record>> {
        query.check()?;
        let layout = self.layout(entity);
        let indexed = |field: &str| layout.is_some_and(|l| l.is_indexed(field));

        let mut sql = String::from("SELECT doc FROM entity_record r WHERE r.entity = ?1");
        let mut values: Vec<SqlValue> = vec![SqlValue::from(entity.to_string())];
        let mut idx = 2;

        for (field, value) in query.filter.conditions().filter(|(f, _)| indexed(*f)) {
            sql.push_str(&format!(
                " AND r.record_id IN (SELECT record_id FROM entity_index \
                 WHERE entity = ?1 AND field = ?{} AND value_key = ?{})",
                idx,
                idx + 1
            ));
            values.push(SqlValue::from(field.to_string()));
            values.push(SqlValue::from(index_key(value)));
            idx += 2;
        }
        for (field, bound) in query.ranges().filter(|(f, _)| indexed(*f)) {
            sql.push_str(&format!(
                " AND r.record_id IN (SELECT record_id FROM entity_index \
                 WHERE entity = ?1 AND field = ?{} AND num_value <= ?{})",
                idx,
                idx + 1
            ));
            values.push(SqlValue::from(field.to_string()));
            values.push(SqlValue::from(bound));
            idx += 2;
        }
        sql.push_str(" ORDER BY r.record_id");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let record = decode_doc(entity, &doc)?;
            if query.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn write_records(&self, entity: &str, records: Vec<Record>, replace: bool) -> RepositoryResult<usize> {
        let layout = self.layout(entity);
        let now = Utc::now().to_rfc3339();

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        if replace {
            tx.execute("DELETE FROM entity_index WHERE entity = ?1", params![entity])?;
            tx.execute("DELETE FROM entity_record WHERE entity = ?1", params![entity])?;
        }

        let mut count = 0;
        for record in &records {
            upsert_record(&tx, entity, layout, record, &now)?;
            count += 1;
        }

        tx.commit()?;
        debug!(entity = %entity, written = count, replace, "SQLite 仓储写入完成");
        Ok(count)
    }
}

/// 写入一条记录；身份键已存在时覆盖文档并重建索引
fn upsert_record(
    conn: &Connection,
    entity: &str,
    layout: Option<&EntityLayout>,
    record: &Record,
    now: &str,
) -> RepositoryResult<()> {
    let doc = encode_doc(entity, record)?;
    let identity = layout.and_then(|l| l.identity_key(record));

    let existing: Option<i64> = match &identity {
        Some(key) => conn
            .query_row(
                "SELECT record_id FROM entity_record WHERE entity = ?1 AND identity_key = ?2",
                params![entity, key],
                |row| row.get(0),
            )
            .optional()?,
        None => None,
    };

    let record_id = match existing {
        Some(id) => {
            conn.execute(
                "UPDATE entity_record SET doc = ?1, updated_at = ?2 WHERE record_id = ?3",
                params![doc, now, id],
            )?;
            conn.execute("DELETE FROM entity_index WHERE record_id = ?1", params![id])?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO entity_record (entity, identity_key, doc, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![entity, identity, doc, now],
            )?;
            conn.last_insert_rowid()
        }
    };

    write_index_rows(conn, entity, layout, record_id, record)
}

fn write_index_rows(
    conn: &Connection,
    entity: &str,
    layout: Option<&EntityLayout>,
    record_id: i64,
    record: &Record,
) -> RepositoryResult<()> {
    let Some(layout) = layout else {
        return Ok(());
    };
    for (field, key, num) in layout.index_entries(record) {
        conn.execute(
            "INSERT INTO entity_index (record_id, entity, field, value_key, num_value) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![record_id, entity, field, key, num],
        )?;
    }
    Ok(())
}

fn encode_doc(entity: &str, record: &Record) -> RepositoryResult<String> {
    serde_json::to_string(record).map_err(|e| RepositoryError::CorruptDocument {
        entity: entity.to_string(),
        message: e.to_string(),
    })
}

fn decode_doc(entity: &str, doc: &str) -> RepositoryResult<Record> {
    serde_json::from_str(doc).map_err(|e| RepositoryError::CorruptDocument {
        entity: entity.to_string(),
        message: e.to_string(),
    })
}

fn corrupt_batch(message: String) -> RepositoryError {
    RepositoryError::CorruptDocument {
        entity: "import_batch".to_string(),
        message,
    }
}

type BatchRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    i64,
    i64,
    i64,
    String,
    i64,
);

fn batch_from_row(row: BatchRow) -> RepositoryResult<ImportBatch> {
    let (batch_id, sheet_name, entity, mode, status, total, invalid, written, at, elapsed) = row;

    let status = BatchStatus::parse(&status)
        .ok_or_else(|| corrupt_batch(format!("未知批次状态: {}", status)))?;
    let import_mode = match mode {
        Some(m) => Some(m.parse::<ImportMode>().map_err(corrupt_batch)?),
        None => None,
    };
    let imported_at = DateTime::parse_from_rfc3339(&at)
        .map_err(|e| corrupt_batch(e.to_string()))?
        .with_timezone(&Utc);

    Ok(ImportBatch {
        batch_id,
        sheet_name,
        entity,
        import_mode,
        status,
        total_rows: total as usize,
        invalid_rows: invalid as usize,
        written_rows: written as usize,
        imported_at,
        elapsed_ms: elapsed as u64,
    })
}

impl Repository for SqliteRepository {
    fn find_all(&self, entity: &str) -> RepositoryResult<Vec<Record>> {
        self.select(entity, &Query::default())
    }

    fn find(&self, entity: &str, filter: &Filter) -> RepositoryResult<Vec<Record>> {
        self.select(entity, &Query::new(filter.clone()))
    }

    fn query(&self, entity: &str, query: &Query) -> RepositoryResult<Vec<Record>> {
        self.select(entity, query)
    }

    fn insert_many(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize> {
        self.write_records(entity, records, false)
    }

    fn replace_all(&self, entity: &str, records: Vec<Record>) -> RepositoryResult<usize> {
        self.write_records(entity, records, true)
    }

    fn update_all(
        &self,
        entity: &str,
        update: &mut dyn FnMut(&mut Record),
    ) -> RepositoryResult<usize> {
        let layout = self.layout(entity);
        let now = Utc::now().to_rfc3339();

        let conn = self.get_conn()?;
        let rows: Vec<(i64, String)> = {
            let mut stmt = conn.prepare(
                "SELECT record_id, doc FROM entity_record WHERE entity = ?1 ORDER BY record_id",
            )?;
            let rows = stmt
                .query_map(params![entity], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let tx = conn.unchecked_transaction()?;
        for (record_id, doc) in &rows {
            let mut record = decode_doc(entity, doc)?;
            update(&mut record);

            let identity = layout.and_then(|l| l.identity_key(&record));
            tx.execute(
                "UPDATE entity_record SET doc = ?1, identity_key = ?2, updated_at = ?3 WHERE record_id = ?4",
                params![encode_doc(entity, &record)?, identity, now, record_id],
            )?;
            tx.execute("DELETE FROM entity_index WHERE record_id = ?1", params![record_id])?;
            write_index_rows(&tx, entity, layout, *record_id, &record)?;
        }
        tx.commit()?;

        Ok(rows.len())
    }

    fn count(&self, entity: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entity_record WHERE entity = ?1",
            params![entity],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn record_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, sheet_name, entity, import_mode, status,
                total_rows, invalid_rows, written_rows, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.sheet_name,
                batch.entity,
                batch.import_mode.map(|m| m.as_str()),
                batch.status.to_string(),
                batch.total_rows as i64,
                batch.invalid_rows as i64,
                batch.written_rows as i64,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms as i64,
            ],
        )?;
        Ok(())
    }

    fn list_batches(&self) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, sheet_name, entity, import_mode, status,
                   total_rows, invalid_rows, written_rows, imported_at, elapsed_ms
            FROM import_batch
            ORDER BY imported_at, rowid
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            })?
            .collect::<Result<Vec<BatchRow>, _>>()?;

        rows.into_iter().map(batch_from_row)
            .collect()
    }
}

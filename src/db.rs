// ==========================================
// 电商运营数据表 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE ... IF NOT EXISTS），首次建库写入 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SALES_SHEET_OPS_DB_PATH";

const DB_DIR_NAME: &str = "sales-sheet-ops";
const DB_FILE_NAME: &str = "sales_sheet_ops.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entity_record (
    record_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    entity        TEXT NOT NULL,
    identity_key  TEXT,
    doc           TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_entity_record_identity
    ON entity_record(entity, identity_key) WHERE identity_key IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_entity_record_entity ON entity_record(entity);

CREATE TABLE IF NOT EXISTS entity_index (
    record_id  INTEGER NOT NULL REFERENCES entity_record(record_id) ON DELETE CASCADE,
    entity     TEXT NOT NULL,
    field      TEXT NOT NULL,
    value_key  TEXT NOT NULL,
    num_value  REAL,
    PRIMARY KEY (record_id, field)
);
CREATE INDEX IF NOT EXISTS idx_entity_index_key ON entity_index(entity, field, value_key);
CREATE INDEX IF NOT EXISTS idx_entity_index_num ON entity_index(entity, field, num_value);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id      TEXT PRIMARY KEY,
    sheet_name    TEXT NOT NULL,
    entity        TEXT,
    import_mode   TEXT,
    status        TEXT NOT NULL,
    total_rows    INTEGER NOT NULL,
    invalid_rows  INTEGER NOT NULL,
    written_rows  INTEGER NOT NULL,
    imported_at   TEXT NOT NULL,
    elapsed_ms    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启（entity_index 依赖级联删除）
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接、应用统一配置并确保表结构存在
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 内存数据库（测试用）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 SALES_SHEET_OPS_DB_PATH → 用户数据目录 → 当前目录
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    match dirs::data_dir() {
        Some(dir) => dir.join(DB_DIR_NAME).join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

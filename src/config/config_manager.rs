// ==========================================
// 电商运营数据表 - 配置管理器
// ==========================================
// 职责: 配置读取（带默认值）、写入、快照导出/恢复、实体目录加载
// 存储: config_kv 表 (scope_id='global')
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 实体目录（JSON，缺省使用内置目录）
    pub const CATALOG_SCHEMA_JSON: &str = "catalog.schema_json";

    // 统计
    pub const STATS_RECENT_DAYS: &str = "stats.recent_days";

    // 导入
    pub const IMPORT_SKIP_BLANK_ROWS: &str = "import.skip_blank_rows";
}

pub const DEFAULT_RECENT_DAYS: usize = 7;
pub const DEFAULT_SKIP_BLANK_ROWS: bool = true;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 打开数据库文件（首次打开时建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（再次应用 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn.lock().map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 解析配置值；缺失或格式错误时使用默认值
    fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> ConfigResult<T> {
        let Some(raw) = self.get_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    // ===== 统计配置 =====

    /// 近期销量汇总的默认天数
    pub fn get_recent_days(&self) -> ConfigResult<usize> {
        let days = self.get_parsed_or(config_keys::STATS_RECENT_DAYS, DEFAULT_RECENT_DAYS)?;
        if days == 0 {
            warn!(config_key = config_keys::STATS_RECENT_DAYS, "近期天数不能为 0，使用默认值");
            return Ok(DEFAULT_RECENT_DAYS);
        }
        Ok(days)
    }

    // ===== 导入配置 =====

    pub fn get_skip_blank_rows(&self) -> ConfigResult<bool> {
        self.get_parsed_or(config_keys::IMPORT_SKIP_BLANK_ROWS, DEFAULT_SKIP_BLANK_ROWS)
    }

    // ===== 实体目录 =====

    /// 加载实体目录：配置了 JSON 时使用配置，否则使用内置目录
    ///
    /// JSON 格式错误时返回 Err，不回退到内置目录
    pub fn load_catalog(&self) -> ConfigResult<SchemaCatalog> {
        match self.get_value(config_keys::CATALOG_SCHEMA_JSON)? {
            Some(json) if !json.trim().is_empty() => {
                let catalog = SchemaCatalog::from_json(&json)?;
                info!(entities = catalog.len(), "已加载配置的实体目录");
                Ok(catalog)
            }
            _ => Ok(SchemaCatalog::builtin()),
        }
    }

    // ===== 快照 =====

    /// 导出全部 global 配置（JSON 对象，按键排序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从快照恢复配置（覆盖同名键）
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }
        tx.commit()?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        let conn = open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_absent() {
        let config = manager();
        assert_eq!(config.get_value("missing").unwrap(), None);
        assert_eq!(config.get_recent_days().unwrap(), 7);
        assert!(config.get_skip_blank_rows().unwrap());
        assert_eq!(config.load_catalog().unwrap().len(), 4);
    }

    #[test]
    fn test_set_value_upserts() {
        let config = manager();
        config.set_value(config_keys::STATS_RECENT_DAYS, "14").unwrap();
        config.set_value(config_keys::STATS_RECENT_DAYS, "30").unwrap();

        assert_eq!(config.get_recent_days().unwrap(), 30);
        assert!(config.remove_value(config_keys::STATS_RECENT_DAYS).unwrap());
        assert_eq!(config.get_recent_days().unwrap(), 7);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = manager();
        config.set_value(config_keys::STATS_RECENT_DAYS, "abc").unwrap();
        config.set_value(config_keys::IMPORT_SKIP_BLANK_ROWS, "false").unwrap();

        assert_eq!(config.get_recent_days().unwrap(), 7);
        assert!(!config.get_skip_blank_rows().unwrap());

        config.set_value(config_keys::STATS_RECENT_DAYS, "0").unwrap();
        assert_eq!(config.get_recent_days().unwrap(), 7);
    }

    #[test]
    fn test_load_catalog_from_json() {
        let config = manager();
        let json = r#"[{
            "name": "Supplier",
            "fields": {
                "supplierCode": { "title": "供应商编码", "validators": [{ "type": "required" }] }
            },
            "requiredTitles": ["供应商编码"],
            "importMode": "overwrite"
        }]"#;
        config.set_value(config_keys::CATALOG_SCHEMA_JSON, json).unwrap();

        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Supplier").is_some());

        config.set_value(config_keys::CATALOG_SCHEMA_JSON, "{ broken").unwrap();
        assert!(matches!(config.load_catalog(), Err(ConfigError::Catalog(_))));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let source = manager();
        source.set_value(config_keys::STATS_RECENT_DAYS, "10").unwrap();
        source.set_value(config_keys::IMPORT_SKIP_BLANK_ROWS, "false").unwrap();
        let snapshot = source.get_config_snapshot().unwrap();

        let target = manager();
        assert_eq!(target.restore_config_from_snapshot(&snapshot).unwrap(), 2);
        assert_eq!(target.get_recent_days().unwrap(), 10);
        assert!(!target.get_skip_blank_rows().unwrap());
    }
}

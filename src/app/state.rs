// ==========================================
// 电商运营数据表 - 应用状态
// ==========================================
// 职责: 按配置组装目录 / 仓储 / 校验引擎 / 导入流程 / 销量统计
// 共享: SQLite 连接由仓储与配置管理器共用
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::config::ConfigManager;
use crate::db::{default_db_path, open_sqlite_connection};
use crate::engine::{SalesStatisticsService, ValidationEngine};
use crate::importer::SheetImporter;
use crate::repository::{Repository, SqliteRepository};
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub config: ConfigManager,

    pub catalog: Arc<SchemaCatalog>,

    pub engine: Arc<ValidationEngine>,

    pub repository: Arc<dyn Repository>,
}

impl AppState {
    /// 打开数据库并按配置初始化各组件
    pub fn new(db_path: impl Into<String>) -> anyhow::Result<Self> {
        let db_path = db_path.into();
        info!(db_path = %db_path, "初始化应用状态");

        if let Some(parent) = Path::new(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("无法创建数据目录: {}", parent.display()))?;
            }
        }

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = ConfigManager::from_connection(conn.clone())?;
        let catalog = Arc::new(config.load_catalog()?);
        let repository: Arc<dyn Repository> =
            Arc::new(SqliteRepository::from_connection(conn, &catalog)?);

        info!(entities = catalog.len(), "应用状态初始化完成");
        Ok(Self {
            db_path,
            config,
            catalog,
            engine: Arc::new(ValidationEngine::new()),
            repository,
        })
    }

    /// 使用默认数据库路径
    pub fn open_default() -> anyhow::Result<Self> {
        Self::new(default_db_path().to_string_lossy().to_string())
    }

    /// 按当前配置构造导入流程
    pub fn importer(&self) -> anyhow::Result<SheetImporter> {
        let skip_blank_rows = self.config.get_skip_blank_rows()?;
        Ok(SheetImporter::new(
            self.catalog.clone(),
            self.engine.clone(),
            self.repository.clone(),
        )
        .skip_blank_rows(skip_blank_rows))
    }

    pub fn sales_statistics(&self) -> SalesStatisticsService {
        SalesStatisticsService::new(self.repository.clone())
    }
}

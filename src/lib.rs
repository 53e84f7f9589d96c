// ==========================================
// 电商运营数据表 - 核心库
// ==========================================
// 职责: 表格识别 → 数据校验 → 导入仓储 → 销量统计
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体 Schema 与记录
pub mod domain;

// 实体目录
pub mod catalog;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 识别 / 校验 / 统计
pub mod engine;

// 导入层 - 外部表格
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 组件组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    EntityRow, EntitySchema, FieldSpec, FieldType, ImportBatch, ImportMode, Record, SalesRecord,
    ValidatorConfig, ValidatorParams, PRODUCT_SALES,
};

// 目录
pub use catalog::SchemaCatalog;

// 引擎
pub use engine::{
    BatchValidation, DailySales, EntityIdentifier, SalesStatisticsService, ValidationEngine,
};

// 仓储
pub use repository::{Filter, MemoryRepository, Query, Repository, SqliteRepository};

// 导入
pub use importer::{ImportReport, SheetImporter, Worksheet};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "电商运营数据表";

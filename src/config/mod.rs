// ==========================================
// 电商运营数据表 - 配置层
// ==========================================
// 职责: 运行参数与实体目录配置
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_RECENT_DAYS, DEFAULT_SKIP_BLANK_ROWS};
pub use error::{ConfigError, ConfigResult};

// ==========================================
// 电商运营数据表 - 应用层
// ==========================================
// 职责: 组件组装，供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;

// ==========================================
// 电商运营数据表 - 引擎层
// ==========================================
// 职责: 实体识别 → 数据校验 → 销量统计
// 红线: Engine 不拼 SQL，数据访问一律经 Repository
// 约束: 识别器与校验引擎初始化后只读，可进程内共享
// ==========================================

pub mod identifier;
pub mod sales_stats;
pub mod validation;

// 重导出核心引擎
pub use identifier::EntityIdentifier;
pub use sales_stats::{DailySales, MonthDays, SalesStatisticsService, YearRange};
pub use validation::{
    BatchSummary, BatchValidation, EntityValidation, FieldValidation, ItemValidation,
    RuleOutcome, ValidationContext, ValidationEngine,
};

// ==========================================
// 电商运营数据表 - 领域模型层
// ==========================================
// 职责: 定义实体 Schema、通用行、仓储文档、销售记录
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod dates;
pub mod record;
pub mod sales;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use batch::ImportBatch;
pub use record::{EntityRow, Record};
pub use sales::{SalesRecord, PRODUCT_SALES};
pub use schema::{EntitySchema, FieldSpec, ValidatorConfig, ValidatorParams};
pub use types::{FieldType, ImportMode};

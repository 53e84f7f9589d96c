// ==========================================
// 电商运营数据表 - 导入层
// ==========================================
// 职责: 外部表格 → 识别 → 校验 → 规范化 → 派生 → 仓储
// 支持: Excel (.xlsx/.xls/.ods，全部工作表), CSV
// ==========================================

pub mod derivation;
pub mod error;
pub mod file_parser;
pub mod normalizer;
pub mod row_mapper;
pub mod sheet;
pub mod sheet_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvSheetReader, ExcelSheetReader, SheetReader, UniversalSheetReader};
pub use row_mapper::RowMapper;
pub use sheet::Worksheet;
pub use sheet_importer::{ImportReport, SheetImporter};

// ==========================================
// 电商运营数据表 - 工作表导入流程
// ==========================================
// 流程: 识别实体 → 可导入检查 → 行映射 → 批次校验（含唯一键）
//      → 任一行失败则整表拒绝 → 规范化 → 派生 → 覆盖/追加写入
//      → 记录导入批次
// 约定: 同一实体的两次导入不交错执行
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::domain::batch::{BatchStatus, ImportBatch};
use crate::domain::record::Record;
use crate::domain::schema::EntitySchema;
use crate::domain::types::ImportMode;
use crate::domain::PRODUCT_SALES;
use crate::engine::{EntityIdentifier, ValidationEngine};
use crate::importer::derivation::{derive_records, rebase_days_since_sale};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{SheetReader, UniversalSheetReader};
use crate::importer::normalizer::normalize_row;
use crate::importer::row_mapper::RowMapper;
use crate::importer::sheet::Worksheet;
use crate::repository::Repository;
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportReport - 单张工作表的导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub batch: ImportBatch,

    /// 校验失败时的错误报告（format_errors 输出）
    pub error_report: Option<String>,
}

impl ImportReport {
    pub fn is_imported(&self) -> bool {
        self.batch.status == BatchStatus::Imported
    }

    pub fn is_rejected(&self) -> bool {
        self.batch.status == BatchStatus::Rejected
    }
}

// ==========================================
// SheetImporter - 导入流程编排
// ==========================================
pub struct SheetImporter {
    catalog: Arc<SchemaCatalog>,
    identifier: EntityIdentifier,
    engine: Arc<ValidationEngine>,
    repository: Arc<dyn Repository>,
    skip_blank_rows: bool,
    today: NaiveDate,
}

impl SheetImporter {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        engine: Arc<ValidationEngine>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        Self {
            identifier: EntityIdentifier::new(catalog.clone()),
            catalog,
            engine,
            repository,
            skip_blank_rows: true,
            today: Local::now().date_naive(),
        }
    }

    pub fn skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }

    /// 指定派生 daysSinceSale 时使用的“今天”
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn identifier(&self) -> &EntityIdentifier {
        &self.identifier
    }

    /// 导入文件中的全部工作表（按表顺序）
    #[instrument(skip(self, path), fields(file = %path.as_ref().display()))]
    pub fn import_file(&self, path: impl AsRef<Path>) -> ImportResult<Vec<ImportReport>> {
        let sheets = UniversalSheetReader.read_sheets(path.as_ref())?;
        sheets.iter().map(|sheet| self.import_sheet(sheet)).collect()
    }

    /// 导入单张工作表
    ///
    /// # 返回
    /// - Ok(ImportReport): 已导入 / 被拒绝（附错误报告）/ 已跳过
    /// - Err: 仓储写入失败等工程错误
    #[instrument(skip(self, sheet), fields(sheet = %sheet.name))]
    pub fn import_sheet(&self, sheet: &Worksheet) -> ImportResult<ImportReport> {
        let started = Instant::now();
        let headers = sheet.headers();

        // 1. 识别实体
        let Some(entity) = self.identifier.identify(&headers) else {
            warn!(sheet = %sheet.name, headers = ?headers, "无法识别工作表对应的实体，跳过");
            return self.finish(sheet, None, BatchStatus::Skipped, Counts::default(), None, started);
        };
        let schema = self
            .catalog
            .get(entity)
            .ok_or_else(|| ImportError::UnknownEntity(entity.to_string()))?;

        // 2. 可导入检查
        if !self.identifier.can_import(entity) {
            warn!(entity = %entity, "实体不可导入，跳过");
            return self.finish(sheet, Some(schema), BatchStatus::Skipped, Counts::default(), None, started);
        }

        // 3. 行映射
        let rows = RowMapper::new(schema)
            .skip_blank_rows(self.skip_blank_rows)
            .map_sheet(sheet);
        if rows.is_empty() {
            warn!(entity = %entity, "工作表没有数据行，跳过");
            return self.finish(sheet, Some(schema), BatchStatus::Skipped, Counts::default(), None, started);
        }

        // 4. 批次校验
        let validation = self.engine.validate_all(&rows, schema);
        if !validation.valid {
            let report = self.engine.format_errors(&validation, schema.label());
            warn!(
                entity = %entity,
                total = validation.summary.total,
                invalid = validation.summary.invalid,
                "数据校验失败，整表拒绝导入"
            );
            let counts = Counts {
                total: validation.summary.total,
                invalid: validation.summary.invalid,
                written: 0,
            };
            return self.finish(sheet, Some(schema), BatchStatus::Rejected, counts, report, started);
        }

        // 5. 规范化 + 派生
        let total = rows.len();
        let normalized = rows.into_iter().map(|row| normalize_row(schema, row)).collect();
        let records = derive_records(&schema.name, normalized, self.today);

        // 6. 写入仓储
        let written = match schema.import_mode {
            ImportMode::Overwrite => self.repository.replace_all(&schema.name, records)?,
            ImportMode::Append => self.repository.insert_many(&schema.name, records)?,
        };
        info!(
            entity = %entity,
            mode = %schema.import_mode,
            total = total,
            written = written,
            "工作表导入完成"
        );

        let counts = Counts {
            total,
            invalid: 0,
            written,
        };
        self.finish(sheet, Some(schema), BatchStatus::Imported, counts, None, started)
    }

    /// 以新的“今天”重算全部销售记录的 daysSinceSale
    #[instrument(skip(self))]
    pub fn rebase_sales_days(&self, today: NaiveDate) -> ImportResult<usize> {
        let mut skipped = 0usize;
        let updated = self.repository.update_all(PRODUCT_SALES, &mut |record: &mut Record| {
            if !rebase_days_since_sale(record, today) {
                skipped += 1;
            }
        })?;
        if skipped > 0 {
            warn!(skipped = skipped, "部分销售记录缺少有效销售日期");
        }
        info!(updated = updated, today = %today, "销售距今天数已重算");
        Ok(updated.saturating_sub(skipped))
    }

    fn finish(
        &self,
        sheet: &Worksheet,
        schema: Option<&EntitySchema>,
        status: BatchStatus,
        counts: Counts,
        error_report: Option<String>,
        started: Instant,
    ) -> ImportResult<ImportReport> {
        let batch = ImportBatch {
            batch_id: Uuid::new_v4().to_string(),
            sheet_name: sheet.name.clone(),
            entity: schema.map(|s| s.name.clone()),
            import_mode: schema.map(|s| s.import_mode),
            status,
            total_rows: counts.total,
            invalid_rows: counts.invalid,
            written_rows: counts.written,
            imported_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.repository.record_batch(&batch)?;

        Ok(ImportReport {
            batch,
            error_report,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    total: usize,
    invalid: usize,
    written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Filter, MemoryRepository};
    use serde_json::json;

    fn setup() -> (Arc<MemoryRepository>, SheetImporter) {
        let catalog = Arc::new(SchemaCatalog::builtin());
        let repo = Arc::new(MemoryRepository::from_catalog(&catalog));
        let importer = SheetImporter::new(catalog, Arc::new(ValidationEngine::new()), repo.clone())
            .with_today(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        (repo, importer)
    }

    #[test]
    fn test_import_sales_sheet() {
        let (repo, importer) = setup();
        let sheet = Worksheet::from_text_rows(
            "三月销售",
            vec![
                vec!["货号", "销售日期", "销量"],
                vec!["SKU1", "'2024-03-15", "5"],
                vec!["SKU1", "2024-03-16", "3"],
            ],
        );

        let report = importer.import_sheet(&sheet).unwrap();

        assert!(report.is_imported());
        assert_eq!(report.batch.entity.as_deref(), Some(PRODUCT_SALES));
        assert_eq!(report.batch.written_rows, 2);
        let stored = repo
            .find(PRODUCT_SALES, &Filter::new().eq("salesDate", "2024-03-15"))
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].get_f64("daysSinceSale"), 5.0);
        assert_eq!(repo.list_batches().unwrap().len(), 1);
    }

    #[test]
    fn test_reject_sheet_writes_nothing() {
        let (repo, importer) = setup();
        let sheet = Worksheet::from_text_rows(
            "销售",
            vec![
                vec!["货号", "销售日期", "销量"],
                vec!["SKU1", "2024-03-15", "5"],
                vec!["SKU2", "2024-03-16", "-1"],
            ],
        );

        let report = importer.import_sheet(&sheet).unwrap();

        assert!(report.is_rejected());
        assert_eq!(report.batch.invalid_rows, 1);
        assert_eq!(
            report.error_report.as_deref(),
            Some("【销售数据】数据验证失败：\n\n第3行：\n  【销量】不能为负数\n")
        );
        assert_eq!(repo.count(PRODUCT_SALES).unwrap(), 0);
    }

    #[test]
    fn test_numeric_and_text_keys_collide() {
        let (repo, importer) = setup();
        let sheet = Worksheet::new(
            "商品",
            vec![
                vec![json!("货号"), json!("商品名称"), json!("成本价")],
                vec![json!(1001), json!("衬衫"), json!(10)],
                vec![json!("1001"), json!("裤子"), json!(12)],
            ],
        );

        let report = importer.import_sheet(&sheet).unwrap();

        assert!(report.is_rejected());
        assert_eq!(report.batch.invalid_rows, 2);
        assert!(report
            .error_report
            .as_deref()
            .unwrap()
            .contains("第3行：\n  【货号】值\"1001\"已存在\n"));
        assert_eq!(repo.count("RegularProduct").unwrap(), 0);
    }

    #[test]
    fn test_unrecognized_sheet_is_skipped() {
        let (repo, importer) = setup();
        let sheet = Worksheet::from_text_rows("杂项", vec![vec!["名称", "备注"], vec!["a", "b"]]);

        let report = importer.import_sheet(&sheet).unwrap();

        assert_eq!(report.batch.status, BatchStatus::Skipped);
        assert!(report.batch.entity.is_none());
        assert_eq!(repo.list_batches().unwrap()[0].status, BatchStatus::Skipped);
    }

    #[test]
    fn test_rebase_sales_days() {
        let (repo, importer) = setup();
        let sheet = Worksheet::from_text_rows(
            "销售",
            vec![vec!["货号", "销售日期", "销量"], vec!["SKU1", "2024-03-15", "5"]],
        );
        importer.import_sheet(&sheet).unwrap();

        let updated = importer
            .rebase_sales_days(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap())
            .unwrap();

        assert_eq!(updated, 1);
        let stored = repo.find_all(PRODUCT_SALES).unwrap();
        assert_eq!(stored[0].get_f64("daysSinceSale"), 10.0);
    }
}

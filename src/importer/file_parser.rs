// ==========================================
// 电商运营数据表 - 工作表读取器
// ==========================================
// 支持: CSV (.csv，一个文件一张表) / Excel (.xlsx/.xls/.ods，全部工作表)
// 约定: 单元格不在此处清洗，保留原值交给行映射与规范化
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet::Worksheet;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use serde_json::{Number, Value};
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ==========================================
// SheetReader Trait
// ==========================================
// 实现者: CsvSheetReader / ExcelSheetReader
pub trait SheetReader {
    /// 读取文件中的全部工作表
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<Worksheet>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV 读取器
// ==========================================
pub struct CsvSheetReader;

impl SheetReader for CsvSheetReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<Worksheet>> {
        ensure_exists(path)?;
        let ext = extension(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(
                record
                    .iter()
                    .map(|cell| Value::String(cell.trim_start_matches('\u{feff}').to_string()))
                    .collect(),
            );
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!(file = %path.display(), rows = rows.len(), "CSV 读取完成");
        Ok(vec![Worksheet::new(name, rows)])
    }
}

// ==========================================
// Excel 读取器
// ==========================================
pub struct ExcelSheetReader;

impl SheetReader for ExcelSheetReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<Worksheet>> {
        ensure_exists(path)?;
        let ext = extension(path);
        if !matches!(ext.as_str(), "xlsx" | "xls" | "xlsm" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;
            // 区域从第一个非空单元格开始
            let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);
            let rows: Vec<Vec<Value>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_value).collect())
                .collect();
            debug!(sheet = %sheet_name, rows = rows.len(), "工作表读取完成");
            sheets.push(Worksheet::new(sheet_name, rows).with_header_row(header_row));
        }
        Ok(sheets)
    }
}

/// Excel 单元格 → JSON 值（日期保留为序列号，由规范化阶段转换）
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Number::from_f64(dt.as_f64()).map_or(Value::Null, Value::Number),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetReader;

impl SheetReader for UniversalSheetReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<Worksheet>> {
        match extension(path).as_str() {
            "csv" => CsvSheetReader.read_sheets(path),
            "xlsx" | "xls" | "xlsm" | "ods" => ExcelSheetReader.read_sheets(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ==========================================
// 电商运营数据表 - 行映射器
// ==========================================
// 职责: 表头标题 → 字段名（反转 Schema 的 title→field 映射）
// 输出: EntityRow（仅含映射到的字段，附带表格行号）
// 约定: 表头去除首尾空白后匹配；同名标题取第一列
// ==========================================

use crate::domain::record::EntityRow;
use crate::domain::schema::EntitySchema;
use crate::importer::sheet::{is_blank_row, Worksheet};
use serde_json::Value;

pub struct RowMapper<'a> {
    schema: &'a EntitySchema,
    skip_blank_rows: bool,
}

impl<'a> RowMapper<'a> {
    pub fn new(schema: &'a EntitySchema) -> Self {
        Self {
            schema,
            skip_blank_rows: true,
        }
    }

    pub fn skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }

    /// 列位置 → 字段名
    pub fn column_fields(&self, headers: &[String]) -> Vec<(usize, String)> {
        let title_to_field = self.schema.title_to_field();
        let mut columns: Vec<(usize, String)> = Vec::new();

        for (col, header) in headers.iter().enumerate() {
            let Some(field) = title_to_field.get(header.trim()) else {
                continue;
            };
            if columns.iter().any(|(_, f)| f.as_str() == *field) {
                continue;
            }
            columns.push((col, (*field).to_string()));
        }
        columns
    }

    /// 工作表 → 实体行
    pub fn map_sheet(&self, sheet: &Worksheet) -> Vec<EntityRow> {
        let columns = self.column_fields(&sheet.headers());

        sheet
            .data_rows()
            .filter(|(_, cells)| !(self.skip_blank_rows && is_blank_row(cells)))
            .map(|(row_number, cells)| {
                let mut row = EntityRow::new(row_number);
                for (col, field) in &columns {
                    let value = cells.get(*col).cloned().unwrap_or(Value::Null);
                    row.set(field.clone(), value);
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::domain::PRODUCT_SALES;
    use serde_json::json;

    fn sales_sheet() -> Worksheet {
        Worksheet::from_text_rows(
            "销售",
            vec![
                vec!["货号", " 销售日期 ", "销量", "备注", "销量"],
                vec!["SKU1", "2024-03-15", "5", "x", "99"],
                vec!["", "", "", "", ""],
                vec!["SKU2", "2024-03-16", "3", "", ""],
            ],
        )
    }

    #[test]
    fn test_map_sheet_inverts_titles() {
        let catalog = SchemaCatalog::builtin();
        let schema = catalog.get(PRODUCT_SALES).unwrap();
        let rows = RowMapper::new(schema).map_sheet(&sales_sheet());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get("itemNumber"), Some(&json!("SKU1")));
        assert_eq!(rows[0].get("salesDate"), Some(&json!("2024-03-15")));
        // 同名标题取第一列
        assert_eq!(rows[0].get("salesQuantity"), Some(&json!("5")));
        // 未映射的列不进入行数据
        assert_eq!(rows[0].fields.len(), 3);
        // 空行被跳过，行号保持原表位置
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_keep_blank_rows_when_disabled() {
        let catalog = SchemaCatalog::builtin();
        let schema = catalog.get(PRODUCT_SALES).unwrap();
        let rows = RowMapper::new(schema).skip_blank_rows(false).map_sheet(&sales_sheet());

        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_blank());
        assert_eq!(rows[1].row_number, 3);
    }

    #[test]
    fn test_short_rows_fill_null() {
        let catalog = SchemaCatalog::builtin();
        let schema = catalog.get(PRODUCT_SALES).unwrap();
        let sheet = Worksheet::from_text_rows("销售", vec![vec!["货号", "销售日期", "销量"], vec!["SKU1"]]);
        let rows = RowMapper::new(schema).map_sheet(&sheet);

        assert_eq!(rows[0].get("salesQuantity"), Some(&Value::Null));
    }
}

// ==========================================
// 电商运营数据表 - 行规范化
// ==========================================
// 在校验通过之后执行，写入仓储前统一值形式（单值规则见 domain::record::normalize_value）:
// - computed 字段与空值丢弃
// - string: 去除首尾空白
// - number: JSON 数值（整数值保持整数）
// - date: YYYY-MM-DD（去除前导撇号）
// 无法转换的值保留去空白后的文本
// ==========================================

use crate::domain::record::{is_empty_value, normalize_value, EntityRow};
use crate::domain::schema::EntitySchema;
use crate::domain::types::FieldType;
use serde_json::Map;

pub fn normalize_row(schema: &EntitySchema, row: EntityRow) -> EntityRow {
    let mut fields = Map::new();

    for (name, value) in row.fields {
        if is_empty_value(Some(&value)) {
            continue;
        }
        let field_type = match schema.field_spec(&name) {
            Some(spec) if spec.is_computed() => continue,
            Some(spec) => spec.field_type,
            None => FieldType::String,
        };
        if let Some(normalized) = normalize_value(field_type, &value) {
            fields.insert(name, normalized);
        }
    }

    EntityRow {
        fields,
        row_number: row.row_number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use crate::domain::PRODUCT_SALES;
    use serde_json::json;

    #[test]
    fn test_normalize_sales_row() {
        let catalog = SchemaCatalog::builtin();
        let schema = catalog.get(PRODUCT_SALES).unwrap();
        let row = EntityRow::new(5)
            .with("itemNumber", " SKU1 ")
            .with("salesDate", "'2024-03-15")
            .with("salesQuantity", " 5 ")
            .with("salesAmount", "12.50")
            .with("productName", "")
            .with("salesYear", 1999);

        let normalized = normalize_row(schema, row);

        assert_eq!(normalized.row_number, 5);
        assert_eq!(normalized.get("itemNumber"), Some(&json!("SKU1")));
        assert_eq!(normalized.get("salesDate"), Some(&json!("2024-03-15")));
        assert_eq!(normalized.get("salesQuantity"), Some(&json!(5)));
        assert_eq!(normalized.get("salesAmount"), Some(&json!(12.5)));
        assert!(normalized.get("productName").is_none());
        assert!(normalized.get("salesYear").is_none());
    }

    #[test]
    fn test_normalize_value_fallbacks() {
        // 表格日期序列号
        assert_eq!(normalize_value(FieldType::Date, &json!(45366)), Some(json!("2024-03-15")));
        // 字符串字段中的数值转为规范文本
        assert_eq!(normalize_value(FieldType::String, &json!(1001)), Some(json!("1001")));
        // 无法转换的数值保留文本
        assert_eq!(normalize_value(FieldType::Number, &json!(" n/a ")), Some(json!("n/a")));
        assert_eq!(normalize_value(FieldType::String, &json!("   ")), None);
    }
}

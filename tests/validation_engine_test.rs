// ==========================================
// 校验引擎集成测试
// ==========================================
// 测试目标: 内置目录 + 校验引擎 + 自定义规则 + 错误报告
// ==========================================


use sales_sheet_ops::catalog::SchemaCatalog;
use sales_sheet_ops::domain::record::value_to_string;
use sales_sheet_ops::domain::{EntityRow, EntitySchema, FieldSpec, FieldType, ImportMode, ValidatorConfig};
use sales_sheet_ops::engine::{RuleOutcome, ValidationContext, ValidationEngine};
use sales_sheet_ops::importer::{SheetImporter, Worksheet};
use sales_sheet_ops::repository::{MemoryRepository, Repository};
use std::sync::Arc;
use test_helpers::test_today;

fn quantity_schema() -> EntitySchema {
    EntitySchema::new("ProductSales", ImportMode::Append)
        .field(
            "itemNumber",
            FieldSpec::new("货号", FieldType::String).with(ValidatorConfig::required()),
        )
        .field(
            "salesQuantity",
            FieldSpec::new("销量", FieldType::Number)
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
}

#[test]
fn test_negative_quantity_reports_row_seven() {
    let engine = ValidationEngine::new();
    let row = EntityRow::new(7).with("itemNumber", "A").with("salesQuantity", "-3");

    let result = engine.validate_entity(&row, &quantity_schema(), &ValidationContext::new());

    assert!(!result.valid);
    assert_eq!(result.row_number, 7);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors["salesQuantity"], vec!["【销量】不能为负数"]);
}

#[test]
fn test_duplicate_keys_flag_both_rows() {
    let catalog = SchemaCatalog::builtin();
    let schema = catalog.get("Inventory").unwrap();
    let rows = vec![
        EntityRow::new(2).with("itemNumber", "SKU1").with("stockQuantity", 1),
        EntityRow::new(3).with("itemNumber", "SKU2").with("stockQuantity", 2),
        EntityRow::new(4).with("itemNumber", "SKU1").with("stockQuantity", 3),
    ];

    let batch = ValidationEngine::new().validate_all(&rows, schema);

    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.invalid, 2);
    let flagged: Vec<usize> = batch.invalid_items().map(|item| item.row_number()).collect();
    assert_eq!(flagged, vec![2, 4]);
    for item in batch.invalid_items() {
        assert_eq!(item.result.errors["itemNumber"], vec!["【货号】值\"SKU1\"已存在"]);
    }
}

#[test]
fn test_custom_rule_from_json_catalog_drives_import() {
    let catalog = SchemaCatalog::from_json(
        r#"{
            "Supplier": {
                "displayName": "供应商",
                "fields": {
                    "supplierCode": {
                        "title": "供应商编码",
                        "validators": [
                            { "type": "required" },
                            { "type": "prefix", "params": { "prefix": "SUP-" } }
                        ]
                    },
                    "rating": {
                        "title": "评级",
                        "type": "number",
                        "validators": [{ "type": "range", "params": { "min": 1, "max": 5 } }]
                    }
                },
                "requiredTitles": ["供应商编码"],
                "uniqueKey": "supplierCode",
                "identity": ["supplierCode"],
                "importMode": "overwrite"
            }
        }"#,
    )
    .unwrap();

    let mut engine = ValidationEngine::new();
    engine.register("prefix", |value, params| {
        let prefix = params.extra.get("prefix").and_then(|p| p.as_str()).unwrap_or("");
        match value {
            Some(v) if value_to_string(v).starts_with(prefix) => RuleOutcome::pass(),
            _ => RuleOutcome::fail(format!("必须以{}开头", prefix)),
        }
    });

    let catalog = Arc::new(catalog);
    let repo = Arc::new(MemoryRepository::from_catalog(&catalog));
    let importer = SheetImporter::new(catalog, Arc::new(engine), repo.clone()).with_today(test_today());

    let bad = Worksheet::from_text_rows(
        "供应商",
        vec![vec!["供应商编码", "评级"], vec!["SUP-1", "3"], vec!["X-2", "9"]],
    );
    let report = importer.import_sheet(&bad).unwrap();
    assert_eq!(
        report.error_report.as_deref(),
        Some("【供应商】数据验证失败：\n\n第3行：\n  【供应商编码】必须以SUP-开头\n  【评级】必须在1到5之间\n")
    );

    let good = Worksheet::from_text_rows(
        "供应商",
        vec![vec!["供应商编码", "评级"], vec!["SUP-1", "3"], vec!["SUP-2", ""]],
    );
    assert!(importer.import_sheet(&good).unwrap().is_imported());
    assert_eq!(repo.count("Supplier").unwrap(), 2);
}

#[test]
fn test_unknown_rule_type_passes() {
    let schema = EntitySchema::new("Note", ImportMode::Overwrite).field(
        "text",
        FieldSpec::new("内容", FieldType::String).with(ValidatorConfig::new("futureRule")),
    );
    let row = EntityRow::new(2).with("text", "anything");

    let result = ValidationEngine::new().validate_entity(&row, &schema, &ValidationContext::new());

    assert!(result.valid);
}

// ==========================================
// 实体识别集成测试
// ==========================================


use sales_sheet_ops::catalog::SchemaCatalog;
use sales_sheet_ops::domain::ImportMode;
use sales_sheet_ops::engine::EntityIdentifier;
use std::sync::Arc;
use test_helpers::builtin_catalog;

#[test]
fn test_identify_builtin_entities() {
    let identifier = EntityIdentifier::new(builtin_catalog());

    let sales = identifier.identify(&["货号", "销售日期", "销量"]);
    assert_eq!(sales, Some("ProductSales"));
    assert_eq!(identifier.get_import_mode("ProductSales"), Some(ImportMode::Append));

    let regular = identifier.identify(&["商品名称", " 货号 ", "成本价", "类目"]);
    assert_eq!(regular, Some("RegularProduct"));
    assert_eq!(identifier.get_import_mode("RegularProduct"), Some(ImportMode::Overwrite));

    assert_eq!(identifier.identify(&["组合货号", "子商品货号", "子商品数量"]), Some("ComboProduct"));
    assert_eq!(identifier.identify(&["货号", "库存数量", "仓库"]), Some("Inventory"));
}

#[test]
fn test_identify_misses() {
    let identifier = EntityIdentifier::new(builtin_catalog());
    let empty: [&str; 0] = [];

    assert_eq!(identifier.identify(&empty), None);
    assert_eq!(identifier.identify(&["货号"]), None);
    assert_eq!(identifier.identify(&["货号 销售日期 销量"]), None);
    assert_eq!(identifier.get_import_mode("Unknown"), None);
    assert!(!identifier.can_import("Unknown"));
}

#[test]
fn test_ambiguous_headers_follow_catalog_order() {
    let identifier = EntityIdentifier::new(builtin_catalog());
    let headers = ["货号", "销售日期", "销量", "库存数量"];

    assert_eq!(identifier.candidates(&headers), vec!["ProductSales", "Inventory"]);
    assert_eq!(identifier.identify(&headers), Some("ProductSales"));
}

#[test]
fn test_custom_catalog_order_decides_ties() {
    let catalog = SchemaCatalog::from_json(
        r#"[
            { "name": "Stocktake", "fields": { "itemNumber": { "title": "货号" } },
              "requiredTitles": ["货号"], "importMode": "overwrite" },
            { "name": "Hidden", "fields": { "itemNumber": { "title": "货号" } },
              "requiredTitles": ["货号"], "importMode": "append", "canImport": false }
        ]"#,
    )
    .unwrap();
    let identifier = EntityIdentifier::new(Arc::new(catalog));

    assert_eq!(identifier.candidates(&["货号"]), vec!["Stocktake"]);
    assert!(!identifier.can_import("Hidden"));
    assert_eq!(identifier.get_import_mode("Hidden"), Some(ImportMode::Append));
}

// ==========================================
// 电商运营数据表 - 实体目录 (Schema Catalog)
// ==========================================
// 职责: 提供只读、进程内共享的 实体名 → Schema 映射
// 约束: 迭代顺序稳定，且即为实体识别的优先级顺序
// ==========================================

pub mod builtin;
pub mod error;

pub use error::{CatalogError, CatalogResult};

use crate::domain::schema::EntitySchema;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

// ==========================================
// SchemaCatalog - 实体目录
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: IndexMap<String, EntitySchema>,
}

/// 目录 JSON 支持数组或 名称 → Schema 对象两种写法
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<EntitySchema>),
    Map(IndexMap<String, EntitySchema>),
}

impl SchemaCatalog {
    /// 按给定顺序构建目录并做结构检查
    pub fn new<I>(schemas: I) -> CatalogResult<Self>
    where
        I: IntoIterator<Item = EntitySchema>,
    {
        let mut map = IndexMap::new();
        for schema in schemas {
            check_schema(&schema)?;
            if map.contains_key(&schema.name) {
                return Err(CatalogError::DuplicateEntity(schema.name));
            }
            map.insert(schema.name.clone(), schema);
        }
        debug!(entities = map.len(), "实体目录初始化完成");
        Ok(Self { schemas: map })
    }

    /// 内置目录（ProductSales / RegularProduct / ComboProduct / Inventory）
    pub fn builtin() -> Self {
        Self {
            schemas: builtin::builtin_schemas()
                .into_iter()
                .map(|schema| (schema.name.clone(), schema))
                .collect(),
        }
    }

    /// 从 JSON 加载目录
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let schemas = match serde_json::from_str::<CatalogDocument>(json)? {
            CatalogDocument::List(list) => list,
            CatalogDocument::Map(map) => map
                .into_iter()
                .map(|(name, mut schema)| {
                    if schema.name.is_empty() {
                        schema.name = name;
                    }
                    schema
                })
                .collect(),
        };
        Self::new(schemas)
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.schemas.get(name)
    }

    pub fn get_all(&self) -> &IndexMap<String, EntitySchema> {
        &self.schemas
    }

    /// canImport = true 的实体名（目录顺序）
    pub fn importable(&self) -> Vec<&str> {
        self.schemas
            .values()
            .filter(|schema| schema.can_import)
            .map(|schema| schema.name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// 结构检查: 名称、引用字段、正则
fn check_schema(schema: &EntitySchema) -> CatalogResult<()> {
    if schema.name.trim().is_empty() {
        return Err(CatalogError::EmptyEntityName);
    }

    let unknown = |role: &'static str, field: &str| CatalogError::UnknownField {
        entity: schema.name.clone(),
        role,
        field: field.to_string(),
    };

    if let Some(key) = &schema.unique_key {
        if !schema.fields.contains_key(key) {
            return Err(unknown("uniqueKey", key));
        }
    }
    if let Some(field) = schema.identity.iter().find(|f| !schema.fields.contains_key(*f)) {
        return Err(unknown("identity", field));
    }
    if let Some(field) = schema.indexes.iter().find(|f| !schema.fields.contains_key(*f)) {
        return Err(unknown("indexes", field));
    }

    for (name, spec) in &schema.fields {
        for validator in &spec.validators {
            if validator.rule_type != "pattern" {
                continue;
            }
            if let Some(pattern) = &validator.params.regex {
                Regex::new(pattern).map_err(|e| CatalogError::InvalidPattern {
                    entity: schema.name.clone(),
                    field: name.clone(),
                    message: e.to_string(),
                })?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FieldSpec, ValidatorConfig};
    use crate::domain::types::{FieldType, ImportMode};

    fn schema(name: &str, can_import: bool) -> EntitySchema {
        EntitySchema::new(name, ImportMode::Overwrite)
            .field("code", FieldSpec::new("编码", FieldType::String))
            .required_titles(["编码"])
            .importable(can_import)
    }

    #[test]
    fn test_builtin_order_and_importable() {
        let catalog = SchemaCatalog::builtin();
        let names: Vec<&str> = catalog.get_all().keys().map(String::as_str).collect();

        assert_eq!(
            names,
            vec!["ProductSales", "RegularProduct", "ComboProduct", "Inventory"]
        );
        assert_eq!(catalog.importable(), names);
    }

    #[test]
    fn test_builtin_passes_structure_check() {
        let catalog = SchemaCatalog::new(builtin::builtin_schemas()).unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_importable_filters_and_keeps_order() {
        let catalog = SchemaCatalog::new(vec![
            schema("B", true),
            schema("A", false),
            schema("C", true),
        ])
        .unwrap();

        assert_eq!(catalog.importable(), vec!["B", "C"]);
        assert!(catalog.get("A").is_some());
        assert!(catalog.get("Z").is_none());
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let result = SchemaCatalog::new(vec![schema("A", true), schema("A", true)]);
        assert!(matches!(result, Err(CatalogError::DuplicateEntity(name)) if name == "A"));
    }

    #[test]
    fn test_unknown_unique_key_rejected() {
        let bad = schema("A", true).unique_key("missing");
        let result = SchemaCatalog::new(vec![bad]);
        assert!(matches!(result, Err(CatalogError::UnknownField { role: "uniqueKey", .. })));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let bad = schema("A", true).field(
            "sku",
            FieldSpec::new("SKU", FieldType::String).with(ValidatorConfig::pattern("([", None)),
        );
        let result = SchemaCatalog::new(vec![bad]);
        assert!(matches!(result, Err(CatalogError::InvalidPattern { .. })));
    }

    #[test]
    fn test_from_json_map_form_uses_keys_as_names() {
        let json = r#"{
            "Supplier": {
                "fields": {"code": {"title": "供应商编码"}},
                "requiredTitles": ["供应商编码"],
                "importMode": "overwrite"
            },
            "Shipment": {
                "fields": {"code": {"title": "运单号"}},
                "requiredTitles": ["运单号"],
                "importMode": "append"
            }
        }"#;

        let catalog = SchemaCatalog::from_json(json).unwrap();
        let names: Vec<&str> = catalog.get_all().keys().map(String::as_str).collect();

        assert_eq!(names, vec!["Supplier", "Shipment"]);
        assert_eq!(catalog.get("Shipment").unwrap().import_mode, ImportMode::Append);
    }

    #[test]
    fn test_from_json_list_form() {
        let json = r#"[
            {"name": "Supplier", "fields": {"code": {"title": "供应商编码"}},
             "requiredTitles": ["供应商编码"], "importMode": "overwrite", "canImport": false}
        ]"#;

        let catalog = SchemaCatalog::from_json(json).unwrap();
        assert!(catalog.importable().is_empty());
        assert!(!catalog.get("Supplier").unwrap().can_import);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            SchemaCatalog::from_json("{not json"),
            Err(CatalogError::JsonError(_))
        ));
    }
}

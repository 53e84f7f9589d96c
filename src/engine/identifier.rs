// ==========================================
// 电商运营数据表 - 实体识别器
// ==========================================
// 职责: 按表头判断工作表属于哪个实体
// 规则: 按目录顺序遍历可导入实体，必需标题全部出现即命中
// 约束: 标题精确匹配（仅去除首尾空白），表头中多余的列忽略
// ==========================================

use crate::catalog::SchemaCatalog;
use crate::domain::schema::EntitySchema;
use crate::domain::types::ImportMode;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

// ==========================================
// EntityIdentifier - 实体识别器
// ==========================================
#[derive(Debug, Clone)]
pub struct EntityIdentifier {
    catalog: Arc<SchemaCatalog>,
}

impl EntityIdentifier {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// 识别表头所属实体
    ///
    /// # 返回
    /// - Some(name): 目录顺序中第一个匹配的可导入实体
    /// - None: 表头为空或没有实体匹配
    pub fn identify<S: AsRef<str>>(&self, headers: &[S]) -> Option<&str> {
        let matches = self.candidates(headers);

        match matches.as_slice() {
            [] => {
                if !headers.is_empty() {
                    debug!(columns = headers.len(), "表头未匹配任何实体");
                }
                None
            }
            [only] => Some(*only),
            [first, ..] => {
                warn!(
                    chosen = %first,
                    candidates = ?matches,
                    "表头同时匹配多个实体，按目录顺序取第一个"
                );
                Some(*first)
            }
        }
    }

    /// 所有匹配的可导入实体（目录顺序）
    pub fn candidates<S: AsRef<str>>(&self, headers: &[S]) -> Vec<&str> {
        if headers.is_empty() {
            return Vec::new();
        }
        let header_set: HashSet<&str> = headers.iter().map(|h| h.as_ref().trim()).collect();

        self.catalog
            .iter()
            .filter(|schema| schema.can_import && matches_headers(schema, &header_set))
            .map(|schema| schema.name.as_str())
            .collect()
    }

    /// 实体是否允许导入；未知实体返回 false
    pub fn can_import(&self, entity_name: &str) -> bool {
        self.catalog
            .get(entity_name)
            .is_some_and(|schema| schema.can_import)
    }

    /// 实体的导入模式；未知实体返回 None
    pub fn get_import_mode(&self, entity_name: &str) -> Option<ImportMode> {
        self.catalog
            .get(entity_name)
            .map(|schema| schema.import_mode)
    }
}

/// 必需标题是否全部出现在表头中
fn matches_headers(schema: &EntitySchema, header_set: &HashSet<&str>) -> bool {
    schema
        .required_titles
        .iter()
        .all(|title| header_set.contains(title.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::FieldSpec;
    use crate::domain::types::FieldType;

    fn builtin() -> EntityIdentifier {
        EntityIdentifier::new(Arc::new(SchemaCatalog::builtin()))
    }

    fn entity(name: &str, titles: &[&str], can_import: bool) -> EntitySchema {
        let mut schema = EntitySchema::new(name, ImportMode::Overwrite)
            .required_titles(titles.iter().copied())
            .importable(can_import);
        for (i, title) in titles.iter().enumerate() {
            schema = schema.field(format!("f{}", i), FieldSpec::new(*title, FieldType::String));
        }
        schema
    }

    #[test]
    fn test_identify_sales_sheet() {
        let identifier = builtin();
        let name = identifier.identify(&["货号", "销售日期", "销量"]);

        assert_eq!(name, Some("ProductSales"));
        assert_eq!(
            identifier.get_import_mode("ProductSales"),
            Some(ImportMode::Append)
        );
    }

    #[test]
    fn test_identify_regular_product_sheet() {
        let identifier = builtin();
        let name = identifier.identify(&["货号", "商品名称", "类目", "成本价", "售价"]);

        assert_eq!(name, Some("RegularProduct"));
        assert_eq!(
            identifier.get_import_mode("RegularProduct"),
            Some(ImportMode::Overwrite)
        );
    }

    #[test]
    fn test_identify_trims_headers_and_ignores_extras() {
        let identifier = builtin();
        let headers = vec![
            " 组合货号 ".to_string(),
            "备注".to_string(),
            "子商品货号\t".to_string(),
            "子商品数量".to_string(),
        ];
        assert_eq!(identifier.identify(&headers), Some("ComboProduct"));
    }

    #[test]
    fn test_identify_empty_or_unknown() {
        let identifier = builtin();
        let empty: [&str; 0] = [];

        assert_eq!(identifier.identify(&empty), None);
        assert_eq!(identifier.identify(&["日期", "访客数"]), None);
        // 标题不做模糊匹配
        assert_eq!(identifier.identify(&["货 号", "库存数量"]), None);
    }

    #[test]
    fn test_identify_prefers_catalog_order() {
        let catalog = SchemaCatalog::new(vec![
            entity("Hidden", &["编码"], false),
            entity("First", &["编码"], true),
            entity("Second", &["编码", "名称"], true),
        ])
        .unwrap();
        let identifier = EntityIdentifier::new(Arc::new(catalog));

        assert_eq!(identifier.identify(&["名称", "编码"]), Some("First"));
        assert_eq!(identifier.candidates(&["名称", "编码"]), vec!["First", "Second"]);
        assert_eq!(identifier.candidates(&["名称"]), Vec::<&str>::new());
    }

    #[test]
    fn test_identify_matches_first_subset_for_every_header_set() {
        let identifier = builtin();
        let titles = ["货号", "销售日期", "销量", "商品名称", "成本价", "库存数量", "组合货号"];

        // 枚举全部标题子集，结果与“目录中第一个必需标题为子集的实体”一致
        for mask in 0u32..(1 << titles.len()) {
            let headers: Vec<&str> = titles
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| *t)
                .collect();

            let expected = identifier
                .catalog()
                .iter()
                .filter(|s| s.can_import)
                .find(|s| s.required_titles.iter().all(|t| headers.contains(&t.as_str())))
                .map(|s| s.name.as_str());

            assert_eq!(identifier.identify(&headers), expected, "headers={:?}", headers);
        }
    }

    #[test]
    fn test_can_import_and_unknown_entity() {
        let catalog = SchemaCatalog::new(vec![entity("Locked", &["编码"], false)]).unwrap();
        let identifier = EntityIdentifier::new(Arc::new(catalog));

        assert!(!identifier.can_import("Locked"));
        assert!(!identifier.can_import("Missing"));
        assert_eq!(identifier.get_import_mode("Missing"), None);
        assert_eq!(identifier.identify(&["编码"]), None);
    }
}

// ==========================================
// 电商运营数据表 - 内置实体目录
// ==========================================
// 顺序即识别优先级: 销售数据 → 常规商品 → 组合商品 → 库存
// ==========================================

use crate::domain::sales::{fields as sales, PRODUCT_SALES};
use crate::domain::schema::{EntitySchema, FieldSpec, ValidatorConfig};
use crate::domain::types::{FieldType, ImportMode};

pub const REGULAR_PRODUCT: &str = "RegularProduct";
pub const COMBO_PRODUCT: &str = "ComboProduct";
pub const INVENTORY: &str = "Inventory";

const ITEM_NUMBER_PATTERN: &str = r"^[A-Za-z0-9_\-]+$";
const ITEM_NUMBER_DESC: &str = "字母、数字、下划线或短横线";

/// 内置实体 Schema 列表（有序）
pub fn builtin_schemas() -> Vec<EntitySchema> {
    vec![
        product_sales(),
        regular_product(),
        combo_product(),
        inventory(),
    ]
}

fn product_sales() -> EntitySchema {
    EntitySchema::new(PRODUCT_SALES, ImportMode::Append)
        .display_name("销售数据")
        .field(
            sales::ITEM_NUMBER,
            FieldSpec::new("货号", FieldType::String).with(ValidatorConfig::required()),
        )
        .field(
            sales::SALES_DATE,
            FieldSpec::new("销售日期", FieldType::Date)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::date()),
        )
        .field(
            sales::SALES_QUANTITY,
            FieldSpec::new("销量", FieldType::Number)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
        .field(
            sales::SALES_AMOUNT,
            FieldSpec::new("销售额", FieldType::Number)
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
        .field("productName", FieldSpec::new("商品名称", FieldType::String))
        .field(sales::SALES_YEAR, FieldSpec::computed("销售年份"))
        .field(sales::SALES_MONTH, FieldSpec::computed("销售月份"))
        .field(sales::SALES_WEEK_OF_YEAR, FieldSpec::computed("销售周"))
        .field(sales::DAYS_SINCE_SALE, FieldSpec::computed("距今天数"))
        .required_titles(["货号", "销售日期", "销量"])
        .identity([sales::ITEM_NUMBER, sales::SALES_DATE])
        .indexes([
            sales::ITEM_NUMBER,
            sales::SALES_YEAR,
            sales::SALES_MONTH,
            sales::SALES_WEEK_OF_YEAR,
            sales::SALES_DATE,
            sales::DAYS_SINCE_SALE,
        ])
}

fn regular_product() -> EntitySchema {
    EntitySchema::new(REGULAR_PRODUCT, ImportMode::Overwrite)
        .display_name("常规商品")
        .field(
            "itemNumber",
            FieldSpec::new("货号", FieldType::String)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::pattern(ITEM_NUMBER_PATTERN, Some(ITEM_NUMBER_DESC))),
        )
        .field(
            "productName",
            FieldSpec::new("商品名称", FieldType::String).with(ValidatorConfig::required()),
        )
        .field("category", FieldSpec::new("类目", FieldType::String))
        .field(
            "costPrice",
            FieldSpec::new("成本价", FieldType::Number)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
        .field(
            "salePrice",
            FieldSpec::new("售价", FieldType::Number)
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::positive()),
        )
        .field(
            "status",
            FieldSpec::new("状态", FieldType::String).with(ValidatorConfig::one_of(["在售", "停售"])),
        )
        .required_titles(["货号", "商品名称", "成本价"])
        .unique_key("itemNumber")
        .identity(["itemNumber"])
        .indexes(["itemNumber"])
}

fn combo_product() -> EntitySchema {
    EntitySchema::new(COMBO_PRODUCT, ImportMode::Overwrite)
        .display_name("组合商品")
        .field(
            "comboNumber",
            FieldSpec::new("组合货号", FieldType::String)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::pattern(ITEM_NUMBER_PATTERN, Some(ITEM_NUMBER_DESC))),
        )
        .field("comboName", FieldSpec::new("组合名称", FieldType::String))
        .field(
            "itemNumber",
            FieldSpec::new("子商品货号", FieldType::String).with(ValidatorConfig::required()),
        )
        .field(
            "quantity",
            FieldSpec::new("子商品数量", FieldType::Number)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::positive()),
        )
        .required_titles(["组合货号", "子商品货号", "子商品数量"])
        .identity(["comboNumber", "itemNumber"])
        .indexes(["comboNumber", "itemNumber"])
}

fn inventory() -> EntitySchema {
    EntitySchema::new(INVENTORY, ImportMode::Overwrite)
        .display_name("库存")
        .field(
            "itemNumber",
            FieldSpec::new("货号", FieldType::String).with(ValidatorConfig::required()),
        )
        .field(
            "stockQuantity",
            FieldSpec::new("库存数量", FieldType::Number)
                .with(ValidatorConfig::required())
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
        .field(
            "inTransitQuantity",
            FieldSpec::new("在途数量", FieldType::Number)
                .with(ValidatorConfig::number())
                .with(ValidatorConfig::non_negative()),
        )
        .field("warehouse", FieldSpec::new("仓库", FieldType::String))
        .required_titles(["货号", "库存数量"])
        .unique_key("itemNumber")
        .identity(["itemNumber"])
        .indexes(["itemNumber"])
}

// ==========================================
// 电商运营数据表 - 销售记录
// ==========================================
// 派生索引字段（salesYear / salesMonth / salesWeekOfYear / daysSinceSale）
// 全部由 salesDate 决定，构造时统一计算
// ==========================================

use crate::domain::dates::{format_canonical, parse_date_str, parse_date_value};
use crate::domain::record::{is_empty_value, number_value, value_to_f64, value_to_string, EntityRow, Record};
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// 销售实体名
pub const PRODUCT_SALES: &str = "ProductSales";

/// 销售记录字段名
pub mod fields {
    pub const ITEM_NUMBER: &str = "itemNumber";
    pub const SALES_DATE: &str = "salesDate";
    pub const SALES_QUANTITY: &str = "salesQuantity";
    pub const SALES_AMOUNT: &str = "salesAmount";
    pub const SALES_YEAR: &str = "salesYear";
    pub const SALES_MONTH: &str = "salesMonth";
    pub const SALES_WEEK_OF_YEAR: &str = "salesWeekOfYear";
    pub const DAYS_SINCE_SALE: &str = "daysSinceSale";
}

/// 派生字段（导入时由系统计算，不从表格读取）
pub const DERIVED_FIELDS: &[&str] = &[
    fields::SALES_YEAR,
    fields::SALES_MONTH,
    fields::SALES_WEEK_OF_YEAR,
    fields::DAYS_SINCE_SALE,
];

// ==========================================
// SalesRecord - 销售记录（类型化）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub item_number: String,
    pub sales_date: NaiveDate,
    pub sales_year: i32,
    pub sales_month: u32,
    pub sales_week_of_year: u32,
    pub days_since_sale: i64,

    /// 可汇总的数值字段（salesQuantity 等）
    pub measures: IndexMap<String, f64>,

    /// 其他非数值字段（原样保存）
    pub attributes: Map<String, Value>,
}

impl SalesRecord {
    pub fn new(item_number: impl Into<String>, sales_date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            item_number: item_number.into(),
            sales_date,
            sales_year: sales_date.year(),
            sales_month: sales_date.month(),
            sales_week_of_year: sales_date.iso_week().week(),
            days_since_sale: (today - sales_date).num_days(),
            measures: IndexMap::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_measure(mut self, field: impl Into<String>, value: f64) -> Self {
        self.measures.insert(field.into(), value);
        self
    }

    /// 从已校验、已规范化的行构造
    ///
    /// 货号为空或销售日期无法解析时返回 None
    pub fn from_row(row: &EntityRow, today: NaiveDate) -> Option<Self> {
        let item_number = row
            .get(fields::ITEM_NUMBER)
            .filter(|v| !is_empty_value(Some(*v)))
            .map(value_to_string)?;
        let sales_date = row.get(fields::SALES_DATE).and_then(parse_date_value)?;

        let mut record = Self::new(item_number.trim(), sales_date, today);
        record.collect_fields(&row.fields);
        Some(record)
    }

    /// 从仓储文档还原
    pub fn from_record(record: &Record, today: NaiveDate) -> Option<Self> {
        let item_number = record.get_str(fields::ITEM_NUMBER)?.to_string();
        let sales_date = record.get_str(fields::SALES_DATE).and_then(parse_date_str)?;

        let mut sales = Self::new(item_number, sales_date, today);
        sales.collect_fields(record.fields());
        Some(sales)
    }

    /// 数值字段记为度量，其余非键字段记为属性
    fn collect_fields(&mut self, source: &Map<String, Value>) {
        for (name, value) in source {
            if name == fields::ITEM_NUMBER
                || name == fields::SALES_DATE
                || DERIVED_FIELDS.contains(&name.as_str())
            {
                continue;
            }
            match value {
                Value::Number(_) => {
                    self.measures
                        .insert(name.clone(), value_to_f64(value).unwrap_or(0.0));
                }
                _ => {
                    self.attributes.insert(name.clone(), value.clone());
                }
            }
        }
    }

    /// 以新的“今天”重算 daysSinceSale
    pub fn rebase(&mut self, today: NaiveDate) {
        self.days_since_sale = (today - self.sales_date).num_days();
    }

    pub fn date_key(&self) -> String {
        format_canonical(self.sales_date)
    }

    /// 数值字段，缺失为 0
    pub fn measure(&self, field: &str) -> f64 {
        self.measures.get(field).copied().unwrap_or(0.0)
    }

    /// 转为仓储文档（salesDate 为规范字符串）
    pub fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(fields::ITEM_NUMBER, self.item_number.clone())
            .with(fields::SALES_DATE, self.date_key());

        for (name, value) in &self.attributes {
            record.insert(name.clone(), value.clone());
        }
        for (name, value) in &self.measures {
            record.insert(name.clone(), number_value(*value));
        }

        record.insert(fields::SALES_YEAR, self.sales_year);
        record.insert(fields::SALES_MONTH, self.sales_month);
        record.insert(fields::SALES_WEEK_OF_YEAR, self.sales_week_of_year);
        record.insert(fields::DAYS_SINCE_SALE, self.days_since_sale);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_derived_fields_follow_sales_date() {
        let record = SalesRecord::new("X", ymd(2021, 1, 1), ymd(2021, 1, 11));

        assert_eq!(record.sales_year, 2021);
        assert_eq!(record.sales_month, 1);
        // 2021-01-01 属于 2020 年第 53 周
        assert_eq!(record.sales_week_of_year, 53);
        assert_eq!(record.days_since_sale, 10);
    }

    #[test]
    fn test_from_row_collects_measures() {
        let row = EntityRow::new(2)
            .with(fields::ITEM_NUMBER, "SKU1")
            .with(fields::SALES_DATE, "'2024-03-15")
            .with(fields::SALES_QUANTITY, 5)
            .with(fields::SALES_AMOUNT, 99.5)
            .with("productName", "保温杯");

        let record = SalesRecord::from_row(&row, ymd(2024, 3, 20)).unwrap();

        assert_eq!(record.item_number, "SKU1");
        assert_eq!(record.date_key(), "2024-03-15");
        assert_eq!(record.measure(fields::SALES_QUANTITY), 5.0);
        assert_eq!(record.measure(fields::SALES_AMOUNT), 99.5);
        assert_eq!(record.measure("refundQuantity"), 0.0);
        assert_eq!(record.attributes.get("productName"), Some(&json!("保温杯")));
        assert_eq!(record.days_since_sale, 5);
    }

    #[test]
    fn test_from_row_requires_item_and_date() {
        let today = ymd(2024, 3, 20);
        let no_item = EntityRow::new(2).with(fields::SALES_DATE, "2024-03-15");
        let bad_date = EntityRow::new(3)
            .with(fields::ITEM_NUMBER, "SKU1")
            .with(fields::SALES_DATE, "not a date");

        assert!(SalesRecord::from_row(&no_item, today).is_none());
        assert!(SalesRecord::from_row(&bad_date, today).is_none());
    }

    #[test]
    fn test_to_record_and_back() {
        let today = ymd(2024, 5, 10);
        let record = SalesRecord::new("X", ymd(2024, 3, 15), today).with_measure(fields::SALES_QUANTITY, 5.0);
        let doc = record.to_record();

        assert_eq!(doc.get_str(fields::SALES_DATE), Some("2024-03-15"));
        assert_eq!(doc.get(fields::SALES_YEAR), Some(&json!(2024)));
        assert_eq!(doc.get(fields::SALES_MONTH), Some(&json!(3)));
        assert_eq!(doc.get(fields::SALES_WEEK_OF_YEAR), Some(&json!(11)));
        assert_eq!(doc.get(fields::SALES_QUANTITY), Some(&json!(5)));

        let back = SalesRecord::from_record(&doc, today).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_rebase_days_since_sale() {
        let mut record = SalesRecord::new("X", ymd(2024, 3, 15), ymd(2024, 3, 15));
        assert_eq!(record.days_since_sale, 0);

        record.rebase(ymd(2024, 4, 1));
        assert_eq!(record.days_since_sale, 17);
    }
}

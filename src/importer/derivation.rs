// ==========================================
// 电商运营数据表 - 字段派生
// ==========================================
// 职责: 规范化后的行 → 仓储文档
// 销售数据: salesYear / salesMonth / salesWeekOfYear(ISO) / daysSinceSale
// 其他实体: 行字段原样入库
// ==========================================

use crate::domain::dates::parse_date_str;
use crate::domain::record::{EntityRow, Record};
use crate::domain::sales::{fields, SalesRecord, PRODUCT_SALES};
use chrono::NaiveDate;
use tracing::warn;

/// 行 → 仓储文档
///
/// 销售行缺少货号或日期时跳过（校验通过的行不会出现此情况）
pub fn derive_records(entity: &str, rows: Vec<EntityRow>, today: NaiveDate) -> Vec<Record> {
    if entity != PRODUCT_SALES {
        return rows.into_iter().map(Record::from).collect();
    }

    rows.iter()
        .filter_map(|row| {
            let derived = SalesRecord::from_row(row, today);
            if derived.is_none() {
                warn!(row_number = row.row_number, "销售行缺少货号或销售日期，跳过派生");
            }
            derived
        })
        .map(|sales| sales.to_record())
        .collect()
}

/// 以新的“今天”重算销售文档的 daysSinceSale
///
/// # 返回
/// - true: 已更新
/// - false: salesDate 缺失或无法解析
pub fn rebase_days_since_sale(record: &mut Record, today: NaiveDate) -> bool {
    let Some(sales_date) = record.get_str(fields::SALES_DATE).and_then(parse_date_str) else {
        return false;
    };
    record.insert(fields::DAYS_SINCE_SALE, (today - sales_date).num_days());
    true
}

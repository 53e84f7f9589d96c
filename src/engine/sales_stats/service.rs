use super::cache::SalesCache;
use super::calendar::{
    days_in_month, format_display_date, get_iso_week_number, last_week_of_year, recent_days,
    MonthDays, YearRange,
};
use crate::domain::dates::format_canonical;
use crate::domain::record::Record;
use crate::domain::sales::{fields, PRODUCT_SALES};
use crate::repository::{Filter, Query, Repository, RepositoryResult};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 单日销量
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub date_str: String,
    pub sales: f64,
}

// ==========================================
// SalesStatisticsService - 销量统计服务
// ==========================================
/// “今天”在构造时捕获并在实例生命周期内保持不变；需要新的时间基准时重新构造
pub struct SalesStatisticsService {
    repository: Arc<dyn Repository>,
    current_date: NaiveDate,
    cache: Option<SalesCache>,
}

impl fmt::Debug for SalesStatisticsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesStatisticsService")
            .field("current_date", &self.current_date)
            .field("cache_enabled", &self.cache.is_some())
            .finish()
    }
}

impl SalesStatisticsService {
    /// 以本地当前日期为“今天”
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self::with_current_date(repository, Local::now().date_naive())
    }

    /// 指定“今天”
    pub fn with_current_date(repository: Arc<dyn Repository>, current_date: NaiveDate) -> Self {
        Self {
            repository,
            current_date,
            cache: None,
        }
    }

    /// 启用本地销售缓存（单日查询走缓存）
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(SalesCache::default());
        self
    }

    /// 丢弃缓存，下一次查询重新全量加载
    pub fn refresh_cache(&self) -> RepositoryResult<()> {
        match &self.cache {
            Some(cache) => cache.clear(),
            None => Ok(()),
        }
    }

    pub fn cache_loaded(&self) -> bool {
        self.cache.as_ref().is_some_and(SalesCache::is_loaded)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    // ==========================================
    // 聚合查询
    // ==========================================
    // 货号为空时返回 0；field 缺省为 salesQuantity；非数值按 0 计

    pub fn get_year_total_sales(
        &self,
        item_number: &str,
        year: i32,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let filter = Filter::new().eq(fields::SALES_YEAR, year);
        self.sum_where(item_number, filter, field)
    }

    pub fn get_month_sales(
        &self,
        item_number: &str,
        year: i32,
        month: u32,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let filter = Filter::new()
            .eq(fields::SALES_YEAR, year)
            .eq(fields::SALES_MONTH, month);
        self.sum_where(item_number, filter, field)
    }

    /// week 为 ISO 周序号
    pub fn get_week_sales(
        &self,
        item_number: &str,
        year: i32,
        week: u32,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let filter = Filter::new()
            .eq(fields::SALES_YEAR, year)
            .eq(fields::SALES_WEEK_OF_YEAR, week);
        self.sum_where(item_number, filter, field)
    }

    /// 单日销量；日期按 YYYY-MM-DD 查询，无记录为 0
    pub fn get_day_sales(
        &self,
        item_number: &str,
        date: NaiveDate,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let item_number = item_number.trim();
        if item_number.is_empty() {
            return Ok(0.0);
        }
        let field = field.unwrap_or(fields::SALES_QUANTITY);
        let date_str = format_canonical(date);

        if let Some(cache) = &self.cache {
            return cache.with_index(self.repository.as_ref(), |index| {
                index
                    .get(item_number)
                    .and_then(|days| days.get(&date_str))
                    .map_or(0.0, |record| record.get_f64(field))
            });
        }

        let filter = Filter::new()
            .eq(fields::ITEM_NUMBER, item_number)
            .eq(fields::SALES_DATE, date_str);
        Ok(self
            .repository
            .find_one(PRODUCT_SALES, &filter)?
            .map_or(0.0, |record| record.get_f64(field)))
    }

    /// daysSinceSale <= days 的记录合计
    ///
    /// daysSinceSale 是导入时按当天计算并存储的值，不随 current_date 变化；
    /// 与 get_last_n_days_daily_sales 对齐前需先调用
    /// `SheetImporter::rebase_sales_days` 按今天重算
    pub fn get_last_n_days_sum(
        &self,
        item_number: &str,
        days: u32,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let item_number = item_number.trim();
        if item_number.is_empty() {
            return Ok(0.0);
        }
        let query = Query::new(Filter::new().eq(fields::ITEM_NUMBER, item_number))
            .lte(fields::DAYS_SINCE_SALE, f64::from(days));
        let records = self.repository.query(PRODUCT_SALES, &query)?;
        Ok(sum_field(&records, field.unwrap_or(fields::SALES_QUANTITY)))
    }

    /// 最近 days 天的逐日销量（旧 → 新，缺失日期补 0）
    ///
    /// 第 i 项的日期恰为 today - (days - 1 - i)
    pub fn get_last_n_days_daily_sales(
        &self,
        item_number: &str,
        days: usize,
    ) -> RepositoryResult<Vec<DailySales>> {
        let item_number = item_number.trim();
        let dates = self.get_recent_days(days);
        if item_number.is_empty() {
            return Ok(dates.into_iter().map(|date| daily(date, 0.0)).collect());
        }

        let by_date: HashMap<String, f64> = match &self.cache {
            Some(cache) => cache.with_index(self.repository.as_ref(), |index| {
                index
                    .get(item_number)
                    .map(|days| {
                        days.iter()
                            .map(|(date, record)| (date.clone(), record.get_f64(fields::SALES_QUANTITY)))
                            .collect()
                    })
                    .unwrap_or_default()
            })?,
            None => {
                let filter = Filter::new().eq(fields::ITEM_NUMBER, item_number);
                let mut totals = HashMap::new();
                for record in self.repository.find(PRODUCT_SALES, &filter)? {
                    if let Some(date) = record.get_str(fields::SALES_DATE) {
                        *totals.entry(date.to_string()).or_insert(0.0) +=
                            record.get_f64(fields::SALES_QUANTITY);
                    }
                }
                totals
            }
        };

        Ok(dates
            .into_iter()
            .map(|date| {
                let sales = by_date.get(&format_canonical(date)).copied().unwrap_or(0.0);
                daily(date, sales)
            })
            .collect())
    }

    fn sum_where(
        &self,
        item_number: &str,
        filter: Filter,
        field: Option<&str>,
    ) -> RepositoryResult<f64> {
        let item_number = item_number.trim();
        if item_number.is_empty() {
            return Ok(0.0);
        }
        let filter = filter.eq(fields::ITEM_NUMBER, item_number);
        let records = self.repository.find(PRODUCT_SALES, &filter)?;
        let field = field.unwrap_or(fields::SALES_QUANTITY);
        debug!(item = %item_number, hits = records.len(), field, "销量聚合");
        Ok(sum_field(&records, field))
    }

    // ==========================================
    // 日历辅助（以 current_date 为界）
    // ==========================================

    pub fn get_year_range(&self) -> YearRange {
        let current = self.current_date.year();
        YearRange {
            before_last: current - 2,
            last: current - 1,
            current,
        }
    }

    /// 往年 1..12；今年 1..当前月；未来年份为空
    pub fn get_months_of_year(&self, year: i32) -> Vec<u32> {
        let current = self.current_date.year();
        if year < current {
            (1..=12).collect()
        } else if year == current {
            (1..=self.current_date.month()).collect()
        } else {
            Vec::new()
        }
    }

    /// 往年 1..最后一周；今年 1..当前 ISO 周号
    ///
    /// 今年只看今天的 ISO 周号，不比较 ISO 年：
    /// 1 月 1 日若属上一年第 53 周，返回 1..53；12 月 30 日若属下一年第 1 周，返回 [1]
    pub fn get_weeks_of_year(&self, year: i32) -> Vec<u32> {
        let current = self.current_date.year();
        if year < current {
            (1..=last_week_of_year(year)).collect()
        } else if year == current {
            (1..=get_iso_week_number(self.current_date)).collect()
        } else {
            Vec::new()
        }
    }

    /// 每月的日期列表；今年截至今天
    pub fn get_days_of_year(&self, year: i32) -> Vec<MonthDays> {
        let is_current = year == self.current_date.year();
        self.get_months_of_year(year)
            .into_iter()
            .map(|month| {
                let last_day = if is_current && month == self.current_date.month() {
                    self.current_date.day()
                } else {
                    days_in_month(year, month)
                };
                MonthDays {
                    month,
                    days: (1..=last_day).collect(),
                }
            })
            .collect()
    }

    /// 以今天结尾的 days 天（升序）
    pub fn get_recent_days(&self, days: usize) -> Vec<NaiveDate> {
        recent_days(self.current_date, days)
    }

    pub fn get_iso_week_number(&self, date: NaiveDate) -> u32 {
        get_iso_week_number(date)
    }

    pub fn format_display_date(&self, date: NaiveDate) -> String {
        format_display_date(date)
    }
}

fn sum_field(records: &[Record], field: &str) -> f64 {
    records.iter().map(|record| record.get_f64(field)).sum()
}

fn daily(date: NaiveDate, sales: f64) -> DailySales {
    DailySales {
        date,
        date_str: format_canonical(date),
        sales,
    }
}

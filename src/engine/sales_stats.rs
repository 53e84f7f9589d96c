// ==========================================
// 电商运营数据表 - 销量统计
// ==========================================
// 职责: 按 年 / 月 / ISO 周 / 日 / 最近 N 天 汇总单个货号的销量
// 职责: 提供以“今天”为界的日历辅助（年份范围、月/周/日列表）
// 约定: 数据缺失返回空聚合（0、空列表或补 0 的日期序列），不返回 Err
// ==========================================

mod cache;
mod calendar;
mod service;


pub use calendar::{
    days_in_month, format_display_date, get_iso_week_number, last_week_of_year, recent_days,
    MonthDays, YearRange,
};
pub use service::{DailySales, SalesStatisticsService};

// ==========================================
// 电商运营数据表 - 日历辅助
// ==========================================
// ISO-8601 周: 周一为一周开始，包含 1 月 4 日的周为第 1 周
// 所有“截至今天”的范围都以构造统计服务时捕获的日期为准
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// 年份范围（前年 / 去年 / 今年）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub before_last: i32,
    pub last: i32,
    pub current: i32,
}

/// 某月及其日期列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDays {
    pub month: u32,
    pub days: Vec<u32>,
}

/// ISO 周序号（1–53）
pub fn get_iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// 一年中最后一个 ISO 周
///
/// 12 月 31 日可能已属于下一年第 1 周，此时取 12 月 24 日所在周
pub fn last_week_of_year(year: i32) -> u32 {
    let week_of = |day: u32| {
        NaiveDate::from_ymd_opt(year, 12, day)
            .map(get_iso_week_number)
            .unwrap_or(52)
    };
    match week_of(31) {
        1 => week_of(24),
        week => week,
    }
}

/// 当月天数
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// 以 today 结尾的连续 n 天（升序）
pub fn recent_days(today: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset as i64)))
        .collect()
}

/// 显示用日期: "M月D日"
pub fn format_display_date(date: NaiveDate) -> String {
    format!("{}月{}日", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_week_year_boundaries() {
        assert_eq!(get_iso_week_number(ymd(2021, 1, 1)), 53);
        assert_eq!(get_iso_week_number(ymd(2021, 1, 4)), 1);
        assert_eq!(get_iso_week_number(ymd(2020, 12, 31)), 53);
        assert_eq!(get_iso_week_number(ymd(2019, 12, 30)), 1);
    }

    #[test]
    fn test_last_week_of_year() {
        assert_eq!(last_week_of_year(2020), 53);
        // 2019-12-31 属于 2020 年第 1 周
        assert_eq!(last_week_of_year(2019), 52);
        assert_eq!(last_week_of_year(2024), 52);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
    }

    #[test]
    fn test_recent_days_cross_month() {
        let days = recent_days(ymd(2024, 3, 2), 3);
        assert_eq!(days, vec![ymd(2024, 2, 29), ymd(2024, 3, 1), ymd(2024, 3, 2)]);
        assert!(recent_days(ymd(2024, 3, 2), 0).is_empty());
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date(ymd(2024, 3, 5)), "3月5日");
        assert_eq!(format_display_date(ymd(2024, 12, 25)), "12月25日");
    }
}

// ==========================================
// 销量统计集成测试
// ==========================================
// 测试目标: 内存仓储与 SQLite 仓储上的统计结果一致
// ==========================================


use sales_sheet_ops::engine::SalesStatisticsService;
use sales_sheet_ops::repository::Repository;
use std::sync::Arc;
use test_helpers::*;

fn seed(repo: &dyn Repository) {
    seed_sales(
        repo,
        &[
            ("X", date(2024, 3, 15), 5.0),
            ("X", date(2024, 3, 18), 2.0),
            ("X", date(2024, 3, 20), 4.0),
            ("X", date(2024, 2, 29), 7.0),
            ("X", date(2023, 12, 31), 9.0),
            ("Y", date(2024, 3, 18), 100.0),
        ],
    );
}

fn check_statistics(repo: Arc<dyn Repository>) {
    let stats = SalesStatisticsService::with_current_date(repo, test_today());

    assert_eq!(stats.get_month_sales("X", 2024, 3, None).unwrap(), 11.0);
    assert_eq!(stats.get_month_sales("X", 2024, 2, None).unwrap(), 7.0);
    assert_eq!(stats.get_year_total_sales("X", 2024, None).unwrap(), 18.0);
    assert_eq!(stats.get_year_total_sales("X", 2023, None).unwrap(), 9.0);

    // 2024-03-18 与 2024-03-20 同属 ISO 第 12 周
    assert_eq!(stats.get_week_sales("X", 2024, 12, None).unwrap(), 6.0);
    // 2023-12-31 属 ISO 2023 年第 52 周
    assert_eq!(stats.get_week_sales("X", 2023, 52, None).unwrap(), 9.0);

    assert_eq!(stats.get_day_sales("X", date(2024, 3, 15), None).unwrap(), 5.0);
    assert_eq!(stats.get_day_sales("X", date(2024, 3, 14), None).unwrap(), 0.0);
    assert_eq!(stats.get_day_sales("  ", date(2024, 3, 15), None).unwrap(), 0.0);

    assert_eq!(stats.get_last_n_days_sum("X", 2, None).unwrap(), 6.0);
    assert_eq!(stats.get_last_n_days_sum("X", 5, None).unwrap(), 11.0);
    assert_eq!(stats.get_last_n_days_sum("X", 0, None).unwrap(), 4.0);

    let series = stats.get_last_n_days_daily_sales("X", 7).unwrap();
    let sales: Vec<f64> = series.iter().map(|d| d.sales).collect();
    assert_eq!(sales, vec![0.0, 5.0, 0.0, 0.0, 2.0, 0.0, 4.0]);
    assert_eq!(series[0].date, date(2024, 3, 14));
    assert_eq!(series[6].date, test_today());

    // 单日合计等于月合计
    let march_days: f64 = (1..=31)
        .map(|d| stats.get_day_sales("X", date(2024, 3, d), None).unwrap())
        .sum();
    assert_eq!(march_days, stats.get_month_sales("X", 2024, 3, None).unwrap());
}

#[test]
fn test_statistics_on_memory_repository() {
    let repo = memory_repo();
    seed(repo.as_ref());
    check_statistics(repo);
}

#[test]
fn test_statistics_on_sqlite_repository() {
    let (_dir, db_path) = create_test_db();
    let repo = sqlite_repo(&db_path);
    seed(repo.as_ref());
    check_statistics(repo);
}

#[test]
fn test_cache_serves_stale_until_refresh() {
    let (_dir, db_path) = create_test_db();
    let repo = sqlite_repo(&db_path);
    seed(repo.as_ref());
    let stats = SalesStatisticsService::with_current_date(repo.clone(), test_today()).with_cache();

    assert_eq!(stats.get_day_sales("X", date(2024, 3, 18), None).unwrap(), 2.0);
    assert!(stats.cache_loaded());

    seed_sales(repo.as_ref(), &[("X", date(2024, 3, 18), 12.0)]);
    assert_eq!(stats.get_day_sales("X", date(2024, 3, 18), None).unwrap(), 2.0);

    stats.refresh_cache().unwrap();
    assert!(!stats.cache_loaded());
    assert_eq!(stats.get_day_sales("X", date(2024, 3, 18), None).unwrap(), 12.0);
}

#[test]
fn test_calendar_helpers_follow_captured_date() {
    let stats = SalesStatisticsService::with_current_date(memory_repo(), date(2024, 5, 10));

    assert_eq!(stats.get_months_of_year(2024), (1..=5).collect::<Vec<u32>>());
    assert_eq!(stats.get_months_of_year(2023), (1..=12).collect::<Vec<u32>>());
    let range = stats.get_year_range();
    assert_eq!((range.before_last, range.last, range.current), (2022, 2023, 2024));

    assert_eq!(stats.get_weeks_of_year(2024).len(), 19);
    assert_eq!(stats.get_weeks_of_year(2020).len(), 53);
    let days = stats.get_days_of_year(2024);
    assert_eq!(days.len(), 5);
    assert_eq!(days[1].days.len(), 29);
    assert_eq!(days[4].days.len(), 10);
    assert_eq!(stats.format_display_date(date(2024, 5, 1)), "5月1日");
}

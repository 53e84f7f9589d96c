// ==========================================
// 电商运营数据表 - 命令行入口
// ==========================================
// 用法:
//   sales-sheet-ops import <文件>...      导入文件中的全部工作表
//   sales-sheet-ops stats <货号> [天数]    近期每日销量、本月与本年合计
//   sales-sheet-ops rebase                 以今天重算销售距今天数
//   sales-sheet-ops batches                列出导入批次
// 环境变量:
//   SALES_SHEET_OPS_DB_PATH   数据库路径
//   SALES_SHEET_OPS_LOG_JSON  非空时日志以 JSON 行输出
// ==========================================

use anyhow::{bail, Context};
use chrono::{Datelike, Local};
use sales_sheet_ops::app::AppState;
use sales_sheet_ops::{logging, APP_NAME, VERSION};

fn main() -> anyhow::Result<()> {
    if std::env::var("SALES_SHEET_OPS_LOG_JSON").is_ok_and(|v| !v.trim().is_empty()) {
        logging::init_json();
    } else {
        logging::init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "import" => run_import(rest),
        "stats" => run_stats(rest),
        "rebase" => run_rebase(),
        "batches" => run_batches(),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("未知命令: {}", other)
        }
    }
}

fn print_usage() {
    println!("{} v{}", APP_NAME, VERSION);
    println!();
    println!("用法:");
    println!("  sales-sheet-ops import <文件>...");
    println!("  sales-sheet-ops stats <货号> [天数]");
    println!("  sales-sheet-ops rebase");
    println!("  sales-sheet-ops batches");
}

fn run_import(files: &[String]) -> anyhow::Result<()> {
    if files.is_empty() {
        bail!("请指定要导入的文件");
    }

    let state = AppState::open_default()?;
    let importer = state.importer()?;

    let mut rejected = 0usize;
    for file in files {
        let reports = importer
            .import_file(file)
            .with_context(|| format!("导入文件失败: {}", file))?;

        for report in reports {
            let batch = &report.batch;
            println!(
                "[{}] {} / {} → {}（{} 行，写入 {} 条）",
                batch.status,
                file,
                batch.sheet_name,
                batch.entity.as_deref().unwrap_or("未识别"),
                batch.total_rows,
                batch.written_rows
            );
            if let Some(error_report) = &report.error_report {
                rejected += 1;
                println!("{}", error_report);
            }
        }
    }

    if rejected > 0 {
        bail!("{} 张工作表校验失败，未导入", rejected);
    }
    Ok(())
}

fn run_stats(args: &[String]) -> anyhow::Result<()> {
    let Some(item_number) = args.first() else {
        bail!("请指定货号");
    };

    let state = AppState::open_default()?;
    let days = match args.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("天数格式错误: {}", raw))?,
        None => state.config.get_recent_days()?,
    };

    let stats = state.sales_statistics();
    let today = stats.current_date();

    println!("货号 {} 近 {} 天销量:", item_number, days);
    for day in stats.get_last_n_days_daily_sales(item_number, days)? {
        println!("  {}  {}", day.date_str, day.sales);
    }

    let month_total = stats.get_month_sales(item_number, today.year(), today.month(), None)?;
    let year_total = stats.get_year_total_sales(item_number, today.year(), None)?;
    println!("本月合计: {}", month_total);
    println!("本年合计: {}", year_total);
    Ok(())
}

fn run_rebase() -> anyhow::Result<()> {
    let state = AppState::open_default()?;
    let updated = state
        .importer()?
        .rebase_sales_days(Local::now().date_naive())?;
    println!("已重算 {} 条销售记录", updated);
    Ok(())
}

fn run_batches() -> anyhow::Result<()> {
    let state = AppState::open_default()?;
    for batch in state.repository.list_batches()? {
        println!(
            "{}  {}  {}  {}  {}  共 {} 行 / 无效 {} / 写入 {}",
            batch.imported_at.format("%Y-%m-%d %H:%M:%S"),
            batch.batch_id,
            batch.status,
            batch.sheet_name,
            batch.entity.as_deref().unwrap_or("-"),
            batch.total_rows,
            batch.invalid_rows,
            batch.written_rows
        );
    }
    Ok(())
}

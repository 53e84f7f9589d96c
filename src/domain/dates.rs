// ==========================================
// 电商运营数据表 - 日期解析与规范化
// ==========================================
// 规范字符串形式: YYYY-MM-DD
// 表格文本标记: 单个前导撇号（'2024-03-15）在解析前去除
// ==========================================

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// 规范日期格式
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// 表格日期序列号的上限（9999-12-31）
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

/// 去除单个前导撇号
pub fn strip_text_marker(s: &str) -> &str {
    s.strip_prefix('\'').unwrap_or(s)
}

/// 解析日期字符串（支持常见日期/日期时间格式）
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = strip_text_marker(raw.trim()).trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// 表格日期序列号（1899-12-30 起算的天数）
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DAYS {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// 单元格值 → 日期
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n.as_f64().and_then(date_from_serial),
        _ => None,
    }
}

/// 日期 → YYYY-MM-DD
pub fn format_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

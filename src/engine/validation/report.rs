use super::BatchValidation;
use std::fmt::Write;

/// 批次错误报告
///
/// ```text
/// 【{实体}】数据验证失败：
///
/// 第{行号}行：
///   【{字段标题}】{原因}
/// ```
pub fn format_batch_errors(batch: &BatchValidation, entity_name: &str) -> Option<String> {
    if batch.valid {
        return None;
    }

    let mut report = format!("【{}】数据验证失败：\n", entity_name);
    for item in batch.invalid_items() {
        let _ = write!(report, "\n第{}行：\n", item.row_number());
        for message in item.result.messages() {
            let _ = writeln!(report, "  {}", message);
        }
    }
    Some(report)
}

// ==========================================
// 电商运营数据表 - 内置校验规则
// ==========================================
// 约定: 除 required 外，所有规则对空值直接放行
// ==========================================

use crate::domain::dates::parse_date_value;
use crate::domain::record::{format_number, is_empty_value, value_to_f64, value_to_string};
use crate::domain::schema::ValidatorParams;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ==========================================
// RuleOutcome - 单条规则结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// 自定义规则: (值, 参数) → 结果
pub type CustomRule = Arc<dyn Fn(Option<&Value>, &ValidatorParams) -> RuleOutcome + Send + Sync>;

// ==========================================
// RegexCache - 已编译正则（按模式文本缓存，无效模式记为 None）
// ==========================================
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: RwLock<HashMap<String, Option<Regex>>>,
}

impl RegexCache {
    pub fn get(&self, pattern: &str) -> Option<Regex> {
        if let Ok(compiled) = self.compiled.read() {
            if let Some(re) = compiled.get(pattern) {
                return re.clone();
            }
        }

        let re = Regex::new(pattern).ok();
        if let Ok(mut compiled) = self.compiled.write() {
            compiled.insert(pattern.to_string(), re.clone());
        }
        re
    }

    pub fn len(&self) -> usize {
        self.compiled.read().map_or(0, |compiled| compiled.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// BuiltinRule - 内置规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinRule {
    Required,
    Enum,
    Pattern,
    Range,
    NonNegative,
    Positive,
    Number,
    Date,
}

const MSG_REQUIRED: &str = "不能为空";
const MSG_NOT_NUMBER: &str = "必须是数字";
const MSG_NEGATIVE: &str = "不能为负数";
const MSG_NOT_POSITIVE: &str = "必须大于0";
const MSG_BAD_DATE: &str = "日期格式不正确";
const MSG_BAD_PATTERN: &str = "格式不正确";
const MSG_BAD_REGEX: &str = "校验规则配置错误: 无效的正则表达式";

impl BuiltinRule {
    pub const ALL: [BuiltinRule; 8] = [
        BuiltinRule::Required,
        BuiltinRule::Enum,
        BuiltinRule::Pattern,
        BuiltinRule::Range,
        BuiltinRule::NonNegative,
        BuiltinRule::Positive,
        BuiltinRule::Number,
        BuiltinRule::Date,
    ];

    pub fn from_type(rule_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.as_str() == rule_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinRule::Required => "required",
            BuiltinRule::Enum => "enum",
            BuiltinRule::Pattern => "pattern",
            BuiltinRule::Range => "range",
            BuiltinRule::NonNegative => "nonNegative",
            BuiltinRule::Positive => "positive",
            BuiltinRule::Number => "number",
            BuiltinRule::Date => "date",
        }
    }

    /// 执行规则，返回未加字段前缀的失败原因
    pub fn evaluate(
        &self,
        value: Option<&Value>,
        params: &ValidatorParams,
        regexes: &RegexCache,
    ) -> RuleOutcome {
        let empty = is_empty_value(value);
        let fail = |default: String| RuleOutcome::fail(params.message.clone().unwrap_or(default));

        if *self == BuiltinRule::Required {
            return if empty {
                fail(MSG_REQUIRED.to_string())
            } else {
                RuleOutcome::pass()
            };
        }

        let value = match value {
            Some(v) if !empty => v,
            _ => return RuleOutcome::pass(),
        };

        match self {
            BuiltinRule::Required => RuleOutcome::pass(),
            BuiltinRule::Enum => {
                let Some(allowed) = &params.values else {
                    return RuleOutcome::pass();
                };
                let text = value_to_string(value);
                if allowed.iter().any(|v| v == value || value_to_string(v) == text) {
                    RuleOutcome::pass()
                } else {
                    let options: Vec<String> = allowed.iter().map(value_to_string).collect();
                    fail(format!("必须是以下值之一：{}", options.join("、")))
                }
            }
            BuiltinRule::Pattern => {
                let Some(pattern) = &params.regex else {
                    return RuleOutcome::pass();
                };
                match regexes.get(pattern) {
                    Some(re) if re.is_match(&value_to_string(value)) => RuleOutcome::pass(),
                    Some(_) => fail(match &params.description {
                        Some(desc) => format!("{}，应为{}", MSG_BAD_PATTERN, desc),
                        None => MSG_BAD_PATTERN.to_string(),
                    }),
                    None => RuleOutcome::fail(MSG_BAD_REGEX),
                }
            }
            BuiltinRule::Range => match value_to_f64(value) {
                None => fail(MSG_NOT_NUMBER.to_string()),
                Some(n) => {
                    let below = params.min.is_some_and(|min| n < min);
                    let above = params.max.is_some_and(|max| n > max);
                    if !below && !above {
                        return RuleOutcome::pass();
                    }
                    fail(match (params.min, params.max) {
                        (Some(min), Some(max)) => {
                            format!("必须在{}到{}之间", format_number(min), format_number(max))
                        }
                        (Some(min), None) => format!("不能小于{}", format_number(min)),
                        (None, Some(max)) => format!("不能大于{}", format_number(max)),
                        (None, None) => "超出范围".to_string(),
                    })
                }
            },
            BuiltinRule::NonNegative => match value_to_f64(value) {
                None => fail(MSG_NOT_NUMBER.to_string()),
                Some(n) if n >= 0.0 => RuleOutcome::pass(),
                Some(_) => fail(MSG_NEGATIVE.to_string()),
            },
            BuiltinRule::Positive => match value_to_f64(value) {
                None => fail(MSG_NOT_NUMBER.to_string()),
                Some(n) if n > 0.0 => RuleOutcome::pass(),
                Some(_) => fail(MSG_NOT_POSITIVE.to_string()),
            },
            BuiltinRule::Number => match value_to_f64(value) {
                Some(_) => RuleOutcome::pass(),
                None => fail(MSG_NOT_NUMBER.to_string()),
            },
            BuiltinRule::Date => match parse_date_value(value) {
                Some(_) => RuleOutcome::pass(),
                None => fail(MSG_BAD_DATE.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regex_cache_compiles_once_per_pattern() {
        let cache = RegexCache::default();
        let params = ValidatorParams {
            regex: Some("^A\\d+$".to_string()),
            ..ValidatorParams::default()
        };

        assert!(BuiltinRule::Pattern.evaluate(Some(&json!("A1")), &params, &cache).valid);
        assert!(!BuiltinRule::Pattern.evaluate(Some(&json!("B1")), &params, &cache).valid);
        assert_eq!(cache.len(), 1);

        // 无效模式同样只记录一次
        assert!(cache.get("([").is_none());
        assert!(cache.get("([").is_none());
        assert_eq!(cache.len(), 2);
    }
}

use super::report::format_batch_errors;
use super::rules::{BuiltinRule, CustomRule, RegexCache, RuleOutcome};
use super::{
    BatchSummary, BatchValidation, EntityValidation, FieldValidation, ItemValidation,
    ValidationContext,
};
use crate::domain::record::{is_empty_value, normalize_value, value_to_string, EntityRow};
use crate::domain::types::FieldType;
use crate::domain::schema::{EntitySchema, FieldSpec, ValidatorConfig, ValidatorParams};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const REQUIRED_RULE: &str = "required";

// ==========================================
// ValidationEngine - 校验引擎
// ==========================================
/// 内置规则为枚举；自定义规则按名称注册，同名时覆盖内置规则。
/// 未知规则类型一律放行（新规则可先写入配置，旧引擎不受影响）。
#[derive(Clone, Default)]
pub struct ValidationEngine {
    custom_rules: HashMap<String, CustomRule>,
    regexes: Arc<RegexCache>,
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom_rules.keys().collect();
        names.sort();
        f.debug_struct("ValidationEngine")
            .field("custom_rules", &names)
            .finish()
    }
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册自定义规则（仅在初始化阶段调用）
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(Option<&Value>, &ValidatorParams) -> RuleOutcome + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(rule = %name, "注册自定义校验规则");
        self.custom_rules.insert(name, Arc::new(rule));
    }

    /// 内置或已注册的规则
    pub fn has_rule(&self, name: &str) -> bool {
        self.custom_rules.contains_key(name) || BuiltinRule::from_type(name).is_some()
    }

    /// 校验单个值；失败信息格式为 `【{字段标题}】{原因}`
    pub fn validate_value(
        &self,
        value: Option<&Value>,
        config: &ValidatorConfig,
        field_title: &str,
    ) -> RuleOutcome {
        let outcome = if let Some(rule) = self.custom_rules.get(&config.rule_type) {
            rule(value, &config.params)
        } else if let Some(rule) = BuiltinRule::from_type(&config.rule_type) {
            rule.evaluate(value, &config.params, &self.regexes)
        } else {
            RuleOutcome::pass()
        };

        if outcome.valid {
            return RuleOutcome::pass();
        }
        let reason = outcome
            .message
            .or_else(|| config.params.message.clone())
            .unwrap_or_else(|| "校验失败".to_string());
        RuleOutcome::fail(format!("【{}】{}", field_title, reason))
    }

    /// 按声明顺序执行字段规则并收集全部失败信息
    ///
    /// 空值只执行 required，其余规则跳过
    pub fn validate_field(
        &self,
        value: Option<&Value>,
        field: &FieldSpec,
        field_name: &str,
    ) -> FieldValidation {
        let title = if field.title.is_empty() {
            field_name
        } else {
            field.title.as_str()
        };
        let empty = is_empty_value(value);

        let errors: Vec<String> = field
            .validators
            .iter()
            .filter(|cfg| !empty || cfg.rule_type == REQUIRED_RULE)
            .filter_map(|cfg| self.validate_value(value, cfg, title).message)
            .collect();

        FieldValidation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// 校验单个实体（computed 字段跳过；提供 all_data 时检查唯一键）
    pub fn validate_entity(
        &self,
        entity: &EntityRow,
        schema: &EntitySchema,
        context: &ValidationContext<'_>,
    ) -> EntityValidation {
        let mut errors: IndexMap<String, Vec<String>> = IndexMap::new();

        for (name, spec) in &schema.fields {
            if spec.is_computed() {
                continue;
            }
            let result = self.validate_field(entity.get(name), spec, name);
            if !result.valid {
                errors.insert(name.clone(), result.errors);
            }
        }

        if let (Some(key), Some(all_data)) = (&schema.unique_key, context.all_data) {
            if let Some(message) = duplicate_message(entity, key, schema, all_data, context.position) {
                errors.entry(key.clone()).or_default().push(message);
            }
        }

        EntityValidation {
            valid: errors.is_empty(),
            errors,
            row_number: entity.row_number,
        }
    }

    /// 批量校验；结果顺序与输入一致
    pub fn validate_all(&self, entities: &[EntityRow], schema: &EntitySchema) -> BatchValidation {
        let items: Vec<ItemValidation> = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let context = ValidationContext::with_all_data(entities).at(index);
                ItemValidation {
                    result: self.validate_entity(entity, schema, &context),
                    data: entity.clone(),
                    index,
                }
            })
            .collect();

        let valid_count = items.iter().filter(|item| item.valid()).count();
        let summary = BatchSummary {
            total: items.len(),
            valid: valid_count,
            invalid: items.len() - valid_count,
        };
        debug!(
            entity = %schema.name,
            total = summary.total,
            invalid = summary.invalid,
            "批次校验完成"
        );

        BatchValidation {
            valid: summary.invalid == 0,
            items,
            summary,
        }
    }

    /// 生成面向用户的错误报告；全部通过时返回 None
    pub fn format_errors(&self, batch: &BatchValidation, entity_name: &str) -> Option<String> {
        format_batch_errors(batch, entity_name)
    }
}

/// 唯一键重复检查；跳过自身（按位置，或同一引用）
///
/// 键值按入库时的规范形式比较（去空白、数值与日期统一），
/// 规范化后相同的两行在写入时会互相覆盖
fn duplicate_message(
    entity: &EntityRow,
    key: &str,
    schema: &EntitySchema,
    all_data: &[EntityRow],
    position: Option<usize>,
) -> Option<String> {
    let field_type = schema
        .field_spec(key)
        .map_or(FieldType::String, |spec| spec.field_type);
    let key_text = |row: &EntityRow| {
        row.get(key)
            .and_then(|v| normalize_value(field_type, v))
            .map(|v| value_to_string(&v))
    };
    let text = key_text(entity)?;

    let duplicated = all_data.iter().enumerate().any(|(i, other)| {
        if position == Some(i) || std::ptr::eq(other, entity) {
            return false;
        }
        key_text(other).is_some_and(|other_text| other_text == text)
    });

    duplicated.then(|| format!("【{}】值\"{}\"已存在", schema.field_title(key), text))
}

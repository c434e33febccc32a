// ==========================================
// 门窗车间工时定额计算系统 - 模板规则检查
// ==========================================
// 职责: 保存模板时找出永远不会生效的规则（疑似录入错误）
// 说明: 仅产出告警，不改变规则引擎的宽松匹配行为
// ==========================================

use crate::domain::context::NormContext;
use crate::domain::template::{ConditionValue, Template};
use crate::domain::types::{ProductType, RuleMode};
use crate::engine::rules::{condition_field, unit_field, FieldValue};
use serde::Serialize;
use std::fmt;

/// 告警类型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleWarningKind {
    /// 规则绑定的工序不在模板中
    UnknownOperation,
    /// 条件字段未登记
    UnknownConditionField { field: String },
    /// 条件期望值与字段类型不符
    MismatchedConditionValue { field: String },
    /// 单位字段未登记（单位数量恒为 0）
    UnknownUnitField { field: String },
    /// 未识别的模式
    UnknownMode,
}

/// 规则告警
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleWarning {
    pub rule_index: usize,
    pub operation: String,
    #[serde(flatten)]
    pub kind: RuleWarningKind,
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "规则#{} (operation={}): ", self.rule_index, self.operation)?;
        match &self.kind {
            RuleWarningKind::UnknownOperation => write!(f, "模板中不存在该工序"),
            RuleWarningKind::UnknownConditionField { field } => {
                write!(f, "未知的条件字段 {}", field)
            }
            RuleWarningKind::MismatchedConditionValue { field } => {
                write!(f, "条件字段 {} 的期望值类型不符", field)
            }
            RuleWarningKind::UnknownUnitField { field } => write!(f, "未知的单位字段 '{}'", field),
            RuleWarningKind::UnknownMode => write!(f, "未识别的规则模式"),
        }
    }
}

/// 检查模板中的规则
pub fn lint_rules(template: &Template) -> Vec<RuleWarning> {
    // 只用于判断字段是否登记及其类型
    let sample_ctx = NormContext::new(ProductType::Door);
    let mut warnings = Vec::new();

    for (rule_index, rule) in template.rules.iter().enumerate() {
        let mut push = |kind: RuleWarningKind| {
            warnings.push(RuleWarning {
                rule_index,
                operation: rule.operation.clone(),
                kind,
            })
        };

        if template.operation(&rule.operation).is_none() {
            push(RuleWarningKind::UnknownOperation);
        }

        if rule.mode == RuleMode::Unknown {
            push(RuleWarningKind::UnknownMode);
        }

        for (field, expected) in &rule.condition {
            match (condition_field(&sample_ctx, field), expected) {
                (None, _) => push(RuleWarningKind::UnknownConditionField {
                    field: field.clone(),
                }),
                (Some(FieldValue::Flag(_)), ConditionValue::Flag(_))
                | (Some(FieldValue::Number(_)), ConditionValue::Exact(_))
                | (Some(FieldValue::Number(_)), ConditionValue::Range { .. }) => {}
                _ => push(RuleWarningKind::MismatchedConditionValue {
                    field: field.clone(),
                }),
            }
        }

        if rule.mode.uses_unit_field() && unit_field(&sample_ctx, &rule.unit_field, 1).is_none() {
            push(RuleWarningKind::UnknownUnitField {
                field: rule.unit_field.clone(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{Operation, Rule};

    fn template(rules: Vec<Rule>) -> Template {
        Template {
            id: 1,
            code: "56".to_string(),
            name: "Дверь".to_string(),
            category: String::new(),
            systema: None,
            type_izd: Some("door".to_string()),
            profile: None,
            operations: vec![Operation::new("адаптер", 0.0, 9.0, 1.0)],
            rules,
            is_active: true,
            head_name: None,
        }
    }

    #[test]
    fn test_clean_template_has_no_warnings() {
        let t = template(vec![Rule::new("адаптер", RuleMode::AdditivePlusMultiplied)
            .when("HasPetliRDRH", ConditionValue::Flag(true))
            .unit("ItemCountForRDRH")
            .per_unit(0.0, 4.5)]);

        assert!(lint_rules(&t).is_empty());
    }

    #[test]
    fn test_reports_typos() {
        let t = template(vec![
            Rule::new("адаптр", RuleMode::Additive),
            Rule::new("адаптер", RuleMode::Multiplied)
                .when("HasPetliRDRX", ConditionValue::Flag(true))
                .when("PetliRDRH", ConditionValue::Flag(true))
                .unit("ItemCount"),
        ]);

        let kinds: Vec<RuleWarningKind> = lint_rules(&t).into_iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RuleWarningKind::UnknownOperation,
                RuleWarningKind::UnknownConditionField {
                    field: "HasPetliRDRX".to_string()
                },
                RuleWarningKind::MismatchedConditionValue {
                    field: "PetliRDRH".to_string()
                },
                RuleWarningKind::UnknownUnitField {
                    field: "ItemCount".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_set_mode_does_not_need_unit_field() {
        let t = template(vec![Rule::new("адаптер", RuleMode::Set).set_to(1.0, 1.0)]);
        assert!(lint_rules(&t).is_empty());
    }
}

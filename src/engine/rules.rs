// ==========================================
// 门窗车间工时定额计算系统 - 规则引擎
// ==========================================
// 两遍计算:
//   1. 基础放大: 非 ign 分组的工序 value/minutes/count × 件数
//   2. 规则应用: 按规则列表顺序，条件全部满足即按模式调整（不短路）
// 红线: 输出工序列表与模板工序列表长度、顺序一致
// 说明: 未知字段 → 条件不匹配 / 单位数量为 0，不报错
// ==========================================

use crate::domain::context::NormContext;
use crate::domain::template::{Condition, ConditionValue, Operation, Rule, IGNORE_GROUP};
use crate::domain::types::RuleMode;
use tracing::trace;

// ==========================================
// 上下文字段访问表
// ==========================================

/// 条件字段的取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
}

/// 条件字段名 → 上下文取值（未登记的字段返回 None）
pub fn condition_field(ctx: &NormContext, name: &str) -> Option<FieldValue> {
    use FieldValue::{Flag, Number};

    let value = match name {
        "HasImpost" => Flag(ctx.has_impost),
        "HasPetliRDRH" => Flag(ctx.has_rdrh_hinges),
        "HasPritvorKP40" => Flag(ctx.has_kp40_rebate),
        "HasPetliFural" => Flag(ctx.has_reinforced_hinges),
        "StublinaCount" => Number(ctx.cylinder_cover_count),
        "StvTCount600" => Number(ctx.narrow_sash_615),
        "StvTCount400" => Number(ctx.narrow_sash_400),
        "MnogozapZamok" => Number(ctx.multipoint_locks),
        "StandZamok" => Number(ctx.standard_locks),
        "PetliRolik" => Number(ctx.roller_hinges),
        "PetliStand" => Number(ctx.standard_hinges),
        "Petli3Section" => Number(ctx.three_section_hinges),
        "PritvorKP40" => Number(ctx.kp40_rebates),
        "PetliFural" => Number(ctx.reinforced_hinges),
        "PetliRDRH" => Number(ctx.rdrh_hinges),
        "StvWindowCount" => Number(ctx.window_sash_count),
        "TagCountWin" => Number(ctx.window_rods),
        "PetliForNaveshCount" => Number(ctx.mountable_hinges),
        _ => return None,
    };

    Some(value)
}

/// 单位字段名 → 单位数量（未登记的字段返回 None）
///
/// - 多数字段直接取上下文计数
/// - ItemCountForRDRH: 存在 RDRH 合页时取件数，否则 0
/// - HasPritvorKP40: 无条件取件数（适用性由规则条件控制）
pub fn unit_field(ctx: &NormContext, name: &str, item_count: u32) -> Option<f64> {
    let items = f64::from(item_count);

    let value = match name {
        "HasImpostCount" => ctx.impost_count,
        "StvTCount600" => ctx.narrow_sash_615,
        "StvTCount400" => ctx.narrow_sash_400,
        "MnogozapZamok" => ctx.multipoint_locks,
        "StandZamok" => ctx.standard_locks,
        "PetliRolik" => ctx.roller_hinges,
        "PetliStand" => ctx.standard_hinges,
        "Petli3Section" => ctx.three_section_hinges,
        "StublinaCount" => ctx.cylinder_cover_count,
        "PritvorKP40" => ctx.kp40_rebates,
        "PetliFural" => ctx.reinforced_hinges,
        "PetliRDRH" => ctx.rdrh_hinges,
        "StvWindowCount" => ctx.window_sash_count,
        "TagCountWin" => ctx.window_rods,
        "PetliForNaveshCount" => ctx.mountable_hinges,
        "HasPritvorKP40" => items,
        "ItemCountForRDRH" => {
            if ctx.has_rdrh_hinges {
                items
            } else {
                0.0
            }
        }
        _ => return None,
    };

    Some(value)
}

/// 解析单位数量（未知字段为 0）
pub fn resolve_unit_field(ctx: &NormContext, name: &str, item_count: u32) -> f64 {
    unit_field(ctx, name, item_count).unwrap_or(0.0)
}

// ==========================================
// 条件匹配
// ==========================================

/// 条件全部满足时返回 true（空条件恒为 true）
pub fn matches_condition(condition: &Condition, ctx: &NormContext) -> bool {
    condition
        .iter()
        .all(|(field, expected)| field_matches(field, expected, ctx))
}

/// 单个字段匹配
pub fn field_matches(field: &str, expected: &ConditionValue, ctx: &NormContext) -> bool {
    match (condition_field(ctx, field), expected) {
        (Some(FieldValue::Flag(actual)), ConditionValue::Flag(want)) => actual == *want,
        (Some(FieldValue::Number(actual)), ConditionValue::Exact(want)) => actual == *want,
        (Some(FieldValue::Number(actual)), ConditionValue::Range { min, max }) => {
            min.map_or(true, |lo| actual >= lo) && max.map_or(true, |hi| actual <= hi)
        }
        _ => false,
    }
}

// ==========================================
// RuleEvaluator - 规则引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    ignore_group: String,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(IGNORE_GROUP)
    }
}

impl RuleEvaluator {
    /// # 参数
    /// - ignore_group: 不随件数放大的工序分组标记
    pub fn new(ignore_group: impl Into<String>) -> Self {
        Self {
            ignore_group: ignore_group.into(),
        }
    }

    pub fn ignore_group(&self) -> &str {
        &self.ignore_group
    }

    /// 对模板工序应用规则，返回新的工序列表（不修改输入）
    ///
    /// # 参数
    /// - operations: 模板基础工序
    /// - rules: 模板规则（按列表顺序应用）
    /// - ctx: 计算上下文
    /// - item_count: 订单行的实物件数
    pub fn apply(
        &self,
        operations: &[Operation],
        rules: &[Rule],
        ctx: &NormContext,
        item_count: u32,
    ) -> Vec<Operation> {
        let items = f64::from(item_count);
        let mut result = operations.to_vec();

        for op in result.iter_mut() {
            if op.group != self.ignore_group {
                op.value *= items;
                op.minutes *= items;
                op.count *= items;
            }
        }

        for op in result.iter_mut() {
            for rule in rules {
                if rule.operation != op.name || !matches_condition(&rule.condition, ctx) {
                    continue;
                }

                trace!(operation = %op.name, mode = %rule.mode, "规则命中");
                apply_rule(op, rule, ctx, item_count);
            }
        }

        result
    }
}

fn apply_rule(op: &mut Operation, rule: &Rule, ctx: &NormContext, item_count: u32) {
    match rule.mode {
        RuleMode::Set => {
            op.value = rule.set_value;
            op.minutes = rule.set_minutes;
        }
        RuleMode::Multiplied => {
            let units = resolve_unit_field(ctx, &rule.unit_field, item_count);
            op.value = rule.value_per_unit * units;
            op.minutes = rule.minutes_per_unit * units;
            op.count = units;
        }
        RuleMode::Additive => {
            op.value += rule.value_per_unit;
            op.minutes += rule.minutes_per_unit;
        }
        RuleMode::AdditivePlusMultiplied => {
            let units = resolve_unit_field(ctx, &rule.unit_field, item_count);
            op.value += rule.value_per_unit * units;
            op.minutes += rule.minutes_per_unit * units;
            op.count += units;
        }
        RuleMode::Minus => {
            op.value -= rule.value_per_unit;
            op.minutes -= rule.minutes_per_unit;
        }
        RuleMode::Unknown => {}
    }
}

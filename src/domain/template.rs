// ==========================================
// 门窗车间工时定额计算系统 - 定额模板领域模型
// ==========================================
// 模板 = 有序基础工序 + 条件调整规则
// JSON 字段名与模板表 (dem_templates_al) 中存储的格式保持一致
// ==========================================

use crate::domain::types::RuleMode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 不随件数放大的工序分组标记
pub const IGNORE_GROUP: &str = "ign";

// ==========================================
// Operation - 工序
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub count: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: f64, // 计价单位
    #[serde(default)]
    pub minutes: f64, // 工时（分钟）
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub group: String,
}

impl Operation {
    /// 以名称、工时、数量构造工序（其余字段为空）
    pub fn new(name: impl Into<String>, value: f64, minutes: f64, count: f64) -> Self {
        Self {
            name: name.into(),
            kind: String::new(),
            count,
            label: String::new(),
            value,
            minutes,
            required: false,
            group: String::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

// ==========================================
// ConditionValue - 条件期望值
// ==========================================
// 布尔字面量 | 数值字面量 | {min?, max?} 闭区间
// 任意 JSON 对象都按区间读取，非数值的边界视为不限
// 其他 JSON 形态保留为 Unsupported，永不匹配
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Flag(bool),
    Exact(f64),
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Unsupported(Value),
}

impl From<Value> for ConditionValue {
    fn from(raw: Value) -> Self {
        match raw {
            Value::Bool(flag) => ConditionValue::Flag(flag),
            Value::Number(n) => match n.as_f64() {
                Some(v) => ConditionValue::Exact(v),
                None => ConditionValue::Unsupported(Value::Number(n)),
            },
            Value::Object(bounds) => ConditionValue::Range {
                min: bounds.get("min").and_then(Value::as_f64),
                max: bounds.get("max").and_then(Value::as_f64),
            },
            other => ConditionValue::Unsupported(other),
        }
    }
}

impl<'de> Deserialize<'de> for ConditionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ConditionValue::from)
    }
}

impl ConditionValue {
    pub fn at_least(min: f64) -> Self {
        ConditionValue::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        ConditionValue::Range {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// 规则条件：上下文字段名 → 期望值（全部满足才匹配）
pub type Condition = BTreeMap<String, ConditionValue>;

// ==========================================
// Rule - 条件调整规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub operation: String,
    #[serde(default)]
    pub condition: Condition,
    pub mode: RuleMode,

    #[serde(rename = "value", default)]
    pub set_value: f64,
    #[serde(rename = "minutes", default)]
    pub set_minutes: f64,
    #[serde(default)]
    pub value_per_unit: f64,
    #[serde(default)]
    pub minutes_per_unit: f64,

    #[serde(rename = "unitField", default, skip_serializing_if = "String::is_empty")]
    pub unit_field: String,
}

impl Rule {
    /// 构造无条件、数值为零的规则
    pub fn new(operation: impl Into<String>, mode: RuleMode) -> Self {
        Self {
            operation: operation.into(),
            condition: Condition::new(),
            mode,
            set_value: 0.0,
            set_minutes: 0.0,
            value_per_unit: 0.0,
            minutes_per_unit: 0.0,
            unit_field: String::new(),
        }
    }

    pub fn when(mut self, field: impl Into<String>, expected: ConditionValue) -> Self {
        self.condition.insert(field.into(), expected);
        self
    }

    pub fn per_unit(mut self, value: f64, minutes: f64) -> Self {
        self.value_per_unit = value;
        self.minutes_per_unit = minutes;
        self
    }

    pub fn set_to(mut self, value: f64, minutes: f64) -> Self {
        self.set_value = value;
        self.set_minutes = minutes;
        self
    }

    pub fn unit(mut self, field: impl Into<String>) -> Self {
        self.unit_field = field.into();
        self
    }
}

// ==========================================
// Template - 定额模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "ID", default)]
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub systema: Option<String>,
    #[serde(default)]
    pub type_izd: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub head_name: Option<String>,
}

impl Template {
    /// 按名称查找工序
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

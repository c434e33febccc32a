// ==========================================
// 门窗车间工时定额计算系统 - 领域类型定义
// ==========================================
// 职责: 产品类型、规则模式等闭合枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 产品类型 (Product Type)
// ==========================================
// 序列化格式: 与订单系统一致的小写标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "window")]
    Window, // 窗
    #[serde(rename = "door")]
    Door, // 门
    #[serde(rename = "glyhar")]
    Glazed, // 固定玻璃组件
}

impl ProductType {
    /// 从订单标签解析（未知标签返回 None，无默认回退）
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "window" => Some(ProductType::Window),
            "door" => Some(ProductType::Door),
            "glyhar" => Some(ProductType::Glazed),
            _ => None,
        }
    }

    /// 订单系统中的标签
    pub fn as_tag(&self) -> &'static str {
        match self {
            ProductType::Window => "window",
            ProductType::Door => "door",
            ProductType::Glazed => "glyhar",
        }
    }

    /// 负责该类产品的班组
    pub fn team_slug(&self) -> &'static str {
        match self {
            ProductType::Window | ProductType::Door | ProductType::Glazed => "windows",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

// ==========================================
// 规则模式 (Rule Mode)
// ==========================================
// 未识别的模式反序列化为 Unknown，计算时不生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleMode {
    Set,
    Multiplied,
    Additive,
    AdditivePlusMultiplied,
    Minus,
    #[serde(other)]
    Unknown,
}

impl RuleMode {
    /// 是否需要 unitField 解析单位数量
    pub fn uses_unit_field(&self) -> bool {
        matches!(self, RuleMode::Multiplied | RuleMode::AdditivePlusMultiplied)
    }
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleMode::Set => "set",
            RuleMode::Multiplied => "multiplied",
            RuleMode::Additive => "additive",
            RuleMode::AdditivePlusMultiplied => "additivePlusMultiplied",
            RuleMode::Minus => "minus",
            RuleMode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 门窗车间工时定额计算系统 - dem 订单浏览
// ==========================================
// 来源: dem_orders（订单头）、dem_plan（生产计划行）
// 只读，用于挑选要计算定额的订单与位置
// ==========================================

use serde::{Deserialize, Serialize};

/// 订单头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemOrder {
    pub id: i64,
    pub order_num: String,
    pub creator: String,
    pub customer: String,
    pub dop_info: String,
    pub ms_note: String, // 源表可为空，读出时以空串代替
}

/// 订单位置明细（同一位置同一类型的计划行合并）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemOrderPosition {
    pub id: i64,
    pub name_position: String,
    pub position: i32,
    pub order_num: String,
    pub sqr: f64,
    pub note: String,
    pub count: f64,
    pub color: String,
    pub customer: String,
}

/// 订单列表筛选：有 search 时按订单号片段查找，否则按创建月份
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemOrderFilter {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

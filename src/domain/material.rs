// ==========================================
// 门窗车间工时定额计算系统 - 物料领域模型
// ==========================================
// 来源: dem_klaes_materials（物料清单）、dem_price（报价单附注）
// 用途: 仓储层读取，引擎层只读
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Material - 物料清单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub order_id: i64,         // dem 订单内部ID
    pub position: i32,         // 订单位置号
    pub article: String,       // 物料编码
    pub name: String,          // 物料名称（未规范化）
    pub width_mm: f64,         // 宽度（mm）
    pub height_mm: f64,        // 高度（mm）
    pub count: f64,            // 数量（共用件可能为小数）
    pub field: Option<String>, // 分区标记（pole）
}

impl Material {
    /// 规范化后的名称（去除首尾空白）
    pub fn normalized_name(&self) -> &str {
        self.name.trim()
    }
}

// ==========================================
// SupplementaryFact - 报价单附注
// ==========================================
// 例如报价单中额外登记的锁具
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplementaryFact {
    pub position_name: String,
    pub article: String,
    pub position: String, // 源表为文本
    pub count: f64,
}

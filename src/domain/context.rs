// ==========================================
// 门窗车间工时定额计算系统 - 计算上下文
// ==========================================
// 由物料清单派生的特征表（一条订单行一份）
// 序列化字段名即规则数据中使用的字段名，同时供前端诊断展示
// ==========================================

use crate::domain::types::ProductType;
use serde::{Deserialize, Serialize};

// ==========================================
// NormContext - 特征计数 + 存在标志
// ==========================================
// 构建后只读，由规则引擎消费
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormContext {
    #[serde(rename = "Type")]
    pub product_type: ProductType,

    // ===== 中梃 =====
    #[serde(rename = "HasImpost")]
    pub has_impost: bool,
    #[serde(rename = "ImpostCount")]
    pub impost_count: f64,

    // ===== 锁芯盖板 =====
    #[serde(rename = "StublinaCount")]
    pub cylinder_cover_count: f64,

    // ===== 扇 =====
    #[serde(rename = "StvWindowCount")]
    pub window_sash_count: f64,
    #[serde(rename = "StvTCount600")]
    pub narrow_sash_615: f64, // 宽度 ≤ 615mm
    #[serde(rename = "StvTCount400")]
    pub narrow_sash_400: f64, // 宽度 ≤ 400mm

    // ===== 锁 =====
    #[serde(rename = "MnogozapZamok")]
    pub multipoint_locks: f64,
    #[serde(rename = "StandZamok")]
    pub standard_locks: f64, // 含多点锁

    // ===== 合页 =====
    #[serde(rename = "PetliStand")]
    pub standard_hinges: f64,
    #[serde(rename = "PetliRolik")]
    pub roller_hinges: f64,
    #[serde(rename = "Petli3Section")]
    pub three_section_hinges: f64,
    #[serde(rename = "HasPetliRDRH")]
    pub has_rdrh_hinges: bool,
    #[serde(rename = "PetliRDRH")]
    pub rdrh_hinges: f64,
    #[serde(rename = "HasPetliFural")]
    pub has_reinforced_hinges: bool,
    #[serde(rename = "PetliFural")]
    pub reinforced_hinges: f64,
    #[serde(rename = "PetliForNaveshCount")]
    pub mountable_hinges: f64, // 标准 + 滚轮 + 加强

    // ===== 压条 =====
    #[serde(rename = "PritvorKP40")]
    pub kp40_rebates: f64,
    #[serde(rename = "HasPritvorKP40")]
    pub has_kp40_rebate: bool,

    // ===== 五金拉杆 =====
    #[serde(rename = "TagCountWin")]
    pub window_rods: f64,
}

impl NormContext {
    /// 指定产品类型的空上下文
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            has_impost: false,
            impost_count: 0.0,
            cylinder_cover_count: 0.0,
            window_sash_count: 0.0,
            narrow_sash_615: 0.0,
            narrow_sash_400: 0.0,
            multipoint_locks: 0.0,
            standard_locks: 0.0,
            standard_hinges: 0.0,
            roller_hinges: 0.0,
            three_section_hinges: 0.0,
            has_rdrh_hinges: false,
            rdrh_hinges: 0.0,
            has_reinforced_hinges: false,
            reinforced_hinges: 0.0,
            mountable_hinges: 0.0,
            kp40_rebates: 0.0,
            has_kp40_rebate: false,
            window_rods: 0.0,
        }
    }
}

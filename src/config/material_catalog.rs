// ==========================================
// 门窗车间工时定额计算系统 - 物料名称目录
// ==========================================
// 职责: 各特征族对应的物料名称集合（静态配置数据，非逻辑）
// 默认值编译在代码中，可由 config_kv 的 material_catalog 覆写
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 物料名称目录
///
/// 名称按规范化（去首尾空白）后的精确值匹配。
/// 覆写 JSON 中缺失的特征族沿用默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialCatalog {
    // ===== 中梃 =====
    pub impost: BTreeSet<String>,
    pub shtulp: BTreeSet<String>, // 仅窗类计入中梃

    // ===== 锁芯盖板 =====
    pub cylinder_covers: BTreeSet<String>,

    // ===== 扇 =====
    pub window_sashes: BTreeSet<String>,
    pub narrow_sashes_615: BTreeSet<String>,
    pub narrow_sashes_400: BTreeSet<String>,

    // ===== 五金拉杆 / 压条 =====
    pub window_rods: BTreeSet<String>,
    pub kp40_rebates: BTreeSet<String>,

    // ===== 合页 =====
    pub standard_hinges: BTreeSet<String>,
    pub roller_hinges: BTreeSet<String>,
    pub three_section_hinges: BTreeSet<String>,
    pub reinforced_hinges: BTreeSet<String>,
    pub rdrh_hinges: BTreeSet<String>,

    // ===== 锁 =====
    pub multipoint_locks: BTreeSet<String>,
    pub standard_locks: BTreeSet<String>,
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const SASH_NAMES: &[&str] = &[
    "Створка Т-образная",
    "Створка-коробка",
    "Створка Т - образ.",
    "Створка оконная",
    "Створка оконная усиленная прямоугольная",
];

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self {
            impost: names(&[
                "Стойка-импост",
                "Импост",
                "Профиль импостный",
                "Импост в дверь",
            ]),
            shtulp: names(&["Штульп"]),
            cylinder_covers: names(&[
                "Накладка на цилиндр Stublina",
                "Накладка на цилиндр Stublina (под покраску)",
            ]),
            window_sashes: names(&[
                "Створка оконная усиленная прямоугольная",
                "Створка оконная",
            ]),
            narrow_sashes_615: names(SASH_NAMES),
            narrow_sashes_400: names(SASH_NAMES),
            window_rods: names(&["Фурнитурная тяга"]),
            kp40_rebates: names(&["Притвор КП40"]),
            standard_hinges: names(&["Петля двухсекционная 67мм", "Петля дверная 2-част."]),
            roller_hinges: names(&["Петля роликовая для КП45"]),
            three_section_hinges: names(&[
                "Петля дверная трехсекционная с удлиненной базой",
                "Петля дверная трехсекционная с удлиненной базой  :::",
            ]),
            reinforced_hinges: names(&["Петля Фурал дверная 2-част. с подшипником"]),
            rdrh_hinges: names(&["Петля роликовая RDRH"]),
            multipoint_locks: names(&["Многозапорный замок Stublina с управлением от ручки"]),
            standard_locks: names(&[
                "Замок Elementis 1153 (D30) (под нажимной гарнитур)",
                "Замок MACO G-TS 57819(232011)",
                "Замок KALE 153 D30мм E85 N8 (с защёлкой)",
                "Замок Elementis 1155 (D30) (для бугельных ручек)",
            ]),
        }
    }
}

// ==========================================
// 门窗车间工时定额计算系统 - 物料分类器
// ==========================================
// 职责: 物料清单 → NormContext（按产品类型选择特征族）
// 规则: 名称去首尾空白后精确匹配目录；计数为累加值
// 宽度门槛: ≤615mm / ≤400mm 两档相互独立
// ==========================================

use crate::config::material_catalog::MaterialCatalog;
use crate::domain::context::NormContext;
use crate::domain::material::{Material, SupplementaryFact};
use crate::domain::types::ProductType;
use crate::engine::error::{EngineError, EngineResult};
use tracing::debug;

/// 分类器配置（不可变，构造时注入）
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub catalog: MaterialCatalog,
    pub narrow_width_mm: f64,
    pub extra_narrow_width_mm: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            catalog: MaterialCatalog::default(),
            narrow_width_mm: 615.0,
            extra_narrow_width_mm: 400.0,
        }
    }
}

// ==========================================
// MaterialClassifier - 物料分类器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MaterialClassifier {
    config: ClassifierConfig,
}

impl MaterialClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 按订单标签分类（未知标签直接报错，无默认回退）
    pub fn classify_tag(
        &self,
        materials: &[Material],
        facts: &[SupplementaryFact],
        product_type: &str,
    ) -> EngineResult<NormContext> {
        let product_type = ProductType::from_tag(product_type)
            .ok_or_else(|| EngineError::UnknownProductType(product_type.to_string()))?;
        Ok(self.classify(materials, facts, product_type))
    }

    /// 构建计算上下文
    ///
    /// # 参数
    /// - materials: 订单行物料清单
    /// - facts: 报价单附注（当前仅读取，不计入上下文）
    /// - product_type: 产品类型
    pub fn classify(
        &self,
        materials: &[Material],
        facts: &[SupplementaryFact],
        product_type: ProductType,
    ) -> NormContext {
        let ctx = match product_type {
            ProductType::Glazed => self.classify_glazed(materials),
            ProductType::Window => self.classify_window(materials),
            ProductType::Door => self.classify_door(materials, facts),
        };

        debug!(
            product_type = %ctx.product_type,
            materials = materials.len(),
            has_impost = ctx.has_impost,
            impost_count = ctx.impost_count,
            narrow_sash_615 = ctx.narrow_sash_615,
            narrow_sash_400 = ctx.narrow_sash_400,
            mountable_hinges = ctx.mountable_hinges,
            standard_locks = ctx.standard_locks,
            "物料分类完成"
        );

        ctx
    }

    fn classify_glazed(&self, materials: &[Material]) -> NormContext {
        let catalog = &self.config.catalog;
        let mut ctx = NormContext::new(ProductType::Glazed);

        for m in materials {
            let name = m.normalized_name();

            if catalog.impost.contains(name) {
                ctx.has_impost = true;
                ctx.impost_count += m.count;
            }

            self.count_narrow_sashes(&mut ctx, name, m);
        }

        ctx
    }

    fn classify_window(&self, materials: &[Material]) -> NormContext {
        let catalog = &self.config.catalog;
        let mut ctx = NormContext::new(ProductType::Window);

        for m in materials {
            let name = m.normalized_name();

            // 窗类：对开扇中梃（Штульп）同样计入中梃
            if catalog.impost.contains(name) || catalog.shtulp.contains(name) {
                ctx.has_impost = true;
                ctx.impost_count += m.count;
            }

            if catalog.window_sashes.contains(name) {
                ctx.window_sash_count += m.count;
            }

            self.count_narrow_sashes(&mut ctx, name, m);

            if catalog.window_rods.contains(name) {
                ctx.window_rods += m.count;
            }
        }

        ctx
    }

    fn classify_door(&self, materials: &[Material], facts: &[SupplementaryFact]) -> NormContext {
        let catalog = &self.config.catalog;
        let mut ctx = NormContext::new(ProductType::Door);

        for m in materials {
            let name = m.normalized_name();

            if catalog.impost.contains(name) {
                ctx.has_impost = true;
                ctx.impost_count += m.count;
            }

            if catalog.cylinder_covers.contains(name) {
                ctx.cylinder_cover_count += m.count;
            }

            self.count_narrow_sashes(&mut ctx, name, m);

            if catalog.kp40_rebates.contains(name) {
                ctx.kp40_rebates += m.count;
                ctx.has_kp40_rebate = true;
            }

            // ===== 合页 =====
            if catalog.standard_hinges.contains(name) {
                ctx.standard_hinges += m.count;
                ctx.mountable_hinges += m.count;
            }

            if catalog.roller_hinges.contains(name) {
                ctx.roller_hinges += m.count;
                ctx.mountable_hinges += m.count;
            }

            if catalog.three_section_hinges.contains(name) {
                ctx.three_section_hinges += m.count;
            }

            if catalog.reinforced_hinges.contains(name) {
                ctx.reinforced_hinges += m.count;
                ctx.has_reinforced_hinges = true;
                ctx.mountable_hinges += m.count;
            }

            if catalog.rdrh_hinges.contains(name) {
                ctx.rdrh_hinges += m.count;
                ctx.has_rdrh_hinges = true;
            }

            // ===== 锁 =====
            // 多点锁同时计入普通锁
            if catalog.multipoint_locks.contains(name) {
                ctx.multipoint_locks += m.count;
                ctx.standard_locks += m.count;
            }

            if catalog.standard_locks.contains(name) {
                ctx.standard_locks += m.count;
            }
        }

        // TODO: 按 article + position 匹配 dem_price 中额外登记的锁，累加到 standard_locks
        if !facts.is_empty() {
            debug!(facts = facts.len(), "报价单附注未参与分类");
        }

        ctx
    }

    fn count_narrow_sashes(&self, ctx: &mut NormContext, name: &str, m: &Material) {
        let catalog = &self.config.catalog;

        if catalog.narrow_sashes_615.contains(name) && m.width_mm <= self.config.narrow_width_mm {
            ctx.narrow_sash_615 += m.count;
        }

        if catalog.narrow_sashes_400.contains(name)
            && m.width_mm <= self.config.extra_narrow_width_mm
        {
            ctx.narrow_sash_400 += m.count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(name: &str, count: f64, width_mm: f64) -> Material {
        Material {
            order_id: 1,
            position: 1,
            article: format!("art-{}", name),
            name: name.to_string(),
            width_mm,
            height_mm: 0.0,
            count,
            field: None,
        }
    }

    #[test]
    fn test_sash_width_gates() {
        let classifier = MaterialClassifier::default();

        let at_615 = classifier.classify(
            &[material("Створка Т-образная", 1.0, 615.0)],
            &[],
            ProductType::Door,
        );
        assert_eq!(at_615.narrow_sash_615, 1.0);
        assert_eq!(at_615.narrow_sash_400, 0.0);

        let at_616 = classifier.classify(
            &[material("Створка Т-образная", 1.0, 616.0)],
            &[],
            ProductType::Door,
        );
        assert_eq!(at_616.narrow_sash_615, 0.0);

        let at_400 = classifier.classify(
            &[material("Створка-коробка", 2.0, 400.0)],
            &[],
            ProductType::Glazed,
        );
        assert_eq!(at_400.narrow_sash_615, 2.0);
        assert_eq!(at_400.narrow_sash_400, 2.0);
    }

    #[test]
    fn test_name_is_trimmed_and_counts_accumulate() {
        let classifier = MaterialClassifier::default();
        let ctx = classifier.classify(
            &[
                material("  Импост ", 1.0, 50.0),
                material("Профиль импостный", 0.5, 50.0),
            ],
            &[],
            ProductType::Door,
        );

        assert!(ctx.has_impost);
        assert_eq!(ctx.impost_count, 1.5);
    }

    #[test]
    fn test_unknown_material_is_ignored() {
        let classifier = MaterialClassifier::default();
        let ctx = classifier.classify(
            &[material("Уплотнитель", 12.0, 100.0)],
            &[],
            ProductType::Door,
        );

        assert_eq!(ctx, NormContext::new(ProductType::Door));
    }

    #[test]
    fn test_door_hinges_and_locks() {
        let classifier = MaterialClassifier::default();
        let ctx = classifier.classify(
            &[
                material("Петля двухсекционная 67мм", 2.0, 0.0),
                material("Петля роликовая для КП45", 3.0, 0.0),
                material("Петля Фурал дверная 2-част. с подшипником", 1.0, 0.0),
                material("Петля дверная трехсекционная с удлиненной базой", 4.0, 0.0),
                material("Петля роликовая RDRH", 3.0, 350.0),
                material("Многозапорный замок Stublina с управлением от ручки", 1.0, 0.0),
                material("Замок MACO G-TS 57819(232011)", 1.0, 0.0),
                material("Притвор КП40", 2.0, 0.0),
            ],
            &[],
            ProductType::Door,
        );

        assert_eq!(ctx.standard_hinges, 2.0);
        assert_eq!(ctx.roller_hinges, 3.0);
        assert_eq!(ctx.reinforced_hinges, 1.0);
        assert!(ctx.has_reinforced_hinges);
        assert_eq!(ctx.three_section_hinges, 4.0);
        assert_eq!(ctx.mountable_hinges, 6.0);
        assert!(ctx.has_rdrh_hinges);
        assert_eq!(ctx.rdrh_hinges, 3.0);
        assert_eq!(ctx.multipoint_locks, 1.0);
        assert_eq!(ctx.standard_locks, 2.0);
        assert!(ctx.has_kp40_rebate);
        assert_eq!(ctx.kp40_rebates, 2.0);
    }

    #[test]
    fn test_window_counts_shtulp_as_impost() {
        let classifier = MaterialClassifier::default();
        let materials = [
            material("Штульп", 1.0, 0.0),
            material("Створка оконная", 2.0, 500.0),
            material("Фурнитурная тяга", 4.0, 0.0),
        ];

        let window = classifier.classify(&materials, &[], ProductType::Window);
        assert!(window.has_impost);
        assert_eq!(window.window_sash_count, 2.0);
        assert_eq!(window.narrow_sash_615, 2.0);
        assert_eq!(window.window_rods, 4.0);

        // 门类不识别对开扇中梃，也不统计拉杆
        let door = classifier.classify(&materials, &[], ProductType::Door);
        assert!(!door.has_impost);
        assert_eq!(door.window_rods, 0.0);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = MaterialClassifier::default();
        let materials = [
            material("Импост", 1.0, 50.0),
            material("Петля роликовая RDRH", 3.0, 350.0),
        ];

        let a = classifier.classify(&materials, &[], ProductType::Door);
        let b = classifier.classify(&materials, &[], ProductType::Door);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_product_type() {
        let classifier = MaterialClassifier::default();
        let err = classifier.classify_tag(&[], &[], "foo").unwrap_err();
        assert!(matches!(err, EngineError::UnknownProductType(ref t) if t == "foo"));
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = MaterialClassifier::new(ClassifierConfig {
            narrow_width_mm: 700.0,
            ..ClassifierConfig::default()
        });
        let ctx = classifier.classify(
            &[material("Створка Т-образная", 1.0, 650.0)],
            &[],
            ProductType::Door,
        );
        assert_eq!(ctx.narrow_sash_615, 1.0);
    }
}

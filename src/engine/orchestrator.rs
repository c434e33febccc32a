// ==========================================
// 门窗车间工时定额计算系统 - 定额计算编排器
// ==========================================
// 流程: 解析产品类型 → 并发读取(物料/模板/附注) → 分类 → 规则计算
// 并发: 三路读取任一失败立即返回，其余结果丢弃（不构建部分上下文）
// 时限: 编排器本身无超时，由调用方控制
// ==========================================

use crate::config::NormSettings;
use crate::domain::context::NormContext;
use crate::domain::template::Operation;
use crate::domain::types::ProductType;
use crate::engine::classifier::MaterialClassifier;
use crate::engine::error::{EngineError, EngineResult, FetchDataset};
use crate::engine::repositories::NormDataSource;
use crate::engine::rules::RuleEvaluator;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// NormCalculation - 计算结果
// ==========================================
// context 同时返回给前端用于诊断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormCalculation {
    #[serde(rename = "operation")]
    pub operations: Vec<Operation>,
    pub context: NormContext,
}

// ==========================================
// NormCalculator - 定额计算编排器
// ==========================================
pub struct NormCalculator<S>
where
    S: NormDataSource + ?Sized,
{
    source: Arc<S>,
    classifier: MaterialClassifier,
    evaluator: RuleEvaluator,
}

impl<S> NormCalculator<S>
where
    S: NormDataSource + ?Sized,
{
    pub fn new(source: Arc<S>, classifier: MaterialClassifier, evaluator: RuleEvaluator) -> Self {
        Self {
            source,
            classifier,
            evaluator,
        }
    }

    /// 按配置快照创建
    pub fn from_settings(source: Arc<S>, settings: &NormSettings) -> Self {
        Self::new(
            source,
            MaterialClassifier::new(settings.classifier.clone()),
            RuleEvaluator::new(settings.ignore_group.clone()),
        )
    }

    /// 计算订单行的工序定额
    ///
    /// # 参数
    /// - order_num: 订单号
    /// - position: 订单位置号
    /// - product_type: 产品类型标签（window / door / glyhar）
    /// - template_code: 模板代码
    /// - item_count: 订单行实物件数
    ///
    /// # 返回
    /// - Ok(NormCalculation): 调整后的工序 + 上下文
    /// - Err(EngineError): 未知产品类型 / 模板不存在 / 数据读取失败
    pub async fn calculate(
        &self,
        order_num: &str,
        position: i32,
        product_type: &str,
        template_code: &str,
        item_count: u32,
    ) -> EngineResult<NormCalculation> {
        let product_type = ProductType::from_tag(product_type)
            .ok_or_else(|| EngineError::UnknownProductType(product_type.to_string()))?;

        info!(
            order_num = %order_num,
            position = position,
            product_type = %product_type,
            template_code = %template_code,
            item_count = item_count,
            "开始计算工序定额"
        );

        let materials = async {
            self.source
                .get_materials(order_num, position)
                .await
                .map_err(|e| EngineError::upstream(FetchDataset::Materials, order_num, e))
        };

        let template = async {
            self.source
                .get_template(template_code)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound { .. } => EngineError::TemplateNotFound {
                        code: template_code.to_string(),
                    },
                    other => EngineError::upstream(FetchDataset::Template, order_num, other),
                })
        };

        let facts = async {
            self.source
                .get_supplementary_facts(order_num)
                .await
                .map_err(|e| EngineError::upstream(FetchDataset::SupplementaryFacts, order_num, e))
        };

        let (materials, template, facts) = futures::try_join!(materials, template, facts)?;

        debug!(
            materials = materials.len(),
            operations = template.operations.len(),
            rules = template.rules.len(),
            facts = facts.len(),
            "数据读取完成"
        );

        let context = self.classifier.classify(&materials, &facts, product_type);
        let operations =
            self.evaluator
                .apply(&template.operations, &template.rules, &context, item_count);

        info!(
            order_num = %order_num,
            position = position,
            total_minutes = operations.iter().map(|op| op.minutes).sum::<f64>(),
            "工序定额计算完成"
        );

        Ok(NormCalculation {
            operations,
            context,
        })
    }
}

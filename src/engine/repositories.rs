// ==========================================
// 门窗车间工时定额计算系统 - 引擎层数据源
// ==========================================
// 职责: 定义计算所需的三个只读数据接口，并以 SQLite 仓储实现
// 说明: 每个仓储持有独立连接，查询在 blocking 线程池中执行，可真正并行
// ==========================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::material::{Material, SupplementaryFact};
use crate::domain::template::Template;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{DemMaterialRepository, DemPriceRepository, TemplateRepository};

// ==========================================
// NormDataSource - 计算数据源
// ==========================================
#[async_trait]
pub trait NormDataSource: Send + Sync {
    /// 订单行物料清单
    async fn get_materials(&self, order_num: &str, position: i32)
        -> RepositoryResult<Vec<Material>>;

    /// 已启用的定额模板（未知或停用 → NotFound）
    async fn get_template(&self, code: &str) -> RepositoryResult<Template>;

    /// 报价单附注
    async fn get_supplementary_facts(
        &self,
        order_num: &str,
    ) -> RepositoryResult<Vec<SupplementaryFact>>;
}

// ==========================================
// NormRepositories - 仓储聚合
// ==========================================
/// 定额计算仓储集合
///
/// 聚合计算所需的 Repository，作为 `NormDataSource` 注入计算器。
#[derive(Clone)]
pub struct NormRepositories {
    /// dem 物料清单仓储
    pub material_repo: Arc<DemMaterialRepository>,
    /// dem 报价单仓储
    pub price_repo: Arc<DemPriceRepository>,
    /// 模板仓储
    pub template_repo: Arc<TemplateRepository>,
}

impl NormRepositories {
    pub fn new(
        material_repo: Arc<DemMaterialRepository>,
        price_repo: Arc<DemPriceRepository>,
        template_repo: Arc<TemplateRepository>,
    ) -> Self {
        Self {
            material_repo,
            price_repo,
            template_repo,
        }
    }
}

/// 在 blocking 线程池中执行同步查询
async fn run_blocking<T, F>(query: F) -> RepositoryResult<T>
where
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(query)
        .await
        .map_err(|e| RepositoryError::InternalError(format!("查询任务异常终止: {}", e)))?
}

#[async_trait]
impl NormDataSource for NormRepositories {
    async fn get_materials(
        &self,
        order_num: &str,
        position: i32,
    ) -> RepositoryResult<Vec<Material>> {
        let repo = self.material_repo.clone();
        let order_num = order_num.to_string();
        run_blocking(move || repo.get_order_materials(&order_num, position)).await
    }

    async fn get_template(&self, code: &str) -> RepositoryResult<Template> {
        let repo = self.template_repo.clone();
        let code = code.to_string();
        run_blocking(move || repo.get_active_by_code(&code)).await
    }

    async fn get_supplementary_facts(
        &self,
        order_num: &str,
    ) -> RepositoryResult<Vec<SupplementaryFact>> {
        let repo = self.price_repo.clone();
        let order_num = order_num.to_string();
        run_blocking(move || repo.get_supplementary_facts(&order_num)).await
    }
}

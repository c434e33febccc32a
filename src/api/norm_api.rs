// ==========================================
// 门窗车间工时定额计算系统 - 工时定额 API
// ==========================================
// 职责: 定额计算（带时限）、定额保存与修改、派工、定稿、工人管理
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::dem_order_api::month_range;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::norm_order::{
    FinalOrderFilter, FinalOrderList, FinalOrderUpdate, NewWorker, NormOperation, NormOrder,
    NormOrderDraft, NormOrderFilter, NormOrderSummary, NormOrderUpdate, SaveWorkersRequest,
    Worker,
};
use crate::domain::types::ProductType;
use crate::engine::orchestrator::{NormCalculation, NormCalculator};
use crate::engine::repositories::NormDataSource;
use crate::repository::norm_order_repo::NormOrderRepository;
use crate::repository::worker_repo::WorkerRepository;

// ==========================================
// CalculateRequest - 计算请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub order_num: String,
    pub position: i32,
    #[serde(rename = "type")]
    pub product_type: String,
    pub template_code: String,
    #[serde(rename = "count")]
    pub item_count: u32,
}

// ==========================================
// NormApi - 工时定额 API
// ==========================================

/// 工时定额API
///
/// 职责：
/// 1. 订单行定额计算（调用方时限在此施加）
/// 2. 定额结果保存与查询
/// 3. 派工保存、工人列表
pub struct NormApi {
    calculator: NormCalculator<dyn NormDataSource>,
    norm_order_repo: Arc<NormOrderRepository>,
    worker_repo: Arc<WorkerRepository>,
    calc_timeout: Duration,
}

impl NormApi {
    pub fn new(
        calculator: NormCalculator<dyn NormDataSource>,
        norm_order_repo: Arc<NormOrderRepository>,
        worker_repo: Arc<WorkerRepository>,
        calc_timeout: Duration,
    ) -> Self {
        Self {
            calculator,
            norm_order_repo,
            worker_repo,
            calc_timeout,
        }
    }

    /// 计算订单行工序定额
    ///
    /// # 返回
    /// - Ok(NormCalculation): 调整后的工序 + 上下文
    /// - Err(ApiError::InvalidInput): 参数非法
    /// - Err(ApiError::Timeout): 超过计算时限，未完成的读取被放弃
    pub async fn calculate(&self, req: CalculateRequest) -> ApiResult<NormCalculation> {
        if req.order_num.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        if req.position <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "位置号必须为正数: {}",
                req.position
            )));
        }
        if req.item_count == 0 {
            return Err(ApiError::InvalidInput("件数必须大于0".to_string()));
        }
        if req.template_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("模板代码不能为空".to_string()));
        }

        let fut = self.calculator.calculate(
            &req.order_num,
            req.position,
            &req.product_type,
            &req.template_code,
            req.item_count,
        );

        match tokio::time::timeout(self.calc_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                let timeout_ms = self.calc_timeout.as_millis() as u64;
                warn!(
                    order_num = %req.order_num,
                    position = req.position,
                    timeout_ms = timeout_ms,
                    "工序定额计算超时"
                );
                Err(ApiError::Timeout { timeout_ms })
            }
        }
    }

    /// 保存订单行定额
    ///
    /// # 返回
    /// - Ok(id): 产品实例ID
    pub fn save_norm_order(&self, draft: NormOrderDraft) -> ApiResult<i64> {
        if draft.order_num.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        if draft.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品名称不能为空".to_string()));
        }
        if draft.count < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "数量不能为负: {}",
                draft.count
            )));
        }
        validate_operations(&draft.operations)?;

        let id = self.norm_order_repo.save(&draft)?;
        info!(
            order_num = %draft.order_num,
            product_id = id,
            operations = draft.operations.len(),
            total_time = draft.resolved_total_time(),
            "保存订单行定额"
        );
        Ok(id)
    }

    /// 按订单号查询已保存的定额（含派工）
    pub fn get_norm_orders(&self, order_num: &str) -> ApiResult<Vec<NormOrder>> {
        if order_num.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        Ok(self.norm_order_repo.get_by_order(order_num)?)
    }

    /// 按ID查询单条定额（含派工）
    pub fn get_norm_order(&self, id: i64) -> ApiResult<NormOrder> {
        validate_id(id)?;
        Ok(self.norm_order_repo.get_by_id(id)?)
    }

    /// 主件定额列表
    pub fn list_norm_orders(&self, filter: &NormOrderFilter) -> ApiResult<Vec<NormOrderSummary>> {
        Ok(self.norm_order_repo.list_main(filter)?)
    }

    /// 重新保存工序定额（整体替换工序）
    pub fn update_norm_order(&self, id: i64, update: NormOrderUpdate) -> ApiResult<()> {
        validate_id(id)?;
        if update.total_time.map_or(false, |t| t < 0.0) {
            return Err(ApiError::InvalidInput("总工时不能为负".to_string()));
        }
        validate_operations(&update.operations)?;

        self.norm_order_repo.update(id, &update)?;
        info!(
            product_id = id,
            operations = update.operations.len(),
            total_time = update.resolved_total_time(),
            status = ?update.status,
            "修改订单行定额"
        );
        Ok(())
    }

    /// 组件及其子件改为新状态，并清空其派工
    pub fn update_cancel_status(&self, root_product_id: i64, status: &str) -> ApiResult<usize> {
        validate_id(root_product_id)?;
        let status = status.trim();
        if status.is_empty() {
            return Err(ApiError::InvalidInput("状态不能为空".to_string()));
        }

        let changed = self
            .norm_order_repo
            .update_cancel_status(root_product_id, status)?;
        info!(
            root_product_id = root_product_id,
            status = status,
            products = changed,
            "撤销派工并更新状态"
        );
        Ok(changed)
    }

    /// 定稿
    pub fn update_final_order(&self, id: i64, update: FinalOrderUpdate) -> ApiResult<()> {
        validate_id(id)?;
        let negative = [update.norm_money, update.coefficient, update.sqr]
            .iter()
            .flatten()
            .any(|v| *v < 0.0);
        if negative {
            return Err(ApiError::InvalidInput(
                "定额金额 / 系数 / 面积不能为负".to_string(),
            ));
        }

        self.norm_order_repo.update_final(id, &update)?;
        info!(product_id = id, brigade = ?update.brigade, "订单行定稿");
        Ok(())
    }

    /// 已派工 / 已定稿产品列表
    ///
    /// 未给出日期时默认当月（按 UTC 日期）
    pub fn list_final_orders(&self, mut filter: FinalOrderFilter) -> ApiResult<FinalOrderList> {
        if filter.from.is_none() || filter.to.is_none() {
            let today = Utc::now().date_naive();
            if let Some((start, next)) = month_range(today.year(), today.month()) {
                filter.from = filter.from.or(Some(start));
                filter.to = filter.to.or(next.pred_opt());
            }
        }
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ApiError::InvalidInput(format!(
                    "起始日期晚于结束日期: {} > {}",
                    from, to
                )));
            }
        }

        Ok(self.norm_order_repo.list_final(&filter)?)
    }

    /// 保存派工
    pub fn assign_workers(&self, req: SaveWorkersRequest) -> ApiResult<()> {
        if req.root_product_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "组件ID非法: {}",
                req.root_product_id
            )));
        }
        for a in &req.assignments {
            if a.operation_name.trim().is_empty() {
                return Err(ApiError::InvalidInput("工序名称不能为空".to_string()));
            }
            if a.actual_minutes < 0.0 || a.actual_value < 0.0 {
                return Err(ApiError::InvalidInput(format!(
                    "实际工时不能为负: employee_id={}, operation={}",
                    a.employee_id, a.operation_name
                )));
            }
        }

        let saved = self.norm_order_repo.assign_workers(&req)?;
        info!(
            root_product_id = req.root_product_id,
            assignments = saved,
            status = ?req.update_status,
            ready_date = ?req.ready_date,
            "保存派工"
        );
        Ok(())
    }

    /// 在岗工人列表
    ///
    /// 已知产品类型只返回对应班组；未知或为空时返回全部在岗工人
    pub fn list_workers(&self, product_type: Option<&str>) -> ApiResult<Vec<Worker>> {
        let team = product_type
            .and_then(ProductType::from_tag)
            .map(|t| t.team_slug());

        let workers = match team {
            Some(slug) => self.worker_repo.list_active_by_team(slug)?,
            None => self.worker_repo.list_active()?,
        };
        Ok(workers)
    }

    /// 管理端: 全部工人（含离岗）
    pub fn list_workers_admin(&self) -> ApiResult<Vec<Worker>> {
        Ok(self.worker_repo.list_all()?)
    }

    /// 管理端: 批量修改工人
    pub fn update_workers(&self, workers: Vec<Worker>) -> ApiResult<usize> {
        if let Some(w) = workers.iter().find(|w| w.name.trim().is_empty()) {
            return Err(ApiError::InvalidInput(format!(
                "工人姓名不能为空: id={}",
                w.id
            )));
        }

        let updated = self.worker_repo.update_all(&workers)?;
        info!(workers = updated, "修改工人信息");
        Ok(updated)
    }

    /// 管理端: 新增工人
    pub fn create_worker(&self, worker: NewWorker) -> ApiResult<i64> {
        if worker.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("工人姓名不能为空".to_string()));
        }

        let id = self.worker_repo.create(&worker)?;
        info!(worker_id = id, team = ?worker.team, "新增工人");
        Ok(id)
    }
}

fn validate_id(id: i64) -> ApiResult<()> {
    if id <= 0 {
        return Err(ApiError::InvalidInput(format!("产品ID非法: {}", id)));
    }
    Ok(())
}

fn validate_operations(operations: &[NormOperation]) -> ApiResult<()> {
    match operations
        .iter()
        .find(|op| op.minutes < 0.0 || op.value < 0.0)
    {
        Some(op) => Err(ApiError::InvalidInput(format!(
            "工序{}的定额不能为负",
            op.name
        ))),
        None => Ok(()),
    }
}

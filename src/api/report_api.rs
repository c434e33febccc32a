// ==========================================
// 门窗车间工时定额计算系统 - 报表 API
// ==========================================
// 职责: 订单最终报表（定额 vs 实际执行）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::norm_order::{ExecutorReport, OperationReport, OrderFinalReport, ProductReport};
use crate::repository::norm_order_repo::{FinalReportRow, NormOrderRepository};

pub struct ReportApi {
    norm_order_repo: Arc<NormOrderRepository>,
}

impl ReportApi {
    pub fn new(norm_order_repo: Arc<NormOrderRepository>) -> Self {
        Self { norm_order_repo }
    }

    /// 订单最终报表
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 订单没有已保存的定额
    pub fn order_final_report(&self, order_num: &str) -> ApiResult<OrderFinalReport> {
        if order_num.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }

        let rows = self.norm_order_repo.final_report_rows(order_num)?;
        if rows.is_empty() {
            return Err(ApiError::NotFound(format!(
                "订单{}没有已保存的定额",
                order_num
            )));
        }

        tracing::debug!(order_num = %order_num, rows = rows.len(), "生成最终报表");
        Ok(OrderFinalReport {
            order_num: order_num.to_string(),
            products: group_rows(rows),
        })
    }
}

// 行已按 产品 → 工序 排序，相邻合并即可
fn group_rows(rows: Vec<FinalReportRow>) -> Vec<ProductReport> {
    let mut products: Vec<ProductReport> = Vec::new();

    for row in rows {
        let same_product = products.last().map(|p| p.id) == Some(row.product_id);
        if !same_product {
            products.push(ProductReport {
                id: row.product_id,
                name: row.product_name.clone(),
                template_name: row.template_name.clone(),
                operations: Vec::new(),
            });
        }
        let Some(product) = products.last_mut() else {
            continue;
        };

        let same_operation = product
            .operations
            .last()
            .map(|op| op.operation_name == row.operation_name)
            .unwrap_or(false);
        if !same_operation {
            product.operations.push(OperationReport {
                operation_name: row.operation_name.clone(),
                operation_label: row.operation_label.clone(),
                norm_minutes: row.norm_minutes,
                norm_value: row.norm_value,
                executors: Vec::new(),
            });
        }

        if let (Some(worker_name), Some(operation)) = (row.worker_name, product.operations.last_mut())
        {
            operation.executors.push(ExecutorReport {
                worker_name,
                actual_minutes: row.actual_minutes.unwrap_or(0.0),
                actual_value: row.actual_value.unwrap_or(0.0),
            });
        }
    }

    products
}

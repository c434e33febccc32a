// ==========================================
// 门窗车间工时定额计算系统 - 订单定额记录
// ==========================================
// 用途: 保存计算结果、派工、最终报表
// 对齐: dem_product_instances_al / dem_operation_values_al /
//       dem_operation_executors_al / dem_employees_al
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 已派工
pub const STATUS_ASSIGNED: &str = "assigned";
/// 已定稿（定额金额 / 系数 / 班组已确认）
pub const STATUS_FINAL: &str = "final";

// ==========================================
// NormOperation - 已保存的工序定额
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormOperation {
    #[serde(rename = "operation_name")]
    pub name: String,
    #[serde(rename = "operation_label", default)]
    pub label: String,
    pub count: f64,
    pub value: f64,
    pub minutes: f64,
    #[serde(rename = "assign_workers", default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_workers: Vec<AssignedWorker>,
}

/// 工序上的执行人及实际工时
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedWorker {
    pub employee_id: i64,
    pub actual_minutes: f64,
    pub actual_value: f64,
}

// ==========================================
// NormOrderDraft - 待保存的订单行定额
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormOrderDraft {
    pub order_num: String,
    pub template_code: String,
    pub name: String,
    pub count: f64,
    pub total_time: Option<f64>, // 为空时按工序分钟数求和
    pub operations: Vec<NormOperation>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub part_type: String,
    #[serde(default)]
    pub parent_assembly: String,
    pub parent_product_id: Option<i64>,
    #[serde(default)]
    pub customer: String,
    pub position: i32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub systema: String,
    #[serde(default)]
    pub type_izd: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub sqr: f64,
}

impl NormOrderDraft {
    /// 实际写入的总工时
    pub fn resolved_total_time(&self) -> f64 {
        self.total_time
            .unwrap_or_else(|| self.operations.iter().map(|op| op.minutes).sum())
    }
}

// ==========================================
// NormOrder - 已保存的订单行定额
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormOrder {
    pub id: i64,
    pub order_num: String,
    pub template_code: String,
    pub name: String,
    pub count: f64,
    pub total_time: f64,
    pub operations: Vec<NormOperation>,
    #[serde(rename = "type")]
    pub kind: String,
    pub part_type: String,
    pub parent_assembly: String,
    pub parent_product_id: Option<i64>,
    pub status: Option<String>,
    pub customer: String,
    pub customer_type: String,
    pub systema: String,
    pub type_izd: String,
    pub profile: String,
    pub sqr: f64,
    pub brigade: String,
    pub norm_money: f64,
    pub coefficient: Option<f64>,
    pub position: i32,
    pub ready_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// 修改已保存的定额
// ==========================================

/// 重新保存工序定额（整体替换工序列表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormOrderUpdate {
    pub total_time: Option<f64>, // 为空时按工序分钟数求和
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub status: Option<String>,
    pub operations: Vec<NormOperation>,
}

impl NormOrderUpdate {
    pub fn resolved_total_time(&self) -> f64 {
        self.total_time
            .unwrap_or_else(|| self.operations.iter().map(|op| op.minutes).sum())
    }
}

/// 定稿字段，只写入提供了的字段，状态固定为 final
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalOrderUpdate {
    #[serde(default)]
    pub brigade: Option<String>,
    #[serde(default)]
    pub norm_money: Option<f64>,
    #[serde(default)]
    pub coefficient: Option<f64>,
    #[serde(default)]
    pub sqr: Option<f64>,
    #[serde(default)]
    pub parent_assembly: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub systema: Option<String>,
    #[serde(default)]
    pub type_izd: Option<String>,
    #[serde(default)]
    pub customer_type: Option<String>,
}

// ==========================================
// 列表查询
// ==========================================

/// 主件定额列表的筛选条件（空串表示不限）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormOrderFilter {
    #[serde(default)]
    pub order_num: String, // 订单号片段
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// 主件定额列表行（不含工序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormOrderSummary {
    pub id: i64,
    pub order_num: String,
    pub name: String,
    pub count: f64,
    pub total_time: f64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub part_type: String,
    pub parent_product_id: Option<i64>,
    pub parent_assembly: String,
    pub status: Option<String>,
}

/// 已派工 / 已定稿产品的筛选条件
///
/// 日期按完成日期 (ready_date) 过滤，两端都包含
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalOrderFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub order_num: String,
    #[serde(rename = "type", default)]
    pub kinds: Vec<String>,
}

/// 定稿列表中的产品，附每名工人的实际工时合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOrderProduct {
    pub id: i64,
    pub order_num: String,
    pub customer: String,
    pub total_time: f64,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub part_type: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_product_id: Option<i64>,
    pub parent_assembly: String,
    pub customer_type: String,
    pub systema: String,
    pub type_izd: String,
    pub profile: String,
    pub count: f64,
    pub sqr: f64,
    pub brigade: String,
    pub norm_money: f64,
    pub position: i32,
    pub ready_date: Option<NaiveDate>,
    pub coefficient: Option<f64>,
    pub employee_minutes: BTreeMap<i64, f64>,
    pub employee_value: BTreeMap<i64, f64>,
}

/// 定稿列表：产品 + 参与其中的在岗工人
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalOrderList {
    pub employees: Vec<Worker>,
    pub products: Vec<FinalOrderProduct>,
}

// ==========================================
// 派工
// ==========================================

/// 单条派工记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerAssignment {
    pub product_id: i64,
    pub operation_name: String,
    pub employee_id: i64,
    pub actual_minutes: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub actual_value: f64,
}

/// 一次派工保存请求（整个组件及其子件）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveWorkersRequest {
    pub assignments: Vec<WorkerAssignment>,
    #[serde(default)]
    pub update_status: Option<String>,
    #[serde(default)]
    pub ready_date: Option<NaiveDate>,
    pub root_product_id: i64,
}

/// 工人
///
/// team 为所属班组 slug，属于多个班组时取字典序最小者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// 新增工人
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorker {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub team: Option<String>,
}

fn default_active() -> bool {
    true
}

// ==========================================
// 最终报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFinalReport {
    pub order_num: String,
    #[serde(rename = "izdelie")]
    pub products: Vec<ProductReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    pub id: i64,
    pub name: String,
    pub template_name: String,
    pub operations: Vec<OperationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub operation_name: String,
    pub operation_label: String,
    pub norm_minutes: f64,
    pub norm_value: f64,
    pub executors: Vec<ExecutorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorReport {
    pub worker_name: String,
    pub actual_minutes: f64,
    pub actual_value: f64,
}

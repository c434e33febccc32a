// ==========================================
// 门窗车间工时定额计算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod context;
pub mod dem_order;
pub mod material;
pub mod norm_order;
pub mod template;
pub mod types;

// 重导出核心类型
pub use context::NormContext;
pub use dem_order::{DemOrder, DemOrderFilter, DemOrderPosition};
pub use material::{Material, SupplementaryFact};
pub use norm_order::{
    AssignedWorker, ExecutorReport, FinalOrderFilter, FinalOrderList, FinalOrderProduct,
    FinalOrderUpdate, NewWorker, NormOperation, NormOrder, NormOrderDraft, NormOrderFilter,
    NormOrderSummary, NormOrderUpdate, OperationReport, OrderFinalReport, ProductReport,
    SaveWorkersRequest, Worker, WorkerAssignment,
};
pub use template::{Condition, ConditionValue, Operation, Rule, Template, IGNORE_GROUP};
pub use types::{ProductType, RuleMode};

// ==========================================
// 门窗车间工时定额计算系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI / 上层服务调用
// ==========================================

pub mod dem_order_api;
pub mod error;
pub mod norm_api;
pub mod report_api;
pub mod template_api;

// 重导出核心类型
pub use dem_order_api::DemOrderApi;
pub use error::{ApiError, ApiResult};
pub use norm_api::{CalculateRequest, NormApi};
pub use report_api::ReportApi;
pub use template_api::TemplateApi;

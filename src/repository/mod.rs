// ==========================================
// 门窗车间工时定额计算系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod dem_material_repo;
pub mod dem_order_repo;
pub mod dem_price_repo;
pub mod error;
pub mod norm_order_repo;
pub mod template_repo;
pub mod worker_repo;

// 重导出核心仓储
pub use dem_material_repo::DemMaterialRepository;
pub use dem_order_repo::DemOrderRepository;
pub use dem_price_repo::DemPriceRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use norm_order_repo::{FinalReportRow, NormOrderRepository};
pub use template_repo::TemplateRepository;
pub use worker_repo::WorkerRepository;

// ==========================================
// 门窗车间工时定额计算系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod material_catalog;
pub mod norm_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, NormSettings};
pub use material_catalog::MaterialCatalog;
pub use norm_config_trait::{ConfigResult, NormConfigReader};

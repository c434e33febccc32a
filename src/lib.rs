// ==========================================
// 门窗车间工时定额计算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 后台服务 (订单物料 → 工时定额)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 物料分类 + 规则计算
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ConditionValue, Material, NormContext, Operation, ProductType, Rule, RuleMode,
    SupplementaryFact, Template,
};

// 引擎
pub use engine::{
    EngineError, MaterialClassifier, NormCalculation, NormCalculator, NormDataSource,
    RuleEvaluator,
};

// API
pub use api::{DemOrderApi, NormApi, ReportApi, TemplateApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门窗车间工时定额计算系统";

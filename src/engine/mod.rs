// ==========================================
// 门窗车间工时定额计算系统 - 引擎层
// ==========================================
// 职责: 物料分类、规则计算、计算编排
// 红线: Engine 不拼 SQL，数据经 NormDataSource 读取
// ==========================================

pub mod classifier;
pub mod error;
pub mod orchestrator;
pub mod repositories;
pub mod rule_lint;
pub mod rules;

// 重导出核心引擎
pub use classifier::{ClassifierConfig, MaterialClassifier};
pub use error::{EngineError, EngineResult, FetchDataset};
pub use orchestrator::{NormCalculation, NormCalculator};
pub use repositories::{NormDataSource, NormRepositories};
pub use rule_lint::{lint_rules, RuleWarning, RuleWarningKind};
pub use rules::{matches_condition, resolve_unit_field, RuleEvaluator};

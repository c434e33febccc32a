// ==========================================
// 门窗车间工时定额计算系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 条件匹配/规则应用本身不产生错误（未知字段视为不匹配）
// ==========================================

use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

/// 并发读取的数据集
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDataset {
    Materials,
    Template,
    SupplementaryFacts,
}

impl fmt::Display for FetchDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchDataset::Materials => write!(f, "materials"),
            FetchDataset::Template => write!(f, "template"),
            FetchDataset::SupplementaryFacts => write!(f, "supplementary_facts"),
        }
    }
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("未知的产品类型: {0}")]
    UnknownProductType(String),

    #[error("定额模板未找到或未启用: code={code}")]
    TemplateNotFound { code: String },

    #[error("数据读取失败 (dataset={dataset}, order_num={order_num}): {source}")]
    UpstreamFetchFailed {
        dataset: FetchDataset,
        order_num: String,
        #[source]
        source: RepositoryError,
    },
}

impl EngineError {
    pub(crate) fn upstream(dataset: FetchDataset, order_num: &str, source: RepositoryError) -> Self {
        EngineError::UpstreamFetchFailed {
            dataset,
            order_num: order_num.to_string(),
            source,
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

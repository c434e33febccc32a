// ==========================================
// 门窗车间工时定额计算系统 - 定额配置读取 Trait
// ==========================================
// 职责: 定义计算引擎所需的配置读取接口（不包含实现）
// 实现者: ConfigManager（从 config_kv 表读取）
// ==========================================

use crate::config::material_catalog::MaterialCatalog;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[async_trait]
pub trait NormConfigReader: Send + Sync {
    /// 窄扇宽度上限（mm）
    ///
    /// # 默认值
    /// - 615
    async fn get_narrow_sash_max_width_mm(&self) -> ConfigResult<f64>;

    /// 超窄扇宽度上限（mm）
    ///
    /// # 默认值
    /// - 400
    async fn get_extra_narrow_sash_max_width_mm(&self) -> ConfigResult<f64>;

    /// 不随件数放大的工序分组标记
    ///
    /// # 默认值
    /// - "ign"
    async fn get_ignore_group_tag(&self) -> ConfigResult<String>;

    /// 单次计算的整体时限（毫秒）
    ///
    /// # 默认值
    /// - 5000
    async fn get_calc_timeout_ms(&self) -> ConfigResult<u64>;

    /// 物料名称目录（未配置时使用编译内置目录）
    async fn get_material_catalog(&self) -> ConfigResult<MaterialCatalog>;
}

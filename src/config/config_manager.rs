// ==========================================
// 门窗车间工时定额计算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::material_catalog::MaterialCatalog;
use crate::config::norm_config_trait::{ConfigResult, NormConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::template::IGNORE_GROUP;
use crate::engine::classifier::ClassifierConfig;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

#[async_trait]
impl NormConfigReader for ConfigManager {
    async fn get_narrow_sash_max_width_mm(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(config_keys::NARROW_SASH_MAX_WIDTH_MM, "615")?;
        Ok(value.parse::<f64>().unwrap_or(615.0))
    }

    async fn get_extra_narrow_sash_max_width_mm(&self) -> ConfigResult<f64> {
        let value =
            self.get_config_or_default(config_keys::EXTRA_NARROW_SASH_MAX_WIDTH_MM, "400")?;
        Ok(value.parse::<f64>().unwrap_or(400.0))
    }

    async fn get_ignore_group_tag(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::IGNORE_GROUP_TAG, IGNORE_GROUP)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(IGNORE_GROUP.to_string());
        }
        Ok(trimmed.to_string())
    }

    async fn get_calc_timeout_ms(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::CALC_TIMEOUT_MS, "5000")?;
        Ok(value.parse::<u64>().unwrap_or(5000))
    }

    async fn get_material_catalog(&self) -> ConfigResult<MaterialCatalog> {
        let raw = match self.get_config_value(config_keys::MATERIAL_CATALOG)? {
            Some(v) => v,
            None => return Ok(MaterialCatalog::default()),
        };

        let catalog = serde_json::from_str::<MaterialCatalog>(&raw).unwrap_or_else(|e| {
            tracing::warn!(
                config_key = config_keys::MATERIAL_CATALOG,
                error = %e,
                "物料目录配置格式错误，使用内置目录"
            );
            MaterialCatalog::default()
        });
        Ok(catalog)
    }
}

// ==========================================
// NormSettings - 引擎运行参数快照
// ==========================================
#[derive(Debug, Clone)]
pub struct NormSettings {
    pub classifier: ClassifierConfig,
    pub ignore_group: String,
    pub calc_timeout: Duration,
}

impl Default for NormSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            ignore_group: IGNORE_GROUP.to_string(),
            calc_timeout: Duration::from_millis(5000),
        }
    }
}

impl NormSettings {
    /// 从配置读取器加载全部参数
    pub async fn load<C>(reader: &C) -> ConfigResult<Self>
    where
        C: NormConfigReader + ?Sized,
    {
        let classifier = ClassifierConfig {
            catalog: reader.get_material_catalog().await?,
            narrow_width_mm: reader.get_narrow_sash_max_width_mm().await?,
            extra_narrow_width_mm: reader.get_extra_narrow_sash_max_width_mm().await?,
        };

        Ok(Self {
            classifier,
            ignore_group: reader.get_ignore_group_tag().await?,
            calc_timeout: Duration::from_millis(reader.get_calc_timeout_ms().await?),
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 扇宽度门槛
    pub const NARROW_SASH_MAX_WIDTH_MM: &str = "narrow_sash_max_width_mm";
    pub const EXTRA_NARROW_SASH_MAX_WIDTH_MM: &str = "extra_narrow_sash_max_width_mm";

    // 规则引擎
    pub const IGNORE_GROUP_TAG: &str = "ignore_group_tag";

    // 计算时限
    pub const CALC_TIMEOUT_MS: &str = "calc_timeout_ms";

    // 物料目录 (JSON)
    pub const MATERIAL_CATALOG: &str = "material_catalog";
}

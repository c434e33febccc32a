// ==========================================
// 门窗车间工时定额计算系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{DemOrderApi, NormApi, ReportApi, TemplateApi};
use crate::config::{ConfigManager, NormSettings};
use crate::db::{check_schema_version, init_schema, open_sqlite_connection};
use crate::engine::{NormCalculator, NormDataSource, NormRepositories};
use crate::repository::{
    DemMaterialRepository, DemOrderRepository, DemPriceRepository, NormOrderRepository,
    TemplateRepository, WorkerRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "DEM_NORM_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 工时定额API
    pub norm_api: Arc<NormApi>,

    /// 定额模板API
    pub template_api: Arc<TemplateApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,

    /// dem 订单浏览API
    pub dem_order_api: Arc<DemOrderApi>,

    /// 启动时加载的配置快照
    pub settings: NormSettings,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 建表并检查 schema_version
    /// 2. 从 config_kv 加载配置快照
    /// 3. 初始化 Repository（每个读取仓储独立连接，计算时可并行）
    /// 4. 创建所有API实例
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        {
            let conn = open_sqlite_connection(&db_path)
                .map_err(|e| format!("无法打开数据库: {}", e))?;
            init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
            check_schema_version(&conn)
                .map_err(|e| format!("读取 schema_version 失败: {}", e))?;
        }

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = ConfigManager::new(&db_path)
            .map_err(|e| format!("无法创建ConfigManager: {}", e))?;
        let settings = NormSettings::load(&config_manager)
            .await
            .map_err(|e| format!("加载配置失败: {}", e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let material_repo = Arc::new(
            DemMaterialRepository::new(&db_path)
                .map_err(|e| format!("无法创建DemMaterialRepository: {}", e))?,
        );
        let price_repo = Arc::new(
            DemPriceRepository::new(&db_path)
                .map_err(|e| format!("无法创建DemPriceRepository: {}", e))?,
        );
        let template_repo = Arc::new(
            TemplateRepository::new(&db_path)
                .map_err(|e| format!("无法创建TemplateRepository: {}", e))?,
        );
        let norm_order_repo = Arc::new(
            NormOrderRepository::new(&db_path)
                .map_err(|e| format!("无法创建NormOrderRepository: {}", e))?,
        );
        let worker_repo = Arc::new(
            WorkerRepository::new(&db_path)
                .map_err(|e| format!("无法创建WorkerRepository: {}", e))?,
        );
        let dem_order_repo = Arc::new(
            DemOrderRepository::new(&db_path)
                .map_err(|e| format!("无法创建DemOrderRepository: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        // 计算用模板仓储单独开连接，与管理端写入互不阻塞
        let calc_template_repo = Arc::new(
            TemplateRepository::new(&db_path)
                .map_err(|e| format!("无法创建TemplateRepository: {}", e))?,
        );
        let source: Arc<dyn NormDataSource> = Arc::new(NormRepositories::new(
            material_repo,
            price_repo,
            calc_template_repo,
        ));
        let calculator = NormCalculator::from_settings(source, &settings);

        // ==========================================
        // 创建API实例
        // ==========================================
        let norm_api = Arc::new(NormApi::new(
            calculator,
            norm_order_repo.clone(),
            worker_repo,
            settings.calc_timeout,
        ));
        let template_api = Arc::new(TemplateApi::new(template_repo));
        let report_api = Arc::new(ReportApi::new(norm_order_repo));
        let dem_order_api = Arc::new(DemOrderApi::new(dem_order_repo));

        tracing::info!(
            calc_timeout_ms = settings.calc_timeout.as_millis() as u64,
            ignore_group = %settings.ignore_group,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            norm_api,
            template_api,
            report_api,
            dem_order_api,
            settings,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 DEM_NORM_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dem_norm.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("dem-norm");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("dem_norm.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_app_state_on_fresh_database() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let db_path = file.path().to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).await.unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(state.settings.ignore_group, "ign");
        assert!(state.template_api.list_templates().unwrap().is_empty());
    }
}

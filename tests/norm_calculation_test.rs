// ==========================================
// 工时定额计算 集成测试
// ==========================================
// 测试目标: SQLite 数据源 → 并发读取 → 分类 → 规则计算 全流程
// ==========================================


use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dem_norm::api::{ApiError, CalculateRequest, NormApi};
use dem_norm::app::AppState;
use dem_norm::config::NormSettings;
use dem_norm::domain::material::{Material, SupplementaryFact};
use dem_norm::domain::template::Template;
use dem_norm::engine::{
    EngineError, FetchDataset, NormCalculator, NormDataSource, NormRepositories,
};
use dem_norm::logging;
use dem_norm::repository::{
    DemMaterialRepository, DemPriceRepository, NormOrderRepository, RepositoryError,
    RepositoryResult, TemplateRepository, WorkerRepository,
};
use test_helpers::*;

/// 门订单: 位置1 含 RDRH 合页，位置2 为窗物料
fn seed_door_order(db_path: &str) {
    let conn = open_test_connection(db_path).expect("Failed to open db");
    insert_dem_order(&conn, 7, "ORD-123", 10).expect("Failed to insert order");
    insert_material(&conn, 7, 1, "  Петля роликовая RDRH ", 0.0, 3.0).unwrap();
    insert_material(&conn, 7, 1, "Импост в дверь", 900.0, 1.0).unwrap();
    insert_material(&conn, 7, 2, "Створка Т-образная", 500.0, 2.0).unwrap();
    insert_price_row(&conn, "ORD-123", "Замок дополнительный", 1.0).unwrap();
    insert_template(&conn, &door_template("56", true)).unwrap();
    insert_template(&conn, &door_template("57", false)).unwrap();
    insert_template(&conn, &window_template("w1")).unwrap();
}

fn sqlite_calculator(db_path: &str) -> NormCalculator<NormRepositories> {
    let repos = NormRepositories::new(
        Arc::new(DemMaterialRepository::new(db_path).unwrap()),
        Arc::new(DemPriceRepository::new(db_path).unwrap()),
        Arc::new(TemplateRepository::new(db_path).unwrap()),
    );
    NormCalculator::from_settings(Arc::new(repos), &NormSettings::default())
}

fn request(order_num: &str, position: i32, kind: &str, code: &str, count: u32) -> CalculateRequest {
    CalculateRequest {
        order_num: order_num.to_string(),
        position,
        product_type: kind.to_string(),
        template_code: code.to_string(),
        item_count: count,
    }
}

// ==========================================
// 引擎 + SQLite
// ==========================================

#[tokio::test]
async fn test_door_rdrh_calculation() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let calc = sqlite_calculator(&db_path);
    let result = calc
        .calculate("ORD-123", 1, "door", "56", 2)
        .await
        .expect("calculation should succeed");

    // 只统计位置1，名称去除首尾空白后命中
    assert!(result.context.has_rdrh_hinges);
    assert_eq!(result.context.rdrh_hinges, 3.0);
    assert!(result.context.has_impost);
    assert_eq!(result.context.narrow_sash_615, 0.0);

    let minutes: Vec<f64> = result.operations.iter().map(|op| op.minutes).collect();
    assert_eq!(minutes, vec![60.0, 27.0, 15.0]);
    assert_eq!(result.operations[0].value, 20.0);
}

#[tokio::test]
async fn test_window_narrow_sash_rule() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let calc = sqlite_calculator(&db_path);
    let result = calc.calculate("ORD-123", 2, "window", "w1", 1).await.unwrap();

    assert_eq!(result.context.narrow_sash_615, 2.0);
    assert_eq!(result.operations[0].minutes, 12.0);
    assert_eq!(result.operations[1].minutes, 20.0);
    assert_eq!(result.operations[1].value, 2.0);
}

#[tokio::test]
async fn test_inactive_template_not_found() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let calc = sqlite_calculator(&db_path);
    let err = calc.calculate("ORD-123", 1, "door", "57", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::TemplateNotFound { ref code } if code == "57"));
}

#[tokio::test]
async fn test_unknown_order_fails_materials_fetch() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let calc = sqlite_calculator(&db_path);
    let err = calc.calculate("ORD-404", 1, "door", "56", 1).await.unwrap_err();
    match err {
        EngineError::UpstreamFetchFailed {
            dataset, order_num, ..
        } => {
            assert_eq!(dataset, FetchDataset::Materials);
            assert_eq!(order_num, "ORD-404");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_production_order_is_ignored() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_dem_order(&conn, 8, "ORD-900", 20).unwrap();
    insert_template(&conn, &door_template("56", true)).unwrap();

    let calc = sqlite_calculator(&db_path);
    let err = calc.calculate("ORD-900", 1, "door", "56", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::UpstreamFetchFailed { .. }));
}

#[tokio::test]
async fn test_order_without_materials_uses_base_template() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let calc = sqlite_calculator(&db_path);
    let result = calc.calculate("ORD-123", 5, "door", "56", 1).await.unwrap();
    assert!(!result.context.has_rdrh_hinges);
    let minutes: Vec<f64> = result.operations.iter().map(|op| op.minutes).collect();
    assert_eq!(minutes, vec![30.0, 9.0, 15.0]);
}

// ==========================================
// NormApi（经 AppState 装配）
// ==========================================

#[tokio::test]
async fn test_norm_api_calculate_via_app_state() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_door_order(&db_path);

    let state = AppState::new(db_path).await.expect("AppState should init");
    let result = state
        .norm_api
        .calculate(request("ORD-123", 1, "door", "56", 2))
        .await
        .unwrap();
    assert_eq!(result.operations[1].minutes, 27.0);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("operation").is_some());
    assert_eq!(json["context"]["HasPetliRDRH"], serde_json::json!(true));
}

#[tokio::test]
async fn test_norm_api_input_validation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).await.unwrap();

    let err = state
        .norm_api
        .calculate(request("ORD-123", 1, "door", "56", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .norm_api
        .calculate(request("  ", 1, "door", "56", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .norm_api
        .calculate(request("ORD-123", 0, "door", "56", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .norm_api
        .calculate(request("ORD-123", 1, "vitrage", "56", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UnknownProductType(ref t) if t == "vitrage"));
}

// ==========================================
// 时限
// ==========================================

/// 永不返回物料的数据源
struct StalledSource;

#[async_trait]
impl NormDataSource for StalledSource {
    async fn get_materials(&self, _order_num: &str, _position: i32) -> RepositoryResult<Vec<Material>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn get_template(&self, _code: &str) -> RepositoryResult<Template> {
        Ok(door_template("56", true))
    }

    async fn get_supplementary_facts(&self, _order_num: &str) -> RepositoryResult<Vec<SupplementaryFact>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_calculation_deadline() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let source: Arc<dyn NormDataSource> = Arc::new(StalledSource);
    let api = NormApi::new(
        NormCalculator::from_settings(source, &NormSettings::default()),
        Arc::new(NormOrderRepository::new(&db_path).unwrap()),
        Arc::new(WorkerRepository::new(&db_path).unwrap()),
        Duration::from_millis(50),
    );

    let err = api
        .calculate(request("ORD-123", 1, "door", "56", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout { timeout_ms: 50 }));
}

/// 物料与模板读取很慢，报价单附注读取立即失败
struct FailingFactsSource;

#[async_trait]
impl NormDataSource for FailingFactsSource {
    async fn get_materials(&self, _order_num: &str, _position: i32) -> RepositoryResult<Vec<Material>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn get_template(&self, _code: &str) -> RepositoryResult<Template> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(door_template("56", true))
    }

    async fn get_supplementary_facts(&self, _order_num: &str) -> RepositoryResult<Vec<SupplementaryFact>> {
        Err(RepositoryError::DatabaseQueryError("dem_price недоступна".to_string()))
    }
}

#[tokio::test]
async fn test_first_fetch_failure_aborts_siblings() {
    let source: Arc<dyn NormDataSource> = Arc::new(FailingFactsSource);
    let calc = NormCalculator::from_settings(source, &NormSettings::default());

    let started = Instant::now();
    let err = calc
        .calculate("ORD-123", 1, "door", "56", 1)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        EngineError::UpstreamFetchFailed { dataset, .. } => {
            assert_eq!(dataset, FetchDataset::SupplementaryFacts);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(
        elapsed < Duration::from_secs(1),
        "siblings were awaited: {:?}",
        elapsed
    );
}

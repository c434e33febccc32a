// ==========================================
// dem 订单浏览 集成测试
// ==========================================
// 测试目标: 按月 / 按片段列订单，位置明细合并
// ==========================================


use std::sync::Arc;

use dem_norm::api::{ApiError, DemOrderApi};
use dem_norm::domain::DemOrderFilter;
use dem_norm::repository::DemOrderRepository;
use test_helpers::*;

const APR_1_2025: i64 = 1_743_465_600;
const APR_15_2025: i64 = APR_1_2025 + 14 * 86_400;
const MAY_1_2025: i64 = APR_1_2025 + 30 * 86_400;

fn create_api(db_path: &str) -> DemOrderApi {
    DemOrderApi::new(Arc::new(
        DemOrderRepository::new(db_path).expect("Failed to create DemOrderRepository"),
    ))
}

fn seed_orders(db_path: &str) {
    let conn = open_test_connection(db_path).expect("Failed to open db");
    insert_dem_order_created(&conn, 1, "Q6-0401", 10, APR_1_2025).unwrap();
    insert_dem_order_created(&conn, 2, "Q6-0415", 10, APR_15_2025).unwrap();
    insert_dem_order_created(&conn, 3, "Q6-0331", 10, APR_1_2025 - 1).unwrap();
    insert_dem_order_created(&conn, 4, "Q6-0501", 10, MAY_1_2025).unwrap();
    // 非生产订单不出现在列表中
    insert_dem_order_created(&conn, 5, "Q6-0410", 20, APR_15_2025).unwrap();
}

fn month(year: i32, month: u32) -> DemOrderFilter {
    DemOrderFilter {
        year: Some(year),
        month: Some(month),
        search: None,
    }
}

#[test]
fn test_list_orders_by_month() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_orders(&db_path);
    let api = create_api(&db_path);

    let nums: Vec<String> = api
        .list_orders(&month(2025, 4))
        .unwrap()
        .into_iter()
        .map(|o| o.order_num)
        .collect();
    assert_eq!(nums, vec!["Q6-0401".to_string(), "Q6-0415".to_string()]);

    let may = api.list_orders(&month(2025, 5)).unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].creator, "manager");
    assert_eq!(may[0].ms_note, "");
}

#[test]
fn test_search_ignores_month() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_orders(&db_path);
    let api = create_api(&db_path);

    let filter = DemOrderFilter {
        year: Some(2024),
        month: Some(1),
        search: Some(" 04 ".to_string()),
    };
    let nums: Vec<String> = api
        .list_orders(&filter)
        .unwrap()
        .into_iter()
        .map(|o| o.order_num)
        .collect();
    assert_eq!(nums, vec!["Q6-0401".to_string(), "Q6-0415".to_string()]);
}

#[test]
fn test_list_orders_validation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    let missing_month = DemOrderFilter {
        year: Some(2025),
        ..Default::default()
    };
    assert!(matches!(
        api.list_orders(&missing_month),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.list_orders(&month(2025, 13)),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_order_details_grouped_by_position_and_type() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_orders(&db_path);
    let conn = open_test_connection(&db_path).unwrap();
    insert_plan_row(&conn, 1, 2, 3, "Дверь", 2.0, 1.0).unwrap();
    insert_plan_row(&conn, 1, 1, 1, "Окно", 1.5, 1.0).unwrap();
    insert_plan_row(&conn, 1, 1, 1, "Окно", 0.5, 2.0).unwrap();
    insert_plan_row(&conn, 1, 1, 17, "Подоконник", 9.0, 9.0).unwrap();
    insert_plan_row(&conn, 1, 1, 18, "Отлив", 9.0, 9.0).unwrap();

    let api = create_api(&db_path);
    let positions = api.get_order_details("Q6-0401").unwrap();
    assert_eq!(positions.len(), 2);

    assert_eq!(positions[0].position, 1);
    assert_eq!(positions[0].name_position, "Окно");
    assert_eq!(positions[0].sqr, 2.0);
    assert_eq!(positions[0].count, 3.0);
    assert_eq!(positions[0].customer, "ООО Тест");
    assert_eq!(positions[1].position, 2);

    assert!(api.get_order_details("Q6-9999").unwrap().is_empty());
    assert!(matches!(
        api.get_order_details(" "),
        Err(ApiError::InvalidInput(_))
    ));
}

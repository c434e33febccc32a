// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取、默认值与覆写
// ==========================================


use std::time::Duration;

use dem_norm::config::{config_keys, ConfigManager, NormConfigReader, NormSettings};
use dem_norm::domain::material::Material;
use dem_norm::domain::types::ProductType;
use dem_norm::engine::MaterialClassifier;
use test_helpers::{create_test_db, insert_test_config, open_test_connection};

#[tokio::test]
async fn test_defaults_on_empty_config() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config_manager.get_narrow_sash_max_width_mm().await.unwrap(), 615.0);
    assert_eq!(
        config_manager.get_extra_narrow_sash_max_width_mm().await.unwrap(),
        400.0
    );
    assert_eq!(config_manager.get_ignore_group_tag().await.unwrap(), "ign");
    assert_eq!(config_manager.get_calc_timeout_ms().await.unwrap(), 5000);

    let settings = NormSettings::load(&config_manager).await.unwrap();
    assert_eq!(settings.calc_timeout, Duration::from_millis(5000));
    assert!(settings
        .classifier
        .catalog
        .rdrh_hinges
        .contains("Петля роликовая RDRH"));
}

#[tokio::test]
async fn test_overrides_from_config_kv() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::NARROW_SASH_MAX_WIDTH_MM, "700").unwrap();
    insert_test_config(&conn, config_keys::IGNORE_GROUP_TAG, " fixed ").unwrap();
    insert_test_config(&conn, config_keys::CALC_TIMEOUT_MS, "250").unwrap();

    let config_manager = ConfigManager::new(&db_path).unwrap();
    let settings = NormSettings::load(&config_manager).await.unwrap();

    assert_eq!(settings.classifier.narrow_width_mm, 700.0);
    assert_eq!(settings.classifier.extra_narrow_width_mm, 400.0);
    assert_eq!(settings.ignore_group, "fixed");
    assert_eq!(settings.calc_timeout, Duration::from_millis(250));
}

#[tokio::test]
async fn test_invalid_values_fall_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(config_keys::CALC_TIMEOUT_MS, "soon")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MATERIAL_CATALOG, "{not json")
        .unwrap();

    assert_eq!(config_manager.get_calc_timeout_ms().await.unwrap(), 5000);
    let catalog = config_manager.get_material_catalog().await.unwrap();
    assert!(catalog.impost.contains("Импост"));
}

#[tokio::test]
async fn test_catalog_override_changes_classification() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    config_manager
        .set_global_config_value(
            config_keys::MATERIAL_CATALOG,
            r#"{"rdrh_hinges": ["Петля RDRH новая"]}"#,
        )
        .unwrap();
    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::MATERIAL_CATALOG)
            .unwrap()
            .as_deref(),
        Some(r#"{"rdrh_hinges": ["Петля RDRH новая"]}"#)
    );

    let settings = NormSettings::load(&config_manager).await.unwrap();
    let classifier = MaterialClassifier::new(settings.classifier);

    let hinge = |name: &str| Material {
        order_id: 1,
        position: 1,
        article: "A".to_string(),
        name: name.to_string(),
        width_mm: 0.0,
        height_mm: 0.0,
        count: 2.0,
        field: None,
    };

    let ctx = classifier.classify(&[hinge("Петля RDRH новая")], &[], ProductType::Door);
    assert!(ctx.has_rdrh_hinges);

    let ctx = classifier.classify(&[hinge("Петля роликовая RDRH")], &[], ProductType::Door);
    assert!(!ctx.has_rdrh_hinges);

    // 未覆写的族保留内置名称
    let ctx = classifier.classify(&[hinge("Импост")], &[], ProductType::Door);
    assert!(ctx.has_impost);
}

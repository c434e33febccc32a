// ==========================================
// TemplateApi 集成测试
// ==========================================
// 测试目标: 模板查询 / 管理端增改 / 规则告警
// ==========================================


use std::sync::Arc;

use dem_norm::api::{ApiError, TemplateApi};
use dem_norm::domain::template::ConditionValue;
use dem_norm::engine::RuleWarningKind;
use dem_norm::repository::TemplateRepository;
use dem_norm::{Rule, RuleMode};
use test_helpers::*;

fn create_api(db_path: &str) -> TemplateApi {
    TemplateApi::new(Arc::new(
        TemplateRepository::new(db_path).expect("Failed to create TemplateRepository"),
    ))
}

#[test]
fn test_create_and_read_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    let warnings = api.create_template(door_template("56", true)).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);

    let loaded = api.get_template("56").unwrap();
    assert!(loaded.id > 0);
    assert_eq!(loaded.name, "Дверь алюминиевая");
    assert_eq!(loaded.operations.len(), 3);
    assert_eq!(loaded.operations[2].group, "ign");
    assert_eq!(loaded.rules, door_template("56", true).rules);
}

#[test]
fn test_inactive_template_visible_only_to_admin() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    api.create_template(door_template("56", true)).unwrap();
    api.create_template(door_template("57", false)).unwrap();

    assert!(matches!(api.get_template("57"), Err(ApiError::NotFound(_))));
    assert!(!api.get_template_admin("57").unwrap().is_active);

    let active: Vec<String> = api
        .list_templates()
        .unwrap()
        .into_iter()
        .map(|t| t.code)
        .collect();
    assert_eq!(active, vec!["56".to_string()]);
    assert_eq!(api.list_templates_admin().unwrap().len(), 2);
}

#[test]
fn test_duplicate_code_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    api.create_template(door_template("56", true)).unwrap();
    let err = api.create_template(door_template("56", true)).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
}

#[test]
fn test_update_template() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);
    api.create_template(door_template("56", true)).unwrap();

    let mut template = door_template("56", false);
    template.name = "Дверь (архив)".to_string();
    api.update_template(template).unwrap();

    let loaded = api.get_template_admin("56").unwrap();
    assert_eq!(loaded.name, "Дверь (архив)");
    assert!(!loaded.is_active);

    let err = api.update_template(door_template("99", true)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_input_validation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    let mut template = door_template("56", true);
    template.name = " ".to_string();
    assert!(matches!(
        api.create_template(template),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.create_template(door_template("", true)),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(api.get_template(""), Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_typo_rules_saved_with_warnings() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = create_api(&db_path);

    let mut template = door_template("56", true);
    template.rules.push(
        Rule::new("адаптер", RuleMode::Additive)
            .when("HasPetliRDRX", ConditionValue::Flag(true))
            .per_unit(0.0, 5.0),
    );

    let warnings = api.create_template(template).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].rule_index, 1);
    assert_eq!(
        warnings[0].kind,
        RuleWarningKind::UnknownConditionField {
            field: "HasPetliRDRX".to_string()
        }
    );

    // 告警不阻止保存
    assert_eq!(api.get_template("56").unwrap().rules.len(), 2);
}

#[test]
fn test_stored_json_shape_is_readable() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    conn.execute(
        r#"
        INSERT INTO dem_templates_al (code, name, operations, rules, is_active)
        VALUES ('70', 'Глухарь', ?1, ?2, 1)
        "#,
        rusqlite::params![
            r#"[{"name":"остекление","type":"","count":1,"label":"Остекление","value":1,"minutes":20,"required":true,"group":""}]"#,
            r#"[{"operation":"остекление","condition":{"HasImpost":true},"mode":"additive","value":0,"minutes":0,"value_per_unit":0,"minutes_per_unit":6}]"#,
        ],
    )
    .unwrap();

    let api = create_api(&db_path);
    let template = api.get_template("70").unwrap();
    assert_eq!(template.operations[0].label, "Остекление");
    assert_eq!(template.rules[0].mode, RuleMode::Additive);
    assert_eq!(template.rules[0].minutes_per_unit, 6.0);
}

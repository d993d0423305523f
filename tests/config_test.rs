// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证引擎参数读取、回退与快照
// ==========================================


use line_capacity_sim::config::{config_keys, ConfigManager, EngineSettings, SimulationConfigReader};
use line_capacity_sim::domain::types::Granularity;
use test_helpers::{create_test_db, insert_config, insert_test_config, open_test_connection};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_defaults_when_config_kv_is_empty() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let settings = EngineSettings::load(&config_manager)
        .await
        .expect("Should load settings");
    assert_eq!(settings, EngineSettings::default());
    assert_eq!(settings.weekly_probe_offset_days, 3);
    assert_eq!(settings.max_simulation_days, 1100);
    assert_eq!(settings.default_granularity, Granularity::Week);
}

#[tokio::test]
async fn test_custom_values_are_loaded() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn).expect("Failed to insert test config");

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let settings = EngineSettings::load(&config_manager)
        .await
        .expect("Should load settings");

    assert_eq!(settings.weekly_probe_offset_days, 0);
    assert_eq!(settings.seasonality_fallback_years, 2);
    assert_eq!(settings.uniform_weeks_per_year, 53);
    assert_eq!(settings.max_simulation_days, 400);
    assert_eq!(settings.default_granularity, Granularity::Day);
}

#[tokio::test]
async fn test_malformed_values_fall_back_to_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_config(&conn, config_keys::SEASONALITY_FALLBACK_YEARS, "many").unwrap();
    insert_config(&conn, config_keys::MAX_SIMULATION_DAYS, "").unwrap();
    insert_config(&conn, config_keys::DEFAULT_GRANULARITY, "MONTH").unwrap();

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config_manager.get_seasonality_fallback_years().await.unwrap(),
        4
    );
    assert_eq!(config_manager.get_max_simulation_days().await.unwrap(), 1100);
    assert_eq!(
        config_manager.get_default_granularity().await.unwrap(),
        Granularity::Week
    );
}

#[tokio::test]
async fn test_probe_offset_is_clamped_and_zero_weeks_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_config(&conn, config_keys::WEEKLY_PROBE_OFFSET_DAYS, "12").unwrap();
    insert_config(&conn, config_keys::UNIFORM_WEEKS_PER_YEAR, "0").unwrap();

    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config_manager.get_weekly_probe_offset_days().await.unwrap(), 6);
    assert_eq!(config_manager.get_uniform_weeks_per_year().await.unwrap(), 52);
}

#[tokio::test]
async fn test_set_and_snapshot() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::MAX_SIMULATION_DAYS)
            .unwrap(),
        None
    );

    config_manager
        .set_global_config_value(config_keys::MAX_SIMULATION_DAYS, "730")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::MAX_SIMULATION_DAYS, "365")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_GRANULARITY, "DAY")
        .unwrap();

    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::MAX_SIMULATION_DAYS)
            .unwrap()
            .as_deref(),
        Some("365")
    );

    let snapshot: serde_json::Value =
        serde_json::from_str(&config_manager.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot["max_simulation_days"], "365");
    assert_eq!(snapshot["default_granularity"], "DAY");
}

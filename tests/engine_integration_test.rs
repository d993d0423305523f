// ==========================================
// 引擎集成测试
// ==========================================
// 职责: 通过编排器公开接口验证多个引擎之间的协作
// 场景: 循环覆写 → 产能, 需求调整 → 利用率, 季节性回溯 → 虚拟需求
// ==========================================

mod helpers;

use chrono::NaiveDate;
use helpers::mock_config::MockConfig;
use helpers::test_data_builder::{
    client, shift, weekly_forecasts, LineBuilder, OverrideBuilder, ProductBuilder,
};
use line_capacity_sim::config::EngineSettings;
use line_capacity_sim::domain::{
    ConfigSource, DemandModification, Granularity, LabForecast, LabLine, LabProduct,
    LabSimulationRequest, LineSimulationRequest, SimulationReport, SimulationRequest, Utilization,
};
use line_capacity_sim::engine::{EngineError, SimulationOrchestrator};
use line_capacity_sim::repository::InMemorySimulationRepository;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// L1 (周产能 64000) + P1, ACME 每周 48000, BETA 每周 16000
fn base_repo() -> InMemorySimulationRepository {
    let mut repo = InMemorySimulationRepository::new()
        .with_shift_configuration(shift(1, 2, 8.0))
        .with_line(LineBuilder::new(1).build())
        .with_product(ProductBuilder::new(1, "P1").on_line(1).build())
        .with_client(client(1, "ACME"))
        .with_client(client(2, "BETA"));
    for f in weekly_forecasts(1, 1, d(2025, 3, 3), 4, 48000.0)
        .into_iter()
        .chain(weekly_forecasts(2, 1, d(2025, 3, 3), 4, 16000.0))
    {
        repo = repo.with_forecast(f);
    }
    repo
}

fn orchestrator(repo: InMemorySimulationRepository, settings: EngineSettings) -> SimulationOrchestrator {
    line_capacity_sim::logging::init_test();
    SimulationOrchestrator::new(Arc::new(repo), settings)
}

fn line_request(client_codes: Vec<&str>) -> LineSimulationRequest {
    LineSimulationRequest {
        line_ids: vec![1],
        shift_configs: vec![],
        start_date: d(2025, 3, 3),
        end_date: d(2025, 3, 30),
        granularity: Some(Granularity::Week),
        client_codes: client_codes.into_iter().map(String::from).collect(),
        product_code: None,
        product_filter: None,
        overlay_client_codes: vec![],
        demand_modifications: vec![],
    }
}

fn completed(orch: &SimulationOrchestrator, request: SimulationRequest) -> SimulationReport {
    orch.run(&request)
        .expect("simulation should succeed")
        .into_report()
        .expect("simulation should produce a report")
}

fn utilizations(report: &SimulationReport) -> Vec<Utilization> {
    report.data_points.iter().map(|p| p.utilization).collect()
}

// ==========================================
// 循环覆写 → 产能
// ==========================================

#[test]
fn test_biweekly_override_alternates_capacity() {
    let repo = base_repo().with_override(
        OverrideBuilder::new(1, 1, d(2025, 3, 3), d(2025, 3, 30))
            .shifts(3, 8.0)
            .every_weeks(2)
            .reason("隔周三班")
            .build(),
    );
    let orch = orchestrator(repo, EngineSettings::default());

    let report = completed(&orch, SimulationRequest::Line(line_request(vec![])));

    let capacities: Vec<f64> = report.data_points.iter().map(|p| p.capacity).collect();
    assert_eq!(capacities, vec![96000.0, 64000.0, 96000.0, 64000.0]);

    let flags: Vec<bool> = report.data_points.iter().map(|p| p.has_override).collect();
    assert_eq!(flags, vec![true, false, true, false]);

    // 需求 64000 / 周
    assert_eq!(
        utilizations(&report),
        vec![
            Utilization::Defined(66.7),
            Utilization::Defined(100.0),
            Utilization::Defined(66.7),
            Utilization::Defined(100.0)
        ]
    );
    assert_eq!(report.summary.peak_utilization, 100.0);
    assert_eq!(report.summary.over_capacity_period_count, 0);
}

#[test]
fn test_line_config_details_report_override_source() {
    let repo = base_repo().with_override(
        OverrideBuilder::new(1, 1, d(2025, 3, 10), d(2025, 3, 16))
            .shifts(3, 8.0)
            .weekend(true, false)
            .reason("旺季")
            .build(),
    );
    let orch = orchestrator(repo, EngineSettings::default());

    let inside = orch.line_config_details(&[1], d(2025, 3, 12)).unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].source, ConfigSource::Override);
    assert_eq!(inside[0].config_display.as_deref(), Some("3x8 S"));
    assert_eq!(inside[0].reason.as_deref(), Some("旺季"));
    // 1000 × 0.8 × 3 × 8 × 6
    assert_eq!(inside[0].weekly_capacity, 115200.0);

    let outside = orch.line_config_details(&[1], d(2025, 3, 19)).unwrap();
    assert_eq!(outside[0].source, ConfigSource::Default);
    assert_eq!(outside[0].weekly_capacity, 64000.0);
}

// ==========================================
// 需求调整 → 利用率
// ==========================================

#[test]
fn test_modifications_apply_in_order_with_removal() {
    let orch = orchestrator(base_repo(), EngineSettings::default());

    let mut request = line_request(vec![]);
    request.demand_modifications = vec![
        DemandModification {
            client_id: 2,
            product_id: None,
            start_date: d(2025, 3, 3),
            end_date: d(2025, 3, 30),
            percentage: 50.0,
        },
        DemandModification {
            client_id: 1,
            product_id: Some(1),
            start_date: d(2025, 3, 10),
            end_date: d(2025, 3, 16),
            percentage: -100.0,
        },
        // 移除同时抵消此前的 +50%
        DemandModification {
            client_id: 2,
            product_id: None,
            start_date: d(2025, 3, 24),
            end_date: d(2025, 3, 30),
            percentage: -100.0,
        },
    ];

    let report = completed(&orch, SimulationRequest::Line(request));
    let demands: Vec<f64> = report.data_points.iter().map(|p| p.demand).collect();
    assert_eq!(demands, vec![72000.0, 24000.0, 72000.0, 48000.0]);

    assert_eq!(report.summary.over_capacity_period_count, 2);
    assert_eq!(report.summary.peak_utilization, 112.5);
    assert_eq!(report.summary.average_utilization, 84.4);
}

#[test]
fn test_modification_outside_client_filter_is_ignored() {
    let orch = orchestrator(base_repo(), EngineSettings::default());

    let mut request = line_request(vec!["acme"]);
    request.demand_modifications = vec![DemandModification {
        client_id: 2,
        product_id: None,
        start_date: d(2025, 3, 3),
        end_date: d(2025, 3, 30),
        percentage: 200.0,
    }];

    let report = completed(&orch, SimulationRequest::Line(request));
    assert!(report.data_points.iter().all(|p| p.demand == 48000.0));
    assert_eq!(report.summary.average_utilization, 75.0);
}

// ==========================================
// 季节性回溯 → 虚拟需求
// ==========================================

/// 参考产品只有 2021 年的历史: W10-W13 各占全年 25%
fn lab_repo() -> InMemorySimulationRepository {
    let mut repo = InMemorySimulationRepository::new()
        .with_shift_configuration(shift(1, 2, 8.0))
        .with_product(ProductBuilder::new(1, "P1").build())
        .with_lab_line(LabLine {
            id: 1,
            code: "LAB1".to_string(),
            name: "虚拟一号线".to_string(),
            base_capacity_per_hour: 500.0,
            efficiency_factor: 1.0,
            shift_config: Some(shift(1, 2, 8.0)),
        })
        .with_lab_product(LabProduct {
            id: 1,
            code: "XP1".to_string(),
            name: "试验产品".to_string(),
            default_line_id: None,
            lab_default_line_id: Some(1),
        })
        .with_lab_forecast(LabForecast {
            id: 1,
            lab_client_id: Some(1),
            client_id: None,
            lab_product_id: Some(1),
            product_id: None,
            reference_product_id: Some(1),
            annual_quantity: 52000.0,
            start_date: d(2025, 1, 1),
            end_date: d(2025, 12, 31),
        });
    for f in weekly_forecasts(1, 1, d(2021, 3, 8), 4, 25.0) {
        repo = repo.with_forecast(f);
    }
    repo
}

fn lab_request() -> LabSimulationRequest {
    LabSimulationRequest {
        line_ids: vec![],
        lab_line_ids: vec![1],
        shift_configs: vec![],
        start_date: d(2025, 3, 3),
        end_date: d(2025, 3, 30),
        granularity: Some(Granularity::Week),
        include_lab_forecasts: true,
        client_codes: vec![],
        product_code: None,
        product_filter: None,
        demand_modifications: vec![],
    }
}

#[test]
fn test_lab_demand_walks_back_to_older_history() {
    let orch = orchestrator(lab_repo(), EngineSettings::default());

    let report = completed(&orch, SimulationRequest::Lab(lab_request()));
    for p in &report.data_points {
        assert_eq!(p.lab_demand, Some(13000.0));
        assert_eq!(p.lab_capacity, Some(40000.0));
        assert_eq!(p.real_capacity, Some(0.0));
        assert_eq!(p.utilization, Utilization::Defined(32.5));
    }
    let totals = report.lab_totals.expect("lab totals");
    assert_eq!(totals.total_lab_demand, 52000.0);
    assert_eq!(totals.total_real_demand, 0.0);
}

#[tokio::test]
async fn test_lab_demand_uniform_when_history_is_too_old() {
    let mut config = MockConfig::default();
    config.seasonality_fallback_years = 3;
    let settings = EngineSettings::load(&config).await.unwrap();
    let orch = orchestrator(lab_repo(), settings);

    let report = completed(&orch, SimulationRequest::Lab(lab_request()));
    for p in &report.data_points {
        let lab = p.lab_demand.unwrap();
        assert!((lab - 1000.0).abs() < 1e-6, "均匀份额 1/52, 实际 {}", lab);
    }
}

#[test]
fn test_lab_forecasts_can_be_excluded() {
    let orch = orchestrator(lab_repo(), EngineSettings::default());

    let mut request = lab_request();
    request.include_lab_forecasts = false;
    let report = completed(&orch, SimulationRequest::Lab(request));
    assert!(report.data_points.iter().all(|p| p.demand == 0.0));
    assert_eq!(report.summary.average_utilization, 0.0);
}

// ==========================================
// 请求约束
// ==========================================

#[tokio::test]
async fn test_range_limit_comes_from_settings() {
    let settings = EngineSettings::load(&MockConfig::default().with_max_days(30))
        .await
        .unwrap();
    let orch = orchestrator(base_repo(), settings);

    let mut request = line_request(vec![]);
    request.end_date = d(2025, 4, 30);
    let err = orch.run(&SimulationRequest::Line(request)).unwrap_err();
    assert!(
        matches!(err, EngineError::RangeTooLong { days: 59, max_days: 30 }),
        "unexpected error: {:?}",
        err
    );

    // 恰好等于上限的跨度可以运行
    let mut request = line_request(vec![]);
    request.end_date = d(2025, 4, 1);
    assert!(orch.run(&SimulationRequest::Line(request)).is_ok());
}

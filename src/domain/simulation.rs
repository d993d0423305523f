// ==========================================
// 产线产能模拟 - 模拟请求/结果 DTO
// ==========================================
// 职责: 五种模拟模式的输入与逐桶输出
// 序列化: serde (CLI 读写 JSON)
// ==========================================

use crate::domain::catalog::ProductFilter;
use crate::domain::forecast::DemandModification;
use crate::domain::types::{ConfigSource, EmptyScopeReason, Granularity, ScenarioMode, Utilization};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// 请求
// ==========================================

/// 单条产线的班次选择
///
/// - use_override = true: 按日期解析（覆写/默认），忽略 shift_config_id
/// - shift_config_id 有值: 整个区间强制使用该班次；不存在时回退日期解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineShiftSelection {
    pub line_id: i64,
    #[serde(default)]
    pub shift_config_id: Option<i64>,
    #[serde(default)]
    pub use_override: bool,
}

/// 产线模拟
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSimulationRequest {
    pub line_ids: Vec<i64>,
    #[serde(default)]
    pub shift_configs: Vec<LineShiftSelection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    /// 多客户合并: 各客户独立汇总后相加
    #[serde(default)]
    pub client_codes: Vec<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_filter: Option<ProductFilter>,
    #[serde(default)]
    pub overlay_client_codes: Vec<String>,
    #[serde(default)]
    pub demand_modifications: Vec<DemandModification>,
}

/// 模拟分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySimulationRequest {
    pub category_id: i64,
    #[serde(default)]
    pub shift_configs: Vec<LineShiftSelection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    /// 同产线模式: 多客户各自汇总后相加
    #[serde(default)]
    pub client_codes: Vec<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub overlay_client_codes: Vec<String>,
    #[serde(default)]
    pub demand_modifications: Vec<DemandModification>,
}

/// 新客户: 基线 + 每周固定注入量 - 可选移除客户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClientSimulationRequest {
    pub line_ids: Vec<i64>,
    #[serde(default)]
    pub shift_configs: Vec<LineShiftSelection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    pub new_client_demand: f64,
    #[serde(default)]
    pub remove_client_id: Option<i64>,
}

/// 流失客户: 基线 - 该客户需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostClientSimulationRequest {
    pub line_ids: Vec<i64>,
    #[serde(default)]
    pub shift_configs: Vec<LineShiftSelection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    pub lost_client_id: i64,
}

fn default_true() -> bool {
    true
}

/// 实验室: 真实产能 + 虚拟产能, 真实需求 + 虚拟需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSimulationRequest {
    #[serde(default)]
    pub line_ids: Vec<i64>,
    #[serde(default)]
    pub lab_line_ids: Vec<i64>,
    #[serde(default)]
    pub shift_configs: Vec<LineShiftSelection>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    #[serde(default = "default_true")]
    pub include_lab_forecasts: bool,
    #[serde(default)]
    pub client_codes: Vec<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_filter: Option<ProductFilter>,
    #[serde(default)]
    pub demand_modifications: Vec<DemandModification>,
}

/// 模拟请求（按 mode 标签区分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationRequest {
    Line(LineSimulationRequest),
    Category(CategorySimulationRequest),
    NewClient(NewClientSimulationRequest),
    LostClient(LostClientSimulationRequest),
    Lab(LabSimulationRequest),
}

impl SimulationRequest {
    pub fn mode(&self) -> ScenarioMode {
        match self {
            SimulationRequest::Line(_) => ScenarioMode::Line,
            SimulationRequest::Category(_) => ScenarioMode::Category,
            SimulationRequest::NewClient(_) => ScenarioMode::NewClient,
            SimulationRequest::LostClient(_) => ScenarioMode::LostClient,
            SimulationRequest::Lab(_) => ScenarioMode::Lab,
        }
    }

    /// (start_date, end_date, granularity)
    pub fn window(&self) -> (NaiveDate, NaiveDate, Option<Granularity>) {
        match self {
            SimulationRequest::Line(r) => (r.start_date, r.end_date, r.granularity),
            SimulationRequest::Category(r) => (r.start_date, r.end_date, r.granularity),
            SimulationRequest::NewClient(r) => (r.start_date, r.end_date, r.granularity),
            SimulationRequest::LostClient(r) => (r.start_date, r.end_date, r.granularity),
            SimulationRequest::Lab(r) => (r.start_date, r.end_date, r.granularity),
        }
    }

    pub fn demand_modifications(&self) -> &[DemandModification] {
        match self {
            SimulationRequest::Line(r) => &r.demand_modifications,
            SimulationRequest::Category(r) => &r.demand_modifications,
            SimulationRequest::Lab(r) => &r.demand_modifications,
            SimulationRequest::NewClient(_) | SimulationRequest::LostClient(_) => &[],
        }
    }
}

// ==========================================
// 结果
// ==========================================

/// 单个时间桶的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String, // "W12/2025" 或 "2025-03-17"
    pub bucket_start: NaiveDate,
    pub demand: f64,
    pub capacity: f64,
    pub utilization: Utilization,
    pub over_capacity: bool,
    pub has_override: bool,

    // ===== 模式相关字段 =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_client_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_utilization: Option<Utilization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_capacity: Option<f64>,
}

impl DataPoint {
    /// 基础数据点（模式字段为空）
    pub fn new(
        label: String,
        bucket_start: NaiveDate,
        demand: f64,
        capacity: f64,
        has_override: bool,
    ) -> Self {
        let utilization = Utilization::compute(demand, capacity);
        Self {
            label,
            bucket_start,
            demand,
            capacity,
            utilization: utilization.rounded(),
            over_capacity: utilization.is_over_capacity(),
            has_override,
            overlay_demand: None,
            base_demand: None,
            new_client_demand: None,
            removed_demand: None,
            lost_demand: None,
            original_utilization: None,
            real_demand: None,
            lab_demand: None,
            real_capacity: None,
            lab_capacity: None,
        }
    }
}

/// 叠加曲线中的单点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub label: String,
    pub bucket_start: NaiveDate,
    pub demand: f64,
}

/// 按客户代码的叠加曲线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOverlay {
    pub client_id: i64,
    pub client_name: String,
    pub data_points: Vec<OverlayPoint>,
    pub total_demand: f64,
}

/// 叠加元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_client_weekly_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lost_demand: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freed_capacity_percent: Option<f64>,
}

impl OverlayData {
    pub fn is_empty(&self) -> bool {
        *self == OverlayData::default()
    }
}

/// 汇总统计（只统计利用率有定义的桶）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub average_utilization: f64,
    pub peak_utilization: f64,
    pub over_capacity_period_count: usize,
    pub total_capacity: f64,
    pub total_demand: f64,
    /// 无产能桶数（利用率无定义）
    pub undefined_period_count: usize,
    /// 落在无产能桶中的需求
    pub unserved_demand: f64,
}

/// 实验室模式分项合计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabTotals {
    pub total_real_capacity: f64,
    pub total_lab_capacity: f64,
    pub total_real_demand: f64,
    pub total_lab_demand: f64,
}

/// 一次模拟的完整输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub mode: ScenarioMode,
    pub granularity: Granularity,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub summary: SimulationSummary,
    pub data_points: Vec<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_data: Option<OverlayData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client_overlays: BTreeMap<String, ClientOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_totals: Option<LabTotals>,
}

/// 模拟结果: 完成 或 无可模拟对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationOutcome {
    Completed(SimulationReport),
    NothingInScope {
        run_id: Uuid,
        mode: ScenarioMode,
        reason: EmptyScopeReason,
        message: String,
    },
}

impl SimulationOutcome {
    pub fn report(&self) -> Option<&SimulationReport> {
        match self {
            SimulationOutcome::Completed(report) => Some(report),
            SimulationOutcome::NothingInScope { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<SimulationReport> {
        match self {
            SimulationOutcome::Completed(report) => Some(report),
            SimulationOutcome::NothingInScope { .. } => None,
        }
    }

    pub fn empty_reason(&self) -> Option<EmptyScopeReason> {
        match self {
            SimulationOutcome::Completed(_) => None,
            SimulationOutcome::NothingInScope { reason, .. } => Some(*reason),
        }
    }
}

// ==========================================
// 产线配置明细
// ==========================================

/// 某日期下一条产线的生效配置明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfigDetail {
    pub line_id: i64,
    pub line_code: String,
    pub line_name: String,
    pub site_name: Option<String>,
    pub source: ConfigSource,
    pub config_display: Option<String>,
    pub shifts_per_day: u32,
    pub hours_per_shift: f64,
    pub include_saturday: bool,
    pub include_sunday: bool,
    pub weekly_hours: f64,
    pub reason: Option<String>,
    pub capacity_per_hour: f64,
    pub efficiency: f64,
    pub weekly_capacity: f64,
}

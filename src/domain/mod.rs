// ==========================================
// 产线产能模拟 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、请求/结果 DTO
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod forecast;
pub mod lab;
pub mod line;
pub mod simulation;
pub mod types;

// 重导出核心类型
pub use catalog::{
    CategoryScope, Client, LineProductAssignment, Product, ProductCategory, ProductFilter,
    SimulationCategory,
};
pub use forecast::{DemandForecast, DemandModification, ForecastFilter, WeeklyHistory};
pub use lab::{LabForecast, LabForecastFilter, LabLine, LabProduct};
pub use line::{LineConfigOverride, ProductionLine, ShiftConfiguration};
pub use simulation::{
    CategorySimulationRequest, ClientOverlay, DataPoint, LabSimulationRequest, LabTotals,
    LineConfigDetail, LineShiftSelection, LineSimulationRequest, LostClientSimulationRequest,
    NewClientSimulationRequest, OverlayData, OverlayPoint, SimulationOutcome, SimulationReport,
    SimulationRequest, SimulationSummary,
};
pub use types::{ConfigSource, DateRange, EmptyScopeReason, Granularity, ScenarioMode, Utilization};

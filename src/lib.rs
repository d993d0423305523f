// ==========================================
// 产线产能模拟 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 产能规划决策支持 (只读模拟, 不改写计划数据)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 模拟计算
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConfigSource, DateRange, EmptyScopeReason, Granularity, ScenarioMode, Utilization,
};

// 请求/结果
pub use domain::simulation::{
    DataPoint, LineConfigDetail, SimulationOutcome, SimulationReport, SimulationRequest,
    SimulationSummary,
};

// 引擎
pub use engine::{EngineError, EngineResult, SimulationOrchestrator};

// 仓储
pub use repository::{InMemorySimulationRepository, SimulationRepository, SqliteSimulationRepository};

// API
pub use api::{ApiError, ApiResult, ConfigApi, SimulationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "产线产能模拟";

// ==========================================
// 产线产能模拟 - 引擎层
// ==========================================
// 职责: 分桶、配置解析、产能/需求计算、情景编排
// 红线: Engine 不拼 SQL, 只通过 SimulationRepository 读取快照
// ==========================================

pub mod calendar;
pub mod capacity;
pub mod config_resolver;
pub mod context;
pub mod demand;
pub mod error;
pub mod modifier;
pub mod orchestrator;
pub mod seasonality;
pub mod summary;

// 重导出核心引擎
pub use calendar::Bucket;
pub use capacity::{BucketCapacity, CapacityCalculator, ScheduledLine};
pub use config_resolver::{ConfigResolver, ResolvedConfig, ScheduleSelection};
pub use context::SimulationContext;
pub use demand::{ClientSelection, DemandAggregator, DemandQuery};
pub use error::{EngineError, EngineResult};
pub use modifier::DemandModifier;
pub use orchestrator::SimulationOrchestrator;
pub use seasonality::{SeasonalityDistributor, SeasonalityProfile};
pub use summary::{freed_capacity_percent, summarize};

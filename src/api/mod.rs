// ==========================================
// 产线产能模拟 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供 CLI / 嵌入式调用方使用
// ==========================================

pub mod config_api;
pub mod error;
pub mod simulation_api;
pub mod validator;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult};
pub use simulation_api::SimulationApi;
pub use validator::{SimulationRequestValidator, ValidationViolation};

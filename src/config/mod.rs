// ==========================================
// 产线产能模拟 - 配置层
// ==========================================
// 职责: 引擎参数读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_settings;
pub mod settings_reader;

pub use config_manager::{config_keys, ConfigManager};
pub use engine_settings::EngineSettings;
pub use settings_reader::{ConfigReadError, SimulationConfigReader};

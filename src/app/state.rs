// ==========================================
// 产线产能模拟 - 应用状态
// ==========================================
// 职责: 组装共享连接、仓储、引擎与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, SimulationApi};
use crate::config::{ConfigManager, EngineSettings};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::SimulationOrchestrator;
use crate::perf::install_sqlite_tracing;
use crate::repository::SqliteSimulationRepository;

/// 默认数据库路径的环境变量
pub const DB_PATH_ENV: &str = "LINE_CAPACITY_SIM_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时加载的引擎参数
    pub settings: EngineSettings,

    /// 模拟API
    pub simulation_api: Arc<SimulationApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 1. 打开连接并建表（幂等）
    /// 2. 从 config_kv 加载引擎参数
    /// 3. 创建仓储、编排器、API 实例
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        install_sqlite_tracing(&mut conn);
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );
        let settings = EngineSettings::load(config_manager.as_ref())
            .await
            .map_err(|e| format!("无法加载引擎参数: {}", e))?;
        tracing::info!(
            weekly_probe_offset_days = settings.weekly_probe_offset_days,
            seasonality_fallback_years = settings.seasonality_fallback_years,
            max_simulation_days = settings.max_simulation_days,
            default_granularity = %settings.default_granularity,
            "引擎参数已加载"
        );

        let repo = Arc::new(SqliteSimulationRepository::from_connection(conn));
        let orchestrator = Arc::new(SimulationOrchestrator::new(repo, settings));

        Ok(Self {
            db_path,
            settings,
            simulation_api: Arc::new(SimulationApi::new(orchestrator)),
            config_api: Arc::new(ConfigApi::new(config_manager)),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 LINE_CAPACITY_SIM_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./line_capacity_sim.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("line-capacity-sim");
        // 目录创建失败时仍返回该路径, 由打开连接时报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("line_capacity_sim.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_bootstraps_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();
        let state = AppState::new(db_path.clone()).await.unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(state.settings, EngineSettings::default());
    }
}

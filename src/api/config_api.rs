// ==========================================
// 产线产能模拟 - 配置管理 API
// ==========================================
// 职责: 引擎参数查询、更新、快照
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, EngineSettings};
use crate::domain::types::Granularity;

/// 配置管理API
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 读取当前生效的引擎参数
    pub async fn get_engine_settings(&self) -> ApiResult<EngineSettings> {
        EngineSettings::load(self.config_manager.as_ref())
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 所有 global 配置的 JSON 快照
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 更新单个配置
    ///
    /// # 参数
    /// - key: 必须是 config_keys 中的已知键
    /// - value: 按键的类型校验后写入
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        Self::check_value(key, value.trim())?;
        self.config_manager
            .set_global_config_value(key, value.trim())
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        tracing::info!(config_key = key, value = value.trim(), "配置已更新");
        Ok(())
    }

    fn check_value(key: &str, value: &str) -> ApiResult<()> {
        let valid = match key {
            config_keys::WEEKLY_PROBE_OFFSET_DAYS => {
                value.parse::<u32>().map_or(false, |v| v <= 6)
            }
            config_keys::SEASONALITY_FALLBACK_YEARS => value.parse::<u32>().is_ok(),
            config_keys::UNIFORM_WEEKS_PER_YEAR => value.parse::<u32>().map_or(false, |v| v > 0),
            config_keys::MAX_SIMULATION_DAYS => value.parse::<i64>().map_or(false, |v| v > 0),
            config_keys::DEFAULT_GRANULARITY => value.parse::<Granularity>().is_ok(),
            _ => return Err(ApiError::InvalidInput(format!("未知配置键: {}", key))),
        };
        if valid {
            Ok(())
        } else {
            Err(ApiError::InvalidInput(format!("配置 {} 的值无效: {}", key, value)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert!(ConfigApi::check_value(config_keys::WEEKLY_PROBE_OFFSET_DAYS, "3").is_ok());
        assert!(ConfigApi::check_value(config_keys::WEEKLY_PROBE_OFFSET_DAYS, "9").is_err());
        assert!(ConfigApi::check_value(config_keys::DEFAULT_GRANULARITY, "day").is_ok());
        assert!(ConfigApi::check_value(config_keys::UNIFORM_WEEKS_PER_YEAR, "0").is_err());
        assert!(ConfigApi::check_value("unknown_key", "1").is_err());
    }
}

// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use line_capacity_sim::config::{ConfigReadError, SimulationConfigReader};
use line_capacity_sim::domain::types::Granularity;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub weekly_probe_offset_days: u32,
    pub seasonality_fallback_years: u32,
    pub uniform_weeks_per_year: u32,
    pub max_simulation_days: i64,
    pub default_granularity: Granularity,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            weekly_probe_offset_days: 3,
            seasonality_fallback_years: 4,
            uniform_weeks_per_year: 52,
            max_simulation_days: 1100,
            default_granularity: Granularity::Week,
        }
    }

    /// 日粒度 + 周一探测
    pub fn daily() -> Self {
        Self {
            weekly_probe_offset_days: 0,
            default_granularity: Granularity::Day,
            ..Self::default()
        }
    }

    pub fn with_max_days(mut self, days: i64) -> Self {
        self.max_simulation_days = days;
        self
    }
}

#[async_trait]
impl SimulationConfigReader for MockConfig {
    async fn get_weekly_probe_offset_days(&self) -> Result<u32, ConfigReadError> {
        Ok(self.weekly_probe_offset_days)
    }

    async fn get_seasonality_fallback_years(&self) -> Result<u32, ConfigReadError> {
        Ok(self.seasonality_fallback_years)
    }

    async fn get_uniform_weeks_per_year(&self) -> Result<u32, ConfigReadError> {
        Ok(self.uniform_weeks_per_year)
    }

    async fn get_max_simulation_days(&self) -> Result<i64, ConfigReadError> {
        Ok(self.max_simulation_days)
    }

    async fn get_default_granularity(&self) -> Result<Granularity, ConfigReadError> {
        Ok(self.default_granularity)
    }
}

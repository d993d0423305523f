// ==========================================
// 产线产能模拟 - 引擎参数快照
// ==========================================
// 每次调用前加载一次, 按值传入编排器
// ==========================================

use crate::config::settings_reader::{ConfigReadError, SimulationConfigReader};
use crate::domain::types::Granularity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub weekly_probe_offset_days: u32,
    pub seasonality_fallback_years: u32,
    pub uniform_weeks_per_year: u32,
    pub max_simulation_days: i64,
    pub default_granularity: Granularity,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weekly_probe_offset_days: 3,
            seasonality_fallback_years: 4,
            uniform_weeks_per_year: 52,
            max_simulation_days: 1100,
            default_granularity: Granularity::Week,
        }
    }
}

impl EngineSettings {
    /// 从配置读取器加载
    pub async fn load<R>(reader: &R) -> Result<Self, ConfigReadError>
    where
        R: SimulationConfigReader + ?Sized,
    {
        Ok(Self {
            weekly_probe_offset_days: reader.get_weekly_probe_offset_days().await?,
            seasonality_fallback_years: reader.get_seasonality_fallback_years().await?,
            uniform_weeks_per_year: reader.get_uniform_weeks_per_year().await?,
            max_simulation_days: reader.get_max_simulation_days().await?,
            default_granularity: reader.get_default_granularity().await?,
        })
    }

    /// 均匀周份额 (1/52)
    pub fn uniform_share(&self) -> f64 {
        1.0 / self.uniform_weeks_per_year.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedReader;

    #[async_trait]
    impl SimulationConfigReader for FixedReader {
        async fn get_weekly_probe_offset_days(&self) -> Result<u32, ConfigReadError> {
            Ok(0)
        }
        async fn get_seasonality_fallback_years(&self) -> Result<u32, ConfigReadError> {
            Ok(2)
        }
        async fn get_uniform_weeks_per_year(&self) -> Result<u32, ConfigReadError> {
            Ok(53)
        }
        async fn get_max_simulation_days(&self) -> Result<i64, ConfigReadError> {
            Ok(400)
        }
        async fn get_default_granularity(&self) -> Result<Granularity, ConfigReadError> {
            Ok(Granularity::Day)
        }
    }

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.weekly_probe_offset_days, 3);
        assert_eq!(settings.seasonality_fallback_years, 4);
        assert!((settings.uniform_share() - 1.0 / 52.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_load_from_reader() {
        let settings = EngineSettings::load(&FixedReader).await.unwrap();
        assert_eq!(settings.weekly_probe_offset_days, 0);
        assert_eq!(settings.seasonality_fallback_years, 2);
        assert_eq!(settings.uniform_weeks_per_year, 53);
        assert_eq!(settings.max_simulation_days, 400);
        assert_eq!(settings.default_granularity, Granularity::Day);
    }
}

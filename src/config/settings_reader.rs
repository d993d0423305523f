// ==========================================
// 产线产能模拟 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义模拟引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::Granularity;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigReadError = Box<dyn Error + Send + Sync>;

// ==========================================
// SimulationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SimulationConfigReader: Send + Sync {
    /// 周桶内用于解析班次配置的探测日偏移（相对周一）
    ///
    /// # 默认值
    /// - 3（周四）
    async fn get_weekly_probe_offset_days(&self) -> Result<u32, ConfigReadError>;

    /// 季节性份额缺失时向前回溯的年数
    ///
    /// # 默认值
    /// - 4
    async fn get_seasonality_fallback_years(&self) -> Result<u32, ConfigReadError>;

    /// 均匀分摊时的每年周数
    ///
    /// # 默认值
    /// - 52
    async fn get_uniform_weeks_per_year(&self) -> Result<u32, ConfigReadError>;

    /// 单次模拟允许的最大跨度（天）
    ///
    /// # 默认值
    /// - 1100
    async fn get_max_simulation_days(&self) -> Result<i64, ConfigReadError>;

    /// 请求未指定粒度时使用的默认粒度
    ///
    /// # 默认值
    /// - WEEK
    async fn get_default_granularity(&self) -> Result<Granularity, ConfigReadError>;
}

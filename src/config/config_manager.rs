// ==========================================
// 产线产能模拟 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::settings_reader::{ConfigReadError, SimulationConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::Granularity;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigReadError> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigReadError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigReadError> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 所有 global 配置的快照（JSON）
    ///
    /// # 用途
    /// - CLI 运行时记录生效配置
    pub fn get_config_snapshot(&self) -> Result<String, ConfigReadError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析数值配置, 格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigReadError>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// SimulationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SimulationConfigReader for ConfigManager {
    async fn get_weekly_probe_offset_days(&self) -> Result<u32, ConfigReadError> {
        let value = self.get_parsed_or_default(config_keys::WEEKLY_PROBE_OFFSET_DAYS, 3u32)?;
        Ok(value.min(6))
    }

    async fn get_seasonality_fallback_years(&self) -> Result<u32, ConfigReadError> {
        self.get_parsed_or_default(config_keys::SEASONALITY_FALLBACK_YEARS, 4u32)
    }

    async fn get_uniform_weeks_per_year(&self) -> Result<u32, ConfigReadError> {
        let value = self.get_parsed_or_default(config_keys::UNIFORM_WEEKS_PER_YEAR, 52u32)?;
        Ok(if value == 0 { 52 } else { value })
    }

    async fn get_max_simulation_days(&self) -> Result<i64, ConfigReadError> {
        self.get_parsed_or_default(config_keys::MAX_SIMULATION_DAYS, 1100i64)
    }

    async fn get_default_granularity(&self) -> Result<Granularity, ConfigReadError> {
        let raw = self
            .get_config_value(config_keys::DEFAULT_GRANULARITY)?
            .unwrap_or_else(|| "WEEK".to_string());
        Ok(raw.parse::<Granularity>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_GRANULARITY,
                raw_value = %raw,
                "粒度配置无法识别，使用 WEEK"
            );
            Granularity::Week
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 周桶探测日
    pub const WEEKLY_PROBE_OFFSET_DAYS: &str = "weekly_probe_offset_days";

    // 季节性分摊
    pub const SEASONALITY_FALLBACK_YEARS: &str = "seasonality_fallback_years";
    pub const UNIFORM_WEEKS_PER_YEAR: &str = "uniform_weeks_per_year";

    // 请求约束
    pub const MAX_SIMULATION_DAYS: &str = "max_simulation_days";
    pub const DEFAULT_GRANULARITY: &str = "default_granularity";
}

// ==========================================
// 产线产能模拟 - SQLite 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

mod catalog;
mod demand;
mod lab;
mod line;

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{CategoryScope, Client, Product, ProductCategory, ProductFilter};
use crate::domain::forecast::{ForecastFilter, WeeklyHistory};
use crate::domain::lab::{LabForecast, LabForecastFilter, LabLine};
use crate::domain::line::{ProductionLine, ShiftConfiguration};
use crate::domain::types::DateRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::simulation_repo::SimulationRepository;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteSimulationRepository - 模拟只读仓储
// ==========================================

/// SQLite 模拟仓储
/// 职责: 读取产线/班次/覆写/产品/客户/预测/实验室表
pub struct SqliteSimulationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSimulationRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

// ==========================================
// SQL 辅助
// ==========================================

/// 生成 "?,?,?" 占位符
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

pub(crate) fn id_values(ids: impl IntoIterator<Item = i64>) -> Vec<Value> {
    ids.into_iter().map(Value::Integer).collect()
}

pub(crate) fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

/// 解析逗号拼接的ID列表（非法项被忽略）
pub(crate) fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .collect()
}

impl SimulationRepository for SqliteSimulationRepository {
    fn get_lines(
        &self,
        line_ids: &[i64],
        active_only: bool,
        window: DateRange,
    ) -> RepositoryResult<Vec<ProductionLine>> {
        self.query_lines(line_ids, active_only, window)
    }

    fn get_site_line_ids(&self, site_id: i64) -> RepositoryResult<Vec<i64>> {
        self.query_site_line_ids(site_id)
    }

    fn get_shift_configuration(&self, id: i64) -> RepositoryResult<Option<ShiftConfiguration>> {
        self.query_shift_configuration(id)
    }

    fn get_default_product_ids(
        &self,
        line_ids: &[i64],
        filter: Option<&ProductFilter>,
    ) -> RepositoryResult<BTreeSet<i64>> {
        let products = self.query_default_products(line_ids)?;
        Ok(products
            .into_iter()
            .filter(|p| filter.map_or(true, |f| f.matches(p)))
            .map(|p| p.id)
            .collect())
    }

    fn sum_forecast(
        &self,
        product_ids: &BTreeSet<i64>,
        week_range: DateRange,
        filter: ForecastFilter,
    ) -> RepositoryResult<BTreeMap<NaiveDate, f64>> {
        self.query_forecast_totals(product_ids, week_range, filter)
    }

    fn get_product_weekly_history(&self, product_id: i64) -> RepositoryResult<Vec<WeeklyHistory>> {
        self.query_weekly_history(product_id)
    }

    fn get_client_by_code(&self, code: &str) -> RepositoryResult<Option<Client>> {
        self.query_client_by_code(code)
    }

    fn get_client(&self, id: i64) -> RepositoryResult<Option<Client>> {
        self.query_client(id)
    }

    fn get_product_by_code(&self, code: &str) -> RepositoryResult<Option<Product>> {
        self.query_product_by_code(code)
    }

    fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        self.query_product(id)
    }

    fn get_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>> {
        self.query_product_category(id)
    }

    fn get_simulation_category(&self, id: i64) -> RepositoryResult<Option<CategoryScope>> {
        self.query_simulation_category(id)
    }

    fn get_lab_lines(&self, ids: &[i64]) -> RepositoryResult<Vec<LabLine>> {
        self.query_lab_lines(ids)
    }

    fn get_lab_forecasts(&self, filter: &LabForecastFilter) -> RepositoryResult<Vec<LabForecast>> {
        self.query_lab_forecasts(filter)
    }
}

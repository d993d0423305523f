// ==========================================
// 产线产能模拟 - 模拟引擎仓储接口
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 引擎只通过此 trait 读取实体快照, 引擎本身不写库
// 实现者: SqliteSimulationRepository / InMemorySimulationRepository
// ==========================================

use crate::domain::catalog::{CategoryScope, Client, Product, ProductCategory, ProductFilter};
use crate::domain::forecast::{ForecastFilter, WeeklyHistory};
use crate::domain::lab::{LabForecast, LabForecastFilter, LabLine};
use crate::domain::line::{ProductionLine, ShiftConfiguration};
use crate::domain::types::DateRange;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// 模拟引擎只读仓储
pub trait SimulationRepository: Send + Sync {
    // ===== 产线与班次 =====

    /// 查询产线快照
    ///
    /// # 参数
    /// - line_ids: 产线ID列表
    /// - active_only: 仅返回启用产线
    /// - window: 覆写按此窗口裁剪（只返回与窗口相交的启用覆写）
    ///
    /// # 返回
    /// 按 id 升序的产线列表（未知 id 被忽略）
    fn get_lines(
        &self,
        line_ids: &[i64],
        active_only: bool,
        window: DateRange,
    ) -> RepositoryResult<Vec<ProductionLine>>;

    /// 查询工厂下所有启用产线ID
    fn get_site_line_ids(&self, site_id: i64) -> RepositoryResult<Vec<i64>>;

    fn get_shift_configuration(&self, id: i64) -> RepositoryResult<Option<ShiftConfiguration>>;

    // ===== 产品与需求 =====

    /// 默认产线落在 line_ids 中的产品集合（可再按属性筛选收窄）
    fn get_default_product_ids(
        &self,
        line_ids: &[i64],
        filter: Option<&ProductFilter>,
    ) -> RepositoryResult<BTreeSet<i64>>;

    /// 按周汇总预测量
    ///
    /// # 参数
    /// - product_ids: 产品集合（为空时返回空结果）
    /// - week_range: week_start_date 的闭区间
    /// - filter: 客户/大类/单产品筛选
    ///
    /// # 返回
    /// week_start_date → 合计数量
    fn sum_forecast(
        &self,
        product_ids: &BTreeSet<i64>,
        week_range: DateRange,
        filter: ForecastFilter,
    ) -> RepositoryResult<BTreeMap<NaiveDate, f64>>;

    /// 产品的历史周需求（所有客户合计, 按 ISO 年/周）
    fn get_product_weekly_history(&self, product_id: i64) -> RepositoryResult<Vec<WeeklyHistory>>;

    // ===== 主数据查询 =====

    /// 按代码查询客户（大小写不敏感）
    fn get_client_by_code(&self, code: &str) -> RepositoryResult<Option<Client>>;

    fn get_client(&self, id: i64) -> RepositoryResult<Option<Client>>;

    /// 按代码查询产品（大小写不敏感）
    fn get_product_by_code(&self, code: &str) -> RepositoryResult<Option<Product>>;

    fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>>;

    fn get_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>>;

    /// 模拟分类: 产线集合 + 匹配产品集合
    fn get_simulation_category(&self, id: i64) -> RepositoryResult<Option<CategoryScope>>;

    // ===== 实验室 =====

    fn get_lab_lines(&self, ids: &[i64]) -> RepositoryResult<Vec<LabLine>>;

    fn get_lab_forecasts(&self, filter: &LabForecastFilter) -> RepositoryResult<Vec<LabForecast>>;
}

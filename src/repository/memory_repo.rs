// ==========================================
// 产线产能模拟 - 内存仓储
// ==========================================
// 用途: 单元测试 / 嵌入式调用方直接构造实体快照
// 语义与 SqliteSimulationRepository 保持一致
// ==========================================

use crate::domain::catalog::{
    CategoryScope, Client, LineProductAssignment, Product, ProductCategory, ProductFilter,
    SimulationCategory,
};
use crate::domain::forecast::{DemandForecast, ForecastFilter, WeeklyHistory};
use crate::domain::lab::{LabForecast, LabForecastFilter, LabLine, LabProduct};
use crate::domain::line::{LineConfigOverride, ProductionLine, ShiftConfiguration};
use crate::domain::types::DateRange;
use crate::repository::error::RepositoryResult;
use crate::repository::simulation_repo::SimulationRepository;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// 内存仓储（构建后只读）
#[derive(Debug, Clone, Default)]
pub struct InMemorySimulationRepository {
    shift_configs: BTreeMap<i64, ShiftConfiguration>,
    lines: BTreeMap<i64, ProductionLine>,
    overrides: Vec<LineConfigOverride>,
    categories: BTreeMap<i64, ProductCategory>,
    products: BTreeMap<i64, Product>,
    assignments: Vec<LineProductAssignment>,
    clients: BTreeMap<i64, Client>,
    forecasts: Vec<DemandForecast>,
    simulation_categories: BTreeMap<i64, SimulationCategory>,
    lab_lines: BTreeMap<i64, LabLine>,
    lab_products: BTreeMap<i64, LabProduct>,
    lab_forecasts: Vec<LabForecast>,
}

impl InMemorySimulationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 构建方法
    // ==========================================

    pub fn with_shift_configuration(mut self, config: ShiftConfiguration) -> Self {
        self.shift_configs.insert(config.id, config);
        self
    }

    /// 添加产线（line.overrides 会并入覆写列表）
    pub fn with_line(mut self, mut line: ProductionLine) -> Self {
        self.overrides.append(&mut line.overrides);
        self.lines.insert(line.id, line);
        self
    }

    pub fn with_override(mut self, config_override: LineConfigOverride) -> Self {
        self.overrides.push(config_override);
        self
    }

    pub fn with_category(mut self, category: ProductCategory) -> Self {
        self.categories.insert(category.id, category);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id, product);
        self
    }

    pub fn with_assignment(mut self, assignment: LineProductAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.insert(client.id, client);
        self
    }

    /// 添加预测（同一唯一键后写覆盖先写）
    pub fn with_forecast(mut self, forecast: DemandForecast) -> Self {
        self.forecasts.retain(|f| {
            !(f.client_id == forecast.client_id
                && f.product_id == forecast.product_id
                && f.year == forecast.year
                && f.week_number == forecast.week_number)
        });
        self.forecasts.push(forecast);
        self
    }

    pub fn with_simulation_category(mut self, category: SimulationCategory) -> Self {
        self.simulation_categories.insert(category.id, category);
        self
    }

    pub fn with_lab_line(mut self, line: LabLine) -> Self {
        self.lab_lines.insert(line.id, line);
        self
    }

    pub fn with_lab_product(mut self, product: LabProduct) -> Self {
        self.lab_products.insert(product.id, product);
        self
    }

    pub fn with_lab_forecast(mut self, forecast: LabForecast) -> Self {
        self.lab_forecasts.push(forecast);
        self
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn default_line_of(&self, product: &Product) -> BTreeSet<i64> {
        let mut lines: BTreeSet<i64> = product.default_line_id.into_iter().collect();
        lines.extend(
            self.assignments
                .iter()
                .filter(|a| a.is_default && a.product_id == product.id)
                .map(|a| a.line_id),
        );
        lines
    }

    fn is_default_on_any(&self, product: &Product, line_ids: &[i64]) -> bool {
        self.default_line_of(product)
            .iter()
            .any(|line_id| line_ids.contains(line_id))
    }
}

impl SimulationRepository for InMemorySimulationRepository {
    fn get_lines(
        &self,
        line_ids: &[i64],
        active_only: bool,
        window: DateRange,
    ) -> RepositoryResult<Vec<ProductionLine>> {
        let wanted: BTreeSet<i64> = line_ids.iter().copied().collect();
        let lines = self
            .lines
            .values()
            .filter(|l| wanted.contains(&l.id))
            .filter(|l| !active_only || l.is_active)
            .map(|l| {
                let mut line = l.clone();
                let mut overrides: Vec<LineConfigOverride> = self
                    .overrides
                    .iter()
                    .filter(|o| o.line_id == l.id && o.is_active)
                    .filter(|o| o.overlaps(window.start, window.end))
                    .cloned()
                    .collect();
                overrides.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
                line.overrides = overrides;
                line
            })
            .collect();
        Ok(lines)
    }

    fn get_site_line_ids(&self, site_id: i64) -> RepositoryResult<Vec<i64>> {
        Ok(self
            .lines
            .values()
            .filter(|l| l.site_id == site_id && l.is_active)
            .map(|l| l.id)
            .collect())
    }

    fn get_shift_configuration(&self, id: i64) -> RepositoryResult<Option<ShiftConfiguration>> {
        Ok(self.shift_configs.get(&id).cloned())
    }

    fn get_default_product_ids(
        &self,
        line_ids: &[i64],
        filter: Option<&ProductFilter>,
    ) -> RepositoryResult<BTreeSet<i64>> {
        Ok(self
            .products
            .values()
            .filter(|p| self.is_default_on_any(p, line_ids))
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
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for f in &self.forecasts {
            if !product_ids.contains(&f.product_id) || !week_range.contains(f.week_start_date) {
                continue;
            }
            if filter.client_id.map_or(false, |c| c != f.client_id) {
                continue;
            }
            if filter.product_id.map_or(false, |p| p != f.product_id) {
                continue;
            }
            if let Some(category_id) = filter.category_id {
                let in_category = self
                    .products
                    .get(&f.product_id)
                    .map_or(false, |p| p.category_id == Some(category_id));
                if !in_category {
                    continue;
                }
            }
            *totals.entry(f.week_start_date).or_insert(0.0) += f.forecast_quantity;
        }
        Ok(totals)
    }

    fn get_product_weekly_history(&self, product_id: i64) -> RepositoryResult<Vec<WeeklyHistory>> {
        let mut by_week: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for f in self.forecasts.iter().filter(|f| f.product_id == product_id) {
            *by_week.entry((f.year, f.week_number)).or_insert(0.0) += f.forecast_quantity;
        }
        Ok(by_week
            .into_iter()
            .map(|((year, week_number), quantity)| WeeklyHistory {
                year,
                week_number,
                quantity,
            })
            .collect())
    }

    fn get_client_by_code(&self, code: &str) -> RepositoryResult<Option<Client>> {
        let code = code.trim();
        Ok(self
            .clients
            .values()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    fn get_client(&self, id: i64) -> RepositoryResult<Option<Client>> {
        Ok(self.clients.get(&id).cloned())
    }

    fn get_product_by_code(&self, code: &str) -> RepositoryResult<Option<Product>> {
        let code = code.trim();
        Ok(self
            .products
            .values()
            .find(|p| p.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        Ok(self.products.get(&id).cloned())
    }

    fn get_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>> {
        Ok(self.categories.get(&id).cloned())
    }

    fn get_simulation_category(&self, id: i64) -> RepositoryResult<Option<CategoryScope>> {
        let category = match self.simulation_categories.get(&id) {
            Some(c) => c.clone(),
            None => return Ok(None),
        };

        let line_ids = match (category.line_ids.is_empty(), category.site_id) {
            (true, Some(site_id)) => self.get_site_line_ids(site_id)?,
            _ => category.line_ids.clone(),
        };

        let site_lines = match category.site_id {
            Some(site_id) => Some(self.get_site_line_ids(site_id)?),
            None => None,
        };

        let filter = category.product_filter();
        let matching_product_ids = self
            .products
            .values()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                site_lines
                    .as_ref()
                    .map_or(true, |lines| self.is_default_on_any(p, lines))
            })
            .map(|p| p.id)
            .collect();

        Ok(Some(CategoryScope {
            category,
            line_ids,
            matching_product_ids,
        }))
    }

    fn get_lab_lines(&self, ids: &[i64]) -> RepositoryResult<Vec<LabLine>> {
        Ok(self
            .lab_lines
            .values()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }

    fn get_lab_forecasts(&self, filter: &LabForecastFilter) -> RepositoryResult<Vec<LabForecast>> {
        let on_selected_line = |f: &LabForecast| -> bool {
            if let Some(lab_product) = f.lab_product_id.and_then(|id| self.lab_products.get(&id)) {
                let on_lab = lab_product
                    .lab_default_line_id
                    .map_or(false, |id| filter.lab_line_ids.contains(&id));
                let on_real = lab_product
                    .default_line_id
                    .map_or(false, |id| filter.line_ids.contains(&id));
                return on_lab || on_real;
            }
            if let Some(product) = f.product_id.and_then(|id| self.products.get(&id)) {
                return self.is_default_on_any(product, &filter.line_ids);
            }
            false
        };

        Ok(self
            .lab_forecasts
            .iter()
            .filter(|f| f.overlaps(filter.start_date, filter.end_date))
            .filter(|f| on_selected_line(f))
            .cloned()
            .collect())
    }
}

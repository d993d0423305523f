// ==========================================
// 产线产能模拟 - 需求汇总
// ==========================================
// 职责: 按产品集合/客户/单产品汇总周预测量, 再映射到时间桶
// 多客户合并: 逐客户汇总后相加
// 日粒度: 周合计在周一至周五均分（不反映真实日波动）
// ==========================================

use crate::domain::forecast::ForecastFilter;
use crate::domain::types::{DateRange, Granularity};
use crate::engine::calendar::{spread_to_buckets, Bucket};
use crate::engine::error::EngineResult;
use crate::repository::SimulationRepository;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// 客户范围
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClientSelection {
    /// 不限客户
    #[default]
    All,
    /// 指定客户（为空表示全部代码未知, 需求为 0）
    Clients(Vec<i64>),
}

impl ClientSelection {
    pub fn admits(&self, client_id: i64) -> bool {
        match self {
            ClientSelection::All => true,
            ClientSelection::Clients(ids) => ids.contains(&client_id),
        }
    }
}

/// 需求查询
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemandQuery {
    pub product_ids: BTreeSet<i64>,
    pub clients: ClientSelection,
    pub category_id: Option<i64>,
    pub product_id: Option<i64>,
}

impl DemandQuery {
    pub fn for_products(product_ids: BTreeSet<i64>) -> Self {
        Self {
            product_ids,
            ..Default::default()
        }
    }

    pub fn with_clients(mut self, clients: ClientSelection) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_product(mut self, product_id: Option<i64>) -> Self {
        self.product_id = product_id;
        self
    }

    fn filter_for(&self, client_id: Option<i64>) -> ForecastFilter {
        ForecastFilter {
            client_id,
            category_id: self.category_id,
            product_id: self.product_id,
        }
    }
}

// ==========================================
// DemandAggregator - 需求汇总器
// ==========================================
pub struct DemandAggregator {
    // 无状态
}

impl DemandAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 周合计
    ///
    /// # 参数
    /// - range: week_start_date 的闭区间
    ///
    /// # 返回
    /// week_start → 合计数量
    #[instrument(skip(self, repo, query), fields(
        product_count = query.product_ids.len(),
        client_filter = ?query.clients
    ))]
    pub fn weekly_totals(
        &self,
        repo: &dyn SimulationRepository,
        query: &DemandQuery,
        range: DateRange,
    ) -> EngineResult<BTreeMap<NaiveDate, f64>> {
        if query.product_ids.is_empty() {
            debug!("产品集合为空, 需求为 0");
            return Ok(BTreeMap::new());
        }

        match &query.clients {
            ClientSelection::All => {
                Ok(repo.sum_forecast(&query.product_ids, range, query.filter_for(None))?)
            }
            ClientSelection::Clients(ids) => {
                let mut combined: BTreeMap<NaiveDate, f64> = BTreeMap::new();
                for client_id in ids {
                    let totals =
                        repo.sum_forecast(&query.product_ids, range, query.filter_for(Some(*client_id)))?;
                    for (week, quantity) in totals {
                        *combined.entry(week).or_insert(0.0) += quantity;
                    }
                }
                Ok(combined)
            }
        }
    }

    /// 桶需求序列
    pub fn bucket_demand(
        &self,
        repo: &dyn SimulationRepository,
        query: &DemandQuery,
        range: DateRange,
        buckets: &[Bucket],
        granularity: Granularity,
    ) -> EngineResult<Vec<f64>> {
        let weekly = self.weekly_totals(repo, query, range)?;
        Ok(spread_to_buckets(&weekly, buckets, granularity))
    }
}

impl Default for DemandAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Client, Product};
    use crate::domain::forecast::DemandForecast;
    use crate::engine::calendar::{daily_buckets, weekly_buckets};
    use crate::repository::InMemorySimulationRepository;
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn product(id: i64, category_id: i64) -> Product {
        Product {
            id,
            code: format!("P{}", id),
            name: format!("Product {}", id),
            category_id: Some(category_id),
            default_line_id: Some(1),
            product_type: None,
            recipe: None,
            material: None,
            packaging: None,
            is_active: true,
        }
    }

    fn client(id: i64) -> Client {
        Client {
            id,
            code: format!("C{}", id),
            name: format!("Client {}", id),
            priority: 3,
            is_active: true,
        }
    }

    fn forecast(client_id: i64, product_id: i64, monday: NaiveDate, qty: f64) -> DemandForecast {
        DemandForecast {
            client_id,
            product_id,
            year: monday.iso_week().year(),
            week_number: monday.iso_week().week(),
            week_start_date: monday,
            forecast_quantity: qty,
        }
    }

    fn repo() -> InMemorySimulationRepository {
        InMemorySimulationRepository::new()
            .with_product(product(1, 10))
            .with_product(product(2, 20))
            .with_client(client(1))
            .with_client(client(2))
            .with_forecast(forecast(1, 1, d(2025, 3, 10), 100.0))
            .with_forecast(forecast(2, 1, d(2025, 3, 10), 50.0))
            .with_forecast(forecast(1, 2, d(2025, 3, 10), 30.0))
            .with_forecast(forecast(1, 1, d(2025, 3, 17), 200.0))
    }

    fn range() -> DateRange {
        DateRange::new(d(2025, 3, 10), d(2025, 3, 23))
    }

    #[test]
    fn test_all_clients() {
        let agg = DemandAggregator::new();
        let query = DemandQuery::for_products([1, 2].into_iter().collect());
        let totals = agg.weekly_totals(&repo(), &query, range()).unwrap();
        assert_eq!(totals.get(&d(2025, 3, 10)), Some(&180.0));
        assert_eq!(totals.get(&d(2025, 3, 17)), Some(&200.0));
    }

    #[test]
    fn test_combined_clients_sum_independently() {
        let agg = DemandAggregator::new();
        let query = DemandQuery::for_products([1, 2].into_iter().collect())
            .with_clients(ClientSelection::Clients(vec![1, 2]));
        let totals = agg.weekly_totals(&repo(), &query, range()).unwrap();
        assert_eq!(totals.get(&d(2025, 3, 10)), Some(&180.0));

        let only_two = DemandQuery::for_products([1, 2].into_iter().collect())
            .with_clients(ClientSelection::Clients(vec![2]));
        let totals = agg.weekly_totals(&repo(), &only_two, range()).unwrap();
        assert_eq!(totals.get(&d(2025, 3, 10)), Some(&50.0));
        assert_eq!(totals.get(&d(2025, 3, 17)), None);
    }

    #[test]
    fn test_unknown_clients_yield_zero() {
        let agg = DemandAggregator::new();
        let query = DemandQuery::for_products([1, 2].into_iter().collect())
            .with_clients(ClientSelection::Clients(vec![]));
        assert!(agg.weekly_totals(&repo(), &query, range()).unwrap().is_empty());
    }

    #[test]
    fn test_single_product_and_category() {
        let agg = DemandAggregator::new();
        let query = DemandQuery::for_products([1, 2].into_iter().collect()).with_product(Some(2));
        let totals = agg.weekly_totals(&repo(), &query, range()).unwrap();
        assert_eq!(totals.get(&d(2025, 3, 10)), Some(&30.0));

        let mut by_category = DemandQuery::for_products([1, 2].into_iter().collect());
        by_category.category_id = Some(10);
        let totals = agg.weekly_totals(&repo(), &by_category, range()).unwrap();
        assert_eq!(totals.get(&d(2025, 3, 10)), Some(&150.0));
    }

    #[test]
    fn test_bucket_demand_week_and_day() {
        let agg = DemandAggregator::new();
        let query = DemandQuery::for_products([1].into_iter().collect());
        let weeks = weekly_buckets(range());
        let weekly = agg
            .bucket_demand(&repo(), &query, range(), &weeks, Granularity::Week)
            .unwrap();
        assert_eq!(weekly, vec![150.0, 200.0]);

        let days = daily_buckets(DateRange::new(d(2025, 3, 10), d(2025, 3, 16)));
        let daily = agg
            .bucket_demand(&repo(), &query, range(), &days, Granularity::Day)
            .unwrap();
        assert_eq!(daily[0], 30.0);
        assert_eq!(daily[5], 0.0);
        assert_eq!(daily.iter().sum::<f64>(), 150.0);
    }
}

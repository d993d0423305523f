// ==========================================
// 产线产能模拟 - 需求调整 (What-if)
// ==========================================
// 规则:
// 1) 每条调整读取其范围内的"原始"预测周合计, 而非累计后的需求
// 2) 增量 = 原始 × 百分比 / 100, 按顺序累加到桶需求
// 3) 百分比 <= -100 视为整段移除: 增量 = -(原始 + 此前作用在同一或更窄范围上的增量)
// 4) 每次累加后桶需求下限为 0
// 5) 日粒度: 周原始量与周增量都在调整自身日期范围内的工作日上均分
// ==========================================

use crate::domain::forecast::{DemandModification, ForecastFilter};
use crate::domain::types::{DateRange, Granularity};
use crate::engine::calendar::{is_weekday, week_start, Bucket};
use crate::engine::demand::DemandQuery;
use crate::engine::error::EngineResult;
use crate::repository::SimulationRepository;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// DemandModifier - 需求调整器
// ==========================================
pub struct DemandModifier {
    // 无状态
}

impl DemandModifier {
    pub fn new() -> Self {
        Self {}
    }

    /// 调整是否落在本次需求查询的范围内
    fn in_scope(query: &DemandQuery, m: &DemandModification) -> bool {
        if !query.clients.admits(m.client_id) {
            return false;
        }
        match (query.product_id, m.product_id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// 调整范围所在周内、且在调整日期范围内的工作日数
    fn affected_weekdays(monday: NaiveDate, m: &DemandModification) -> usize {
        (0..5)
            .map(|i| monday + Duration::days(i))
            .filter(|d| m.start_date <= *d && *d <= m.end_date)
            .count()
    }

    /// 某桶的原始量与百分比增量
    ///
    /// # 返回
    /// (该范围在桶内的原始需求, 非移除调整的增量)
    /// 日粒度下两者按同一受影响工作日数均分
    fn bucket_amounts(
        raw_weekly: &BTreeMap<NaiveDate, f64>,
        m: &DemandModification,
        bucket: &Bucket,
        granularity: Granularity,
    ) -> (f64, f64) {
        match granularity {
            Granularity::Week => {
                if !(m.start_date <= bucket.end && bucket.start <= m.end_date) {
                    return (0.0, 0.0);
                }
                let raw = raw_weekly.get(&bucket.start).copied().unwrap_or(0.0);
                (raw, raw * m.factor())
            }
            Granularity::Day => {
                let date = bucket.start;
                if !is_weekday(date) || date < m.start_date || date > m.end_date {
                    return (0.0, 0.0);
                }
                let monday = week_start(date);
                let raw_week = raw_weekly.get(&monday).copied().unwrap_or(0.0);
                let days = Self::affected_weekdays(monday, m).max(1) as f64;
                (raw_week / days, raw_week * m.factor() / days)
            }
        }
    }

    /// 依次应用调整（原地修改 demand）
    ///
    /// # 参数
    /// - query: 本次需求的范围（产品集合/客户/单产品）
    /// - forecast_range: 预测查询区间
    /// - demand: 与 buckets 一一对应的需求序列
    #[instrument(skip_all, fields(modification_count = modifications.len(), bucket_count = buckets.len()))]
    pub fn apply(
        &self,
        repo: &dyn SimulationRepository,
        query: &DemandQuery,
        modifications: &[DemandModification],
        buckets: &[Bucket],
        granularity: Granularity,
        forecast_range: DateRange,
        demand: &mut [f64],
    ) -> EngineResult<()> {
        // 已应用调整的实际增量（夹紧后）
        let mut applied: Vec<(&DemandModification, Vec<f64>)> = Vec::new();

        for m in modifications {
            if !Self::in_scope(query, m) {
                debug!(client_id = m.client_id, product_id = ?m.product_id, "调整不在需求范围内, 跳过");
                continue;
            }

            let range_start = week_start(m.start_date).max(forecast_range.start);
            let range_end = m.end_date.min(forecast_range.end);
            let raw_weekly = if range_start <= range_end && !query.product_ids.is_empty() {
                repo.sum_forecast(
                    &query.product_ids,
                    DateRange::new(range_start, range_end),
                    ForecastFilter {
                        client_id: Some(m.client_id),
                        category_id: query.category_id,
                        product_id: m.product_id.or(query.product_id),
                    },
                )?
            } else {
                BTreeMap::new()
            };

            let mut deltas = vec![0.0; buckets.len()];
            for (i, bucket) in buckets.iter().enumerate() {
                let (raw, pct_delta) = Self::bucket_amounts(&raw_weekly, m, bucket, granularity);
                let delta = if m.is_removal() {
                    let earlier: f64 = applied
                        .iter()
                        .filter(|(prev, _)| m.covers_scope(prev.client_id, prev.product_id))
                        .map(|(_, d)| d[i])
                        .sum();
                    if raw == 0.0 && earlier == 0.0 {
                        0.0
                    } else {
                        -(raw + earlier)
                    }
                } else {
                    pct_delta
                };

                let before = demand[i];
                demand[i] = (before + delta).max(0.0);
                deltas[i] = demand[i] - before;
            }

            debug!(
                client_id = m.client_id,
                product_id = ?m.product_id,
                percentage = m.percentage,
                total_delta = deltas.iter().sum::<f64>(),
                "需求调整已应用"
            );
            applied.push((m, deltas));
        }

        Ok(())
    }
}

impl Default for DemandModifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;
    use crate::domain::forecast::DemandForecast;
    use crate::engine::calendar::{daily_buckets, weekly_buckets};
    use crate::engine::demand::ClientSelection;
    use crate::repository::InMemorySimulationRepository;
    use chrono::Datelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn product(id: i64) -> Product {
        Product {
            id,
            code: format!("P{}", id),
            name: format!("Product {}", id),
            category_id: None,
            default_line_id: Some(1),
            product_type: None,
            recipe: None,
            material: None,
            packaging: None,
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

    fn modification(client_id: i64, product_id: Option<i64>, pct: f64) -> DemandModification {
        DemandModification {
            client_id,
            product_id,
            start_date: d(2025, 3, 10),
            end_date: d(2025, 3, 23),
            percentage: pct,
        }
    }

    fn repo() -> InMemorySimulationRepository {
        InMemorySimulationRepository::new()
            .with_product(product(1))
            .with_product(product(2))
            .with_forecast(forecast(1, 1, d(2025, 3, 10), 100.0))
            .with_forecast(forecast(1, 2, d(2025, 3, 10), 40.0))
            .with_forecast(forecast(2, 1, d(2025, 3, 10), 60.0))
            .with_forecast(forecast(1, 1, d(2025, 3, 17), 100.0))
    }

    fn range() -> DateRange {
        DateRange::new(d(2025, 3, 10), d(2025, 3, 23))
    }

    fn query() -> DemandQuery {
        DemandQuery::for_products([1, 2].into_iter().collect())
    }

    #[test]
    fn test_percentages_read_raw_totals_and_accumulate() {
        let buckets = weekly_buckets(range());
        let mut demand = vec![200.0, 100.0];
        let mods = vec![modification(1, None, 50.0), modification(1, None, 50.0)];
        DemandModifier::new()
            .apply(&repo(), &query(), &mods, &buckets, Granularity::Week, range(), &mut demand)
            .unwrap();
        // client 1 原始 140 / 100, 两次 +50% 均基于原始量
        assert_eq!(demand, vec![340.0, 200.0]);
    }

    #[test]
    fn test_full_removal_wipes_scope_after_positive_modification() {
        let buckets = weekly_buckets(range());
        let mut demand = vec![140.0, 100.0];
        let q = query().with_clients(ClientSelection::Clients(vec![1]));
        let mods = vec![modification(1, None, 30.0), modification(1, None, -100.0)];
        DemandModifier::new()
            .apply(&repo(), &q, &mods, &buckets, Granularity::Week, range(), &mut demand)
            .unwrap();
        assert_eq!(demand, vec![0.0, 0.0]);
    }

    #[test]
    fn test_removal_keeps_other_clients() {
        let buckets = weekly_buckets(range());
        let mut demand = vec![200.0, 100.0];
        let mods = vec![modification(1, Some(1), 20.0), modification(1, None, -100.0)];
        DemandModifier::new()
            .apply(&repo(), &query(), &mods, &buckets, Granularity::Week, range(), &mut demand)
            .unwrap();
        // 仅剩客户 2 的 60
        assert_eq!(demand, vec![60.0, 0.0]);
    }

    #[test]
    fn test_floor_at_zero() {
        let buckets = weekly_buckets(range());
        let mut demand = vec![10.0, 100.0];
        let mods = vec![modification(1, None, -90.0)];
        DemandModifier::new()
            .apply(&repo(), &query(), &mods, &buckets, Granularity::Week, range(), &mut demand)
            .unwrap();
        assert_eq!(demand[0], 0.0);
        assert!((demand[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_scope_client_ignored() {
        let buckets = weekly_buckets(range());
        let mut demand = vec![60.0, 0.0];
        let q = query().with_clients(ClientSelection::Clients(vec![2]));
        let mods = vec![modification(1, None, 100.0)];
        DemandModifier::new()
            .apply(&repo(), &q, &mods, &buckets, Granularity::Week, range(), &mut demand)
            .unwrap();
        assert_eq!(demand, vec![60.0, 0.0]);
    }

    #[test]
    fn test_daily_spread_within_modification_bounds() {
        let week = DateRange::new(d(2025, 3, 10), d(2025, 3, 16));
        let buckets = daily_buckets(week);
        let mut demand = vec![40.0, 40.0, 40.0, 40.0, 40.0, 0.0, 0.0];
        let mut m = modification(2, None, 50.0);
        m.start_date = d(2025, 3, 13);
        m.end_date = d(2025, 3, 14);
        DemandModifier::new()
            .apply(&repo(), &query(), &[m], &buckets, Granularity::Day, week, &mut demand)
            .unwrap();
        // 客户 2 周量 60 × 50% = 30, 均分到周四/周五
        assert_eq!(demand, vec![40.0, 40.0, 40.0, 55.0, 55.0, 0.0, 0.0]);
    }

    #[test]
    fn test_daily_removal_never_removes_less_than_partial_cut() {
        let week = DateRange::new(d(2025, 3, 10), d(2025, 3, 16));
        let buckets = daily_buckets(week);
        let run = |pct: f64| {
            let mut demand = vec![100.0, 100.0, 100.0, 100.0, 100.0, 0.0, 0.0];
            let mut m = modification(1, None, pct);
            m.start_date = d(2025, 3, 13);
            m.end_date = d(2025, 3, 14);
            DemandModifier::new()
                .apply(&repo(), &query(), &[m], &buckets, Granularity::Day, week, &mut demand)
                .unwrap();
            demand
        };

        // 客户 1 周量 140, 周四/周五各分摊 70
        let removed = run(-100.0);
        let cut = run(-99.0);
        assert_eq!(removed, vec![100.0, 100.0, 100.0, 30.0, 30.0, 0.0, 0.0]);
        assert!((cut[3] - 30.7).abs() < 1e-9);
        for (r, c) in removed.iter().zip(cut.iter()) {
            assert!(r <= c, "-100% 不应比 -99% 剩余更多");
        }
    }
}

// ==========================================
// 产线产能模拟 - 季节性分摊（实验室模式）
// ==========================================
// 输入: 年需求量 + 目标周 + 可选参考产品历史
// 有参考产品:
//   份额(周, 年) = 该周数量 / 该年合计
//   目标周缺失时依次回溯前 N 年同周号, 仍缺失则取 1/52
// 无参考产品:
//   年需求量 / 52 均匀分摊到与预测区间相交的每一周
// ==========================================

use crate::config::EngineSettings;
use crate::domain::forecast::WeeklyHistory;
use crate::domain::lab::LabForecast;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::{instrument, trace};

/// 参考产品的周份额表: (ISO 年, ISO 周) → 份额
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonalityProfile {
    shares: HashMap<(i32, u32), f64>,
}

impl SeasonalityProfile {
    pub fn from_history(history: &[WeeklyHistory]) -> Self {
        let mut year_totals: HashMap<i32, f64> = HashMap::new();
        for h in history {
            *year_totals.entry(h.year).or_insert(0.0) += h.quantity;
        }

        let shares = history
            .iter()
            .filter_map(|h| {
                let total = year_totals.get(&h.year).copied().unwrap_or(0.0);
                if total > 0.0 {
                    Some(((h.year, h.week_number), h.quantity / total))
                } else {
                    None
                }
            })
            .collect();

        Self { shares }
    }

    pub fn share(&self, year: i32, week: u32) -> Option<f64> {
        self.shares.get(&(year, week)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

// ==========================================
// SeasonalityDistributor - 季节性分摊器
// ==========================================
pub struct SeasonalityDistributor {
    // 无状态
}

impl SeasonalityDistributor {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析目标周的份额（含回溯链）
    pub fn resolve_share(
        &self,
        profile: &SeasonalityProfile,
        year: i32,
        week: u32,
        settings: &EngineSettings,
    ) -> f64 {
        for offset in 0..=settings.seasonality_fallback_years as i32 {
            if let Some(share) = profile.share(year - offset, week) {
                if offset > 0 {
                    trace!(year, week, used_year = year - offset, "季节性份额回溯命中");
                }
                return share;
            }
        }
        settings.uniform_share()
    }

    /// 单条实验室预测按周分摊
    ///
    /// # 参数
    /// - mondays: 模拟区间内各周的周一
    /// - profile: 参考产品份额表（无参考产品时为 None）
    ///
    /// # 返回
    /// week_start → 合成需求（只含与预测区间相交的周）
    #[instrument(skip(self, mondays, profile, settings), fields(
        forecast_id = forecast.id,
        annual_quantity = forecast.annual_quantity,
        has_reference = profile.is_some()
    ))]
    pub fn distribute(
        &self,
        forecast: &LabForecast,
        mondays: &[NaiveDate],
        profile: Option<&SeasonalityProfile>,
        settings: &EngineSettings,
    ) -> BTreeMap<NaiveDate, f64> {
        mondays
            .iter()
            .filter(|monday| forecast.overlaps(**monday, **monday + Duration::days(6)))
            .map(|monday| {
                let share = match profile {
                    Some(p) => {
                        let iso = monday.iso_week();
                        self.resolve_share(p, iso.year(), iso.week(), settings)
                    }
                    None => settings.uniform_share(),
                };
                (*monday, forecast.annual_quantity * share)
            })
            .collect()
    }
}

impl Default for SeasonalityDistributor {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 产线产能模拟 - 产能计算
// ==========================================
// 周产能 = 每小时产量 × 效率 × 周工时
// 日产能 = 非生产日为 0, 否则 每小时产量 × 效率 × 班数 × 每班小时
// 桶产能 = 所选产线逐条独立解析后求和
// ==========================================

use crate::domain::lab::LabLine;
use crate::domain::line::ProductionLine;
use crate::domain::simulation::LineConfigDetail;
use crate::domain::types::Granularity;
use crate::engine::calendar::Bucket;
use crate::engine::config_resolver::{ConfigResolver, ResolvedConfig, ScheduleSelection};
use chrono::{Duration, NaiveDate};
use tracing::instrument;

/// 参与模拟的产线 + 班次选择
#[derive(Debug, Clone)]
pub struct ScheduledLine {
    pub line: ProductionLine,
    pub selection: ScheduleSelection,
}

impl ScheduledLine {
    pub fn date_based(line: ProductionLine) -> Self {
        Self {
            line,
            selection: ScheduleSelection::DateBased,
        }
    }
}

/// 单桶产能
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BucketCapacity {
    pub capacity: f64,
    /// 至少一条产线由覆写决定配置
    pub has_override: bool,
}

// ==========================================
// CapacityCalculator - 产能计算器
// ==========================================
pub struct CapacityCalculator {
    resolver: ConfigResolver,
}

impl CapacityCalculator {
    pub fn new() -> Self {
        Self {
            resolver: ConfigResolver::new(),
        }
    }

    /// 按解析结果计算单桶产能
    fn capacity_for(
        rate: f64,
        resolved: &ResolvedConfig,
        bucket: &Bucket,
        granularity: Granularity,
    ) -> f64 {
        match granularity {
            Granularity::Week => rate * resolved.weekly_hours(),
            Granularity::Day => {
                if resolved.works_on(bucket.start) {
                    rate * resolved.daily_hours()
                } else {
                    0.0
                }
            }
        }
    }

    /// 解析日期: 周桶用周一 + 探测偏移, 日桶用当天
    fn probe_date(bucket: &Bucket, granularity: Granularity, probe_offset_days: u32) -> NaiveDate {
        match granularity {
            Granularity::Week => bucket.start + Duration::days(probe_offset_days as i64),
            Granularity::Day => bucket.start,
        }
    }

    /// 单条产线单桶产能
    ///
    /// # 返回
    /// (产能, 是否来自覆写); 无可用配置时产能为 0
    pub fn line_capacity(
        &self,
        scheduled: &ScheduledLine,
        bucket: &Bucket,
        granularity: Granularity,
        probe_offset_days: u32,
    ) -> (f64, bool) {
        let date = Self::probe_date(bucket, granularity, probe_offset_days);
        match self.resolver.resolve(&scheduled.line, &scheduled.selection, date) {
            Some(resolved) => (
                Self::capacity_for(scheduled.line.effective_rate(), &resolved, bucket, granularity)
                    .max(0.0),
                resolved.is_override(),
            ),
            None => (0.0, false),
        }
    }

    pub fn bucket_capacity(
        &self,
        lines: &[ScheduledLine],
        bucket: &Bucket,
        granularity: Granularity,
        probe_offset_days: u32,
    ) -> BucketCapacity {
        lines.iter().fold(BucketCapacity::default(), |acc, scheduled| {
            let (capacity, from_override) =
                self.line_capacity(scheduled, bucket, granularity, probe_offset_days);
            BucketCapacity {
                capacity: acc.capacity + capacity,
                has_override: acc.has_override || from_override,
            }
        })
    }

    /// 全部桶的产能序列
    #[instrument(skip(self, lines, buckets), fields(
        line_count = lines.len(),
        bucket_count = buckets.len(),
        granularity = %granularity
    ))]
    pub fn series(
        &self,
        lines: &[ScheduledLine],
        buckets: &[Bucket],
        granularity: Granularity,
        probe_offset_days: u32,
    ) -> Vec<BucketCapacity> {
        buckets
            .iter()
            .map(|b| self.bucket_capacity(lines, b, granularity, probe_offset_days))
            .collect()
    }

    /// 虚拟产线单桶产能（固定班次）
    pub fn lab_bucket_capacity(
        &self,
        lab_lines: &[LabLine],
        bucket: &Bucket,
        granularity: Granularity,
    ) -> f64 {
        lab_lines
            .iter()
            .filter_map(|line| {
                self.resolver
                    .resolve_lab(line)
                    .map(|resolved| Self::capacity_for(line.effective_rate(), &resolved, bucket, granularity))
            })
            .map(|c| c.max(0.0))
            .sum()
    }

    pub fn lab_series(
        &self,
        lab_lines: &[LabLine],
        buckets: &[Bucket],
        granularity: Granularity,
    ) -> Vec<f64> {
        buckets
            .iter()
            .map(|b| self.lab_bucket_capacity(lab_lines, b, granularity))
            .collect()
    }

    /// 产线在某日的配置明细（按日期解析, 无配置的产线不输出）
    pub fn line_config_details(
        &self,
        lines: &[ProductionLine],
        date: NaiveDate,
    ) -> Vec<LineConfigDetail> {
        lines
            .iter()
            .filter_map(|line| {
                let resolved = self.resolver.resolve_for_date(line, date)?;
                let weekly_hours = resolved.weekly_hours();
                Some(LineConfigDetail {
                    line_id: line.id,
                    line_code: line.code.clone(),
                    line_name: line.name.clone(),
                    site_name: line.site_name.clone(),
                    source: resolved.source,
                    config_display: resolved.display.clone(),
                    shifts_per_day: resolved.shifts_per_day,
                    hours_per_shift: resolved.hours_per_shift,
                    include_saturday: resolved.include_saturday,
                    include_sunday: resolved.include_sunday,
                    weekly_hours,
                    reason: resolved.reason.clone(),
                    capacity_per_hour: line.base_capacity_per_hour,
                    efficiency: line.efficiency_factor,
                    weekly_capacity: line.effective_rate() * weekly_hours,
                })
            })
            .collect()
    }
}

impl Default for CapacityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line::{LineConfigOverride, ShiftConfiguration};
    use crate::domain::types::{ConfigSource, DateRange};
    use crate::engine::calendar::{daily_buckets, weekly_buckets};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn shift(shifts: u32, hours: f64, days: u32) -> ShiftConfiguration {
        ShiftConfiguration {
            id: 1,
            name: format!("{}x{}", shifts, hours),
            shifts_per_day: shifts,
            hours_per_shift: hours,
            days_per_week: days,
            includes_saturday: false,
            includes_sunday: false,
        }
    }

    fn line(id: i64, rate: f64, efficiency: f64) -> ProductionLine {
        ProductionLine {
            id,
            site_id: 1,
            code: format!("L{}", id),
            name: format!("Line {}", id),
            site_name: Some("Site".to_string()),
            base_capacity_per_hour: rate,
            efficiency_factor: efficiency,
            default_shift_config: Some(shift(2, 8.0, 5)),
            overrides: vec![],
            is_active: true,
        }
    }

    fn shutdown(line_id: i64, start: NaiveDate, end: NaiveDate) -> LineConfigOverride {
        LineConfigOverride {
            id: 1,
            line_id,
            start_date: start,
            end_date: end,
            shifts_per_day: 0,
            hours_per_shift: 8.0,
            days_per_week: None,
            include_saturday: false,
            include_sunday: false,
            recurrence_weeks: None,
            reason: Some("maintenance".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn test_weekly_capacity_formula() {
        // 1000/h × 0.8 × (2 × 8 × 5) = 64000
        let calc = CapacityCalculator::new();
        let lines = vec![ScheduledLine::date_based(line(1, 1000.0, 0.8))];
        let buckets = weekly_buckets(DateRange::new(d(2025, 3, 10), d(2025, 3, 16)));
        let series = calc.series(&lines, &buckets, Granularity::Week, 3);
        assert_eq!(series.len(), 1);
        assert!((series[0].capacity - 64000.0).abs() < 1e-6);
        assert!(!series[0].has_override);
    }

    #[test]
    fn test_capacity_sums_lines() {
        let calc = CapacityCalculator::new();
        let lines = vec![
            ScheduledLine::date_based(line(1, 1000.0, 0.8)),
            ScheduledLine::date_based(line(2, 500.0, 1.0)),
        ];
        let bucket = Bucket::week(d(2025, 3, 10));
        let total = calc.bucket_capacity(&lines, &bucket, Granularity::Week, 3);
        assert!((total.capacity - (64000.0 + 40000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_shutdown_override_zeroes_week_and_flags() {
        let calc = CapacityCalculator::new();
        let mut l = line(1, 1000.0, 0.8);
        l.overrides.push(shutdown(1, d(2025, 3, 10), d(2025, 3, 16)));
        let lines = vec![ScheduledLine::date_based(l)];
        let buckets = weekly_buckets(DateRange::new(d(2025, 3, 10), d(2025, 3, 23)));
        let series = calc.series(&lines, &buckets, Granularity::Week, 3);
        assert_eq!(series[0].capacity, 0.0);
        assert!(series[0].has_override);
        assert!((series[1].capacity - 64000.0).abs() < 1e-6);
        assert!(!series[1].has_override);
    }

    #[test]
    fn test_forced_selection_replaces_override() {
        let calc = CapacityCalculator::new();
        let mut l = line(1, 1000.0, 1.0);
        l.overrides.push(shutdown(1, d(2025, 3, 10), d(2025, 3, 16)));
        let lines = vec![ScheduledLine {
            line: l,
            selection: ScheduleSelection::Forced(shift(3, 8.0, 5)),
        }];
        let bucket = Bucket::week(d(2025, 3, 10));
        let total = calc.bucket_capacity(&lines, &bucket, Granularity::Week, 3);
        assert!((total.capacity - 120000.0).abs() < 1e-6);
        assert!(!total.has_override);
    }

    #[test]
    fn test_daily_capacity_skips_weekend() {
        let calc = CapacityCalculator::new();
        let lines = vec![ScheduledLine::date_based(line(1, 1000.0, 0.8))];
        let buckets = daily_buckets(DateRange::new(d(2025, 3, 14), d(2025, 3, 16)));
        let series = calc.series(&lines, &buckets, Granularity::Day, 3);
        assert!((series[0].capacity - 12800.0).abs() < 1e-6);
        assert_eq!(series[1].capacity, 0.0);
        assert_eq!(series[2].capacity, 0.0);
    }

    #[test]
    fn test_line_without_configuration_contributes_nothing() {
        let calc = CapacityCalculator::new();
        let mut l = line(1, 1000.0, 0.8);
        l.default_shift_config = None;
        let lines = vec![ScheduledLine::date_based(l)];
        let total = calc.bucket_capacity(&lines, &Bucket::week(d(2025, 3, 10)), Granularity::Week, 3);
        assert_eq!(total.capacity, 0.0);
    }

    #[test]
    fn test_lab_line_capacity() {
        let calc = CapacityCalculator::new();
        let lab = LabLine {
            id: 1,
            code: "LAB1".to_string(),
            name: "Lab".to_string(),
            base_capacity_per_hour: 100.0,
            efficiency_factor: 0.5,
            shift_config: Some(shift(1, 8.0, 5)),
        };
        let week = calc.lab_bucket_capacity(&[lab.clone()], &Bucket::week(d(2025, 3, 10)), Granularity::Week);
        assert!((week - 2000.0).abs() < 1e-6);
        let saturday = calc.lab_bucket_capacity(&[lab], &Bucket::day(d(2025, 3, 15)), Granularity::Day);
        assert_eq!(saturday, 0.0);
    }

    #[test]
    fn test_line_config_details() {
        let calc = CapacityCalculator::new();
        let mut l = line(1, 1000.0, 0.8);
        l.overrides.push(shutdown(1, d(2025, 3, 10), d(2025, 3, 16)));
        let details = calc.line_config_details(&[l.clone()], d(2025, 3, 12));
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].source, ConfigSource::Override);
        assert_eq!(details[0].reason.as_deref(), Some("maintenance"));
        assert_eq!(details[0].weekly_capacity, 0.0);

        let details = calc.line_config_details(&[l], d(2025, 3, 20));
        assert_eq!(details[0].source, ConfigSource::Default);
        assert!((details[0].weekly_capacity - 64000.0).abs() < 1e-6);
    }
}

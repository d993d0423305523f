// ==========================================
// 产线产能模拟 - 时间分桶
// ==========================================
// 周桶: 从 start 所在周的周一开始, 每周一个, 直到周一晚于 end
// 日桶: [start, end] 内每个自然日
// ==========================================

use crate::domain::line::is_weekend;
use crate::domain::types::{DateRange, Granularity};
use chrono::{Datelike, Duration, NaiveDate};

/// 工作日分摊天数（周一至周五）
pub const WEEKDAYS_PER_WEEK: f64 = 5.0;

/// 时间桶
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl Bucket {
    pub fn week(monday: NaiveDate) -> Self {
        Self {
            start: monday,
            end: monday + Duration::days(6),
            label: week_label(monday),
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
            label: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// 所在周的周一
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// 周标签: "W{ISO周}/{周一所在年}"
pub fn week_label(monday: NaiveDate) -> String {
    format!("W{}/{}", monday.iso_week().week(), monday.year())
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !is_weekend(date)
}

pub fn weekly_buckets(range: DateRange) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    let mut current = week_start(range.start);
    while current <= range.end {
        buckets.push(Bucket::week(current));
        current += Duration::days(7);
    }
    buckets
}

pub fn daily_buckets(range: DateRange) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    let mut current = range.start;
    while current <= range.end {
        buckets.push(Bucket::day(current));
        current += Duration::days(1);
    }
    buckets
}

pub fn buckets(range: DateRange, granularity: Granularity) -> Vec<Bucket> {
    match granularity {
        Granularity::Week => weekly_buckets(range),
        Granularity::Day => daily_buckets(range),
    }
}

/// 预测查询区间: [start 所在周周一, end]
pub fn forecast_range(range: DateRange) -> DateRange {
    DateRange::new(week_start(range.start), range.end)
}

/// 把周值映射到桶: 周桶取整周, 日桶在周一至周五均分
///
/// # 参数
/// - weekly: week_start → 周合计
pub fn spread_to_buckets(
    weekly: &std::collections::BTreeMap<NaiveDate, f64>,
    buckets: &[Bucket],
    granularity: Granularity,
) -> Vec<f64> {
    buckets
        .iter()
        .map(|bucket| match granularity {
            Granularity::Week => weekly.get(&bucket.start).copied().unwrap_or(0.0),
            Granularity::Day => {
                if is_weekday(bucket.start) {
                    weekly
                        .get(&week_start(bucket.start))
                        .copied()
                        .unwrap_or(0.0)
                        / WEEKDAYS_PER_WEEK
                } else {
                    0.0
                }
            }
        })
        .collect()
}

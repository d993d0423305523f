// ==========================================
// 产线产能模拟 - 汇总统计
// ==========================================
// 只统计利用率有定义的桶; 无产能桶单独计数
// 平均/峰值按未舍入利用率计算后保留一位小数
// ==========================================

use crate::domain::simulation::{DataPoint, SimulationSummary};
use crate::domain::types::{round1, Utilization};

/// 逐桶结果 → 汇总
pub fn summarize(points: &[DataPoint]) -> SimulationSummary {
    let mut summary = SimulationSummary::default();
    let mut utilization_sum = 0.0;
    let mut peak = 0.0_f64;
    let mut defined = 0usize;

    for point in points {
        match Utilization::compute(point.demand, point.capacity) {
            Utilization::Defined(percent) => {
                defined += 1;
                utilization_sum += percent;
                peak = peak.max(percent);
                if percent > 100.0 {
                    summary.over_capacity_period_count += 1;
                }
                summary.total_capacity += point.capacity;
                summary.total_demand += point.demand;
            }
            Utilization::Undefined => {
                summary.undefined_period_count += 1;
                summary.unserved_demand += point.demand;
            }
        }
    }

    if defined > 0 {
        summary.average_utilization = round1(utilization_sum / defined as f64);
        summary.peak_utilization = round1(peak);
    }
    summary
}

/// 释放产能 = 原平均利用率 - 新平均利用率（仅产能 > 0 的桶）
///
/// # 参数
/// - buckets: (原需求, 新需求, 产能)
pub fn freed_capacity_percent(buckets: &[(f64, f64, f64)]) -> f64 {
    let defined: Vec<&(f64, f64, f64)> = buckets.iter().filter(|(_, _, c)| *c > 0.0).collect();
    if defined.is_empty() {
        return 0.0;
    }
    let n = defined.len() as f64;
    let original: f64 = defined.iter().map(|(b, _, c)| b / c * 100.0).sum::<f64>() / n;
    let updated: f64 = defined.iter().map(|(_, d, c)| d / c * 100.0).sum::<f64>() / n;
    round1(original - updated)
}

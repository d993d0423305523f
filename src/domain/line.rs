// ==========================================
// 产线产能模拟 - 产线与班次领域模型
// ==========================================
// 职责: 产线、班次配置、日期区间覆写
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftConfiguration - 班次配置
// ==========================================
// 例: 3x8 (每天 3 班, 每班 8 小时), 2x7 SS (含周六周日)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftConfiguration {
    pub id: i64,
    pub name: String,
    pub shifts_per_day: u32,    // 每日班数 (1-4)
    pub hours_per_shift: f64,   // 每班小时数
    pub days_per_week: u32,     // 每周工作天数 (1-7)
    pub includes_saturday: bool, // 周六生产
    pub includes_sunday: bool,   // 周日生产
}

impl ShiftConfiguration {
    /// 周工时 = 班数 × 班时 × 周工作天数
    pub fn weekly_hours(&self) -> f64 {
        (self.shifts_per_day as f64 * self.hours_per_shift * self.days_per_week as f64).max(0.0)
    }
}

// ==========================================
// LineConfigOverride - 产线配置覆写
// ==========================================
// 用途: 检修、旺季、清洁周等时间段的临时班次
// 区间为闭区间 [start_date, end_date]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfigOverride {
    pub id: i64,
    pub line_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // ===== 覆写班次 =====
    pub shifts_per_day: u32, // 0 = 停产
    pub hours_per_shift: f64,
    pub days_per_week: Option<u32>, // 为空时按 5 + 周六 + 周日 推导
    pub include_saturday: bool,
    pub include_sunday: bool,

    // ===== 循环 =====
    pub recurrence_weeks: Option<u32>, // 每 k 周生效一次

    pub reason: Option<String>,
    pub is_active: bool,
}

impl LineConfigOverride {
    /// 闭区间包含判断
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 与 [start, end] 是否有交集
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// 循环覆写在该日期所在周是否生效
    ///
    /// floor((date - start) / 7) mod k == 0；无循环或 k == 0 视为连续生效
    pub fn recurs_on(&self, date: NaiveDate) -> bool {
        match self.recurrence_weeks {
            Some(k) if k > 0 => {
                let days = (date - self.start_date).num_days();
                if days < 0 {
                    return false;
                }
                (days / 7) % k as i64 == 0
            }
            _ => true,
        }
    }

    /// 周工作天数
    pub fn working_days(&self) -> u32 {
        self.days_per_week.unwrap_or_else(|| {
            5 + u32::from(self.include_saturday) + u32::from(self.include_sunday)
        })
    }

    pub fn weekly_hours(&self) -> f64 {
        (self.shifts_per_day as f64 * self.hours_per_shift * self.working_days() as f64).max(0.0)
    }

    /// 展示格式: "2x4 S" / "3x8 SS"
    pub fn config_display(&self) -> String {
        let weekend = if self.include_saturday && self.include_sunday {
            " SS"
        } else if self.include_saturday {
            " S"
        } else {
            ""
        };
        format!("{}x{}{}", self.shifts_per_day, self.hours_per_shift.trunc() as i64, weekend)
    }
}

// ==========================================
// ProductionLine - 生产线
// ==========================================
// 仓储返回的快照: 携带默认班次与（按窗口裁剪后的）覆写列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub id: i64,
    pub site_id: i64,
    pub code: String,
    pub name: String,
    pub site_name: Option<String>,

    // ===== 产能参数 =====
    pub base_capacity_per_hour: f64, // 100% 效率下每小时产量
    pub efficiency_factor: f64,      // 效率 (0-1)

    pub default_shift_config: Option<ShiftConfiguration>,
    pub overrides: Vec<LineConfigOverride>,
    pub is_active: bool,
}

impl ProductionLine {
    /// 有效产出/小时 = 基础产能 × 效率
    pub fn effective_rate(&self) -> f64 {
        (self.base_capacity_per_hour * self.efficiency_factor.clamp(0.0, 1.0)).max(0.0)
    }
}

/// 是否为周末
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

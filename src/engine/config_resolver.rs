// ==========================================
// 产线产能模拟 - 班次配置解析
// ==========================================
// 职责: 给定产线快照与日期, 解析生效的班次配置
// 规则:
// 1) 包含该日期的启用覆写按 (start_date, id) 升序扫描
// 2) 循环覆写仅在 floor((date - start) / 7) mod k == 0 的周生效
// 3) 首个通过的覆写胜出; 否则回退产线默认班次; 都没有则无产能
// 红线: 纯函数, 不访问仓储
// ==========================================

use crate::domain::lab::LabLine;
use crate::domain::line::{is_weekend, LineConfigOverride, ProductionLine, ShiftConfiguration};
use crate::domain::types::ConfigSource;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::instrument;

// ==========================================
// ResolvedConfig - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub source: ConfigSource,
    pub shifts_per_day: u32,
    pub hours_per_shift: f64,
    pub working_days: u32,
    pub include_saturday: bool,
    pub include_sunday: bool,
    pub override_id: Option<i64>,
    pub reason: Option<String>,
    pub display: Option<String>,
}

impl ResolvedConfig {
    pub fn from_shift(config: &ShiftConfiguration, source: ConfigSource) -> Self {
        Self {
            source,
            shifts_per_day: config.shifts_per_day,
            hours_per_shift: config.hours_per_shift,
            working_days: config.days_per_week,
            include_saturday: config.includes_saturday,
            include_sunday: config.includes_sunday,
            override_id: None,
            reason: None,
            display: None,
        }
    }

    pub fn from_override(o: &LineConfigOverride) -> Self {
        Self {
            source: ConfigSource::Override,
            shifts_per_day: o.shifts_per_day,
            hours_per_shift: o.hours_per_shift,
            working_days: o.working_days(),
            include_saturday: o.include_saturday,
            include_sunday: o.include_sunday,
            override_id: Some(o.id),
            reason: o.reason.clone(),
            display: Some(o.config_display()),
        }
    }

    /// 每日工时 = 班数 × 每班小时
    pub fn daily_hours(&self) -> f64 {
        (self.shifts_per_day as f64 * self.hours_per_shift).max(0.0)
    }

    /// 每周工时 = 每日工时 × 工作天数
    pub fn weekly_hours(&self) -> f64 {
        self.daily_hours() * self.working_days as f64
    }

    /// 该日期是否生产（周末需对应标记）
    pub fn works_on(&self, date: NaiveDate) -> bool {
        if !is_weekend(date) {
            return true;
        }
        match date.weekday() {
            Weekday::Sat => self.include_saturday,
            _ => self.include_sunday,
        }
    }

    pub fn is_override(&self) -> bool {
        self.source == ConfigSource::Override
    }
}

/// 单条产线的班次选择
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScheduleSelection {
    /// 按日期解析（覆写 → 默认班次）
    #[default]
    DateBased,
    /// 模拟请求强制指定的班次（整段生效）
    Forced(ShiftConfiguration),
}

// ==========================================
// ConfigResolver - 配置解析器
// ==========================================
pub struct ConfigResolver {
    // 无状态
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 在日期上生效的覆写
    ///
    /// # 返回
    /// 按 (start_date, id) 排序后首个包含该日期且通过循环判定的覆写
    pub fn matching_override<'a>(
        &self,
        overrides: &'a [LineConfigOverride],
        date: NaiveDate,
    ) -> Option<&'a LineConfigOverride> {
        let mut candidates: Vec<&LineConfigOverride> = overrides
            .iter()
            .filter(|o| o.is_active && o.contains(date))
            .collect();
        candidates.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        candidates.into_iter().find(|o| o.recurs_on(date))
    }

    /// 按日期解析产线配置
    ///
    /// # 返回
    /// - Some: 覆写或默认班次
    /// - None: 既无匹配覆写也无默认班次
    #[instrument(level = "trace", skip(self, line), fields(line_id = line.id))]
    pub fn resolve_for_date(&self, line: &ProductionLine, date: NaiveDate) -> Option<ResolvedConfig> {
        if let Some(o) = self.matching_override(&line.overrides, date) {
            return Some(ResolvedConfig::from_override(o));
        }
        line.default_shift_config
            .as_ref()
            .map(|c| ResolvedConfig::from_shift(c, ConfigSource::Default))
    }

    /// 按班次选择解析
    pub fn resolve(
        &self,
        line: &ProductionLine,
        selection: &ScheduleSelection,
        date: NaiveDate,
    ) -> Option<ResolvedConfig> {
        match selection {
            ScheduleSelection::Forced(config) => {
                Some(ResolvedConfig::from_shift(config, ConfigSource::Forced))
            }
            ScheduleSelection::DateBased => self.resolve_for_date(line, date),
        }
    }

    /// 虚拟产线: 固定班次, 不参与覆写
    pub fn resolve_lab(&self, line: &LabLine) -> Option<ResolvedConfig> {
        line.shift_config
            .as_ref()
            .map(|c| ResolvedConfig::from_shift(c, ConfigSource::Lab))
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

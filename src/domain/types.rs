// ==========================================
// 产线产能模拟 - 领域类型定义
// ==========================================
// 职责: 模拟引擎共用的枚举/值类型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 时间粒度 (Granularity)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与 config_kv 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    #[default]
    Week, // 周桶 (周一对齐)
    Day, // 日桶
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Week => write!(f, "WEEK"),
            Granularity::Day => write!(f, "DAY"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WEEK" | "W" => Ok(Granularity::Week),
            "DAY" | "D" => Ok(Granularity::Day),
            other => Err(format!("未知时间粒度: {}", other)),
        }
    }
}

// ==========================================
// 配置来源 (Config Source)
// ==========================================
// 一条产线在某天的生效班次配置来自哪里
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigSource {
    Override, // 日期区间覆写
    Default,  // 产线默认班次
    Forced,   // 模拟请求中人工指定的班次
    Lab,      // 虚拟产线固定班次
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Override => write!(f, "OVERRIDE"),
            ConfigSource::Default => write!(f, "DEFAULT"),
            ConfigSource::Forced => write!(f, "FORCED"),
            ConfigSource::Lab => write!(f, "LAB"),
        }
    }
}

// ==========================================
// 利用率 (Utilization)
// ==========================================
// 红线: 产能为 0 且需求 > 0 时不是一个数值，而是"无产能"状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "percent", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Utilization {
    Defined(f64),
    Undefined,
}

impl Utilization {
    /// 计算利用率
    ///
    /// - capacity > 0: demand / capacity × 100
    /// - capacity == 0 且 demand > 0: Undefined
    /// - 两者皆为 0: 0%
    pub fn compute(demand: f64, capacity: f64) -> Self {
        if capacity > 0.0 {
            Utilization::Defined(demand / capacity * 100.0)
        } else if demand > 0.0 {
            Utilization::Undefined
        } else {
            Utilization::Defined(0.0)
        }
    }

    /// 是否超产能（Undefined 视为超产能）
    pub fn is_over_capacity(&self) -> bool {
        match self {
            Utilization::Defined(p) => *p > 100.0,
            Utilization::Undefined => true,
        }
    }

    /// 保留一位小数（仅用于输出）
    pub fn rounded(&self) -> Self {
        match self {
            Utilization::Defined(p) => Utilization::Defined(round1(*p)),
            Utilization::Undefined => Utilization::Undefined,
        }
    }
}

impl fmt::Display for Utilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Utilization::Defined(p) => write!(f, "{:.1}%", p),
            Utilization::Undefined => write!(f, "NO_CAPACITY"),
        }
    }
}

/// 四舍五入到一位小数
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ==========================================
// 模拟模式 (Scenario Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioMode {
    Line,       // 产线模拟
    Category,   // 模拟分类
    NewClient,  // 新客户
    LostClient, // 流失客户
    Lab,        // 实验室（虚拟）
}

impl fmt::Display for ScenarioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioMode::Line => write!(f, "LINE"),
            ScenarioMode::Category => write!(f, "CATEGORY"),
            ScenarioMode::NewClient => write!(f, "NEW_CLIENT"),
            ScenarioMode::LostClient => write!(f, "LOST_CLIENT"),
            ScenarioMode::Lab => write!(f, "LAB"),
        }
    }
}

// ==========================================
// 空范围原因 (Empty Scope Reason)
// ==========================================
// 用于区分"需求为 0"与"没有可模拟的对象"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmptyScopeReason {
    NoLines,    // 没有有效产线
    NoProducts, // 分类没有匹配的产品
}

impl fmt::Display for EmptyScopeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyScopeReason::NoLines => write!(f, "NO_LINES"),
            EmptyScopeReason::NoProducts => write!(f, "NO_PRODUCTS"),
        }
    }
}

// ==========================================
// 日期区间 (Date Range)
// ==========================================
// 闭区间 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }
}

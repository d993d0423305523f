// ==========================================
// 产线产能模拟 - 实验室（虚拟）实体
// ==========================================
// 与真实实体平行的虚构世界: 新工厂/新产品/新客户假设
// ==========================================

use crate::domain::line::ShiftConfiguration;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// LabLine - 虚拟产线
// ==========================================
// 红线: 虚拟产线只使用自身固定班次, 不参与覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabLine {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub base_capacity_per_hour: f64,
    pub efficiency_factor: f64,
    pub shift_config: Option<ShiftConfiguration>,
}

impl LabLine {
    pub fn effective_rate(&self) -> f64 {
        (self.base_capacity_per_hour * self.efficiency_factor.clamp(0.0, 1.0)).max(0.0)
    }
}

// ==========================================
// LabProduct - 虚拟产品
// ==========================================
// 可挂在真实产线或虚拟产线上
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabProduct {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub default_line_id: Option<i64>,
    pub lab_default_line_id: Option<i64>,
}

// ==========================================
// LabForecast - 虚拟年度需求
// ==========================================
// annual_quantity 按季节性参考产品的历史周占比分摊
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabForecast {
    pub id: i64,
    pub lab_client_id: Option<i64>,
    pub client_id: Option<i64>,
    pub lab_product_id: Option<i64>,
    pub product_id: Option<i64>,
    pub reference_product_id: Option<i64>, // 季节性参考（真实产品）
    pub annual_quantity: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl LabForecast {
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

// ==========================================
// LabForecastFilter - 虚拟需求查询条件
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct LabForecastFilter {
    pub line_ids: Vec<i64>,
    pub lab_line_ids: Vec<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

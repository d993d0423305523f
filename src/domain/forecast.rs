// ==========================================
// 产线产能模拟 - 需求预测领域模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DemandForecast - 周需求预测
// ==========================================
// 唯一键: (client_id, product_id, year, week_number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub client_id: i64,
    pub product_id: i64,
    pub year: i32,            // ISO 年
    pub week_number: u32,     // ISO 周 (1-53)
    pub week_start_date: NaiveDate, // 该周周一
    pub forecast_quantity: f64,     // >= 0
}

// ==========================================
// ForecastFilter - 预测汇总筛选
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForecastFilter {
    pub client_id: Option<i64>,
    pub category_id: Option<i64>,
    pub product_id: Option<i64>,
}


// ==========================================
// WeeklyHistory - 产品历史周需求（季节性参考）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyHistory {
    pub year: i32,
    pub week_number: u32,
    pub quantity: f64,
}

// ==========================================
// DemandModification - 需求假设调整
// ==========================================
// percentage: -100 表示整段移除, 正数为增量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandModification {
    pub client_id: i64,
    #[serde(default)]
    pub product_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub percentage: f64,
}

impl DemandModification {
    pub fn factor(&self) -> f64 {
        self.percentage / 100.0
    }

    /// 是否为整段移除
    pub fn is_removal(&self) -> bool {
        self.percentage <= -100.0
    }

    /// 包含 (client, product) 范围: 本调整范围是否覆盖另一个调整范围
    pub fn covers_scope(&self, client_id: i64, product_id: Option<i64>) -> bool {
        self.client_id == client_id
            && match self.product_id {
                None => true,
                Some(p) => product_id == Some(p),
            }
    }
}

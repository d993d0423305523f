// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};
use line_capacity_sim::domain::{
    Client, DemandForecast, LineConfigOverride, Product, ProductionLine, ShiftConfiguration,
};

/// 五天班次
pub fn shift(id: i64, shifts_per_day: u32, hours_per_shift: f64) -> ShiftConfiguration {
    ShiftConfiguration {
        id,
        name: format!("{}x{}", shifts_per_day, hours_per_shift),
        shifts_per_day,
        hours_per_shift,
        days_per_week: 5,
        includes_saturday: false,
        includes_sunday: false,
    }
}

pub fn client(id: i64, code: &str) -> Client {
    Client {
        id,
        code: code.to_string(),
        name: format!("{} 客户", code),
        priority: 3,
        is_active: true,
    }
}

/// 连续 weeks 周的同量预测
pub fn weekly_forecasts(
    client_id: i64,
    product_id: i64,
    first_monday: NaiveDate,
    weeks: i64,
    quantity: f64,
) -> Vec<DemandForecast> {
    (0..weeks)
        .map(|w| {
            let monday = first_monday + Duration::days(7 * w);
            DemandForecast {
                client_id,
                product_id,
                year: monday.iso_week().year(),
                week_number: monday.iso_week().week(),
                week_start_date: monday,
                forecast_quantity: quantity,
            }
        })
        .collect()
}

// ==========================================
// LineBuilder
// ==========================================

pub struct LineBuilder {
    id: i64,
    site_id: i64,
    rate: f64,
    efficiency: f64,
    shift: Option<ShiftConfiguration>,
    is_active: bool,
}

impl LineBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            site_id: 1,
            rate: 1000.0,
            efficiency: 0.8,
            shift: Some(shift(1, 2, 8.0)),
            is_active: true,
        }
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn efficiency(mut self, efficiency: f64) -> Self {
        self.efficiency = efficiency;
        self
    }

    pub fn shift(mut self, shift: ShiftConfiguration) -> Self {
        self.shift = Some(shift);
        self
    }

    pub fn without_shift(mut self) -> Self {
        self.shift = None;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> ProductionLine {
        ProductionLine {
            id: self.id,
            site_id: self.site_id,
            code: format!("L{}", self.id),
            name: format!("产线{}", self.id),
            site_name: Some("主工厂".to_string()),
            base_capacity_per_hour: self.rate,
            efficiency_factor: self.efficiency,
            default_shift_config: self.shift,
            overrides: Vec::new(),
            is_active: self.is_active,
        }
    }
}

// ==========================================
// ProductBuilder
// ==========================================

pub struct ProductBuilder {
    id: i64,
    code: String,
    category_id: Option<i64>,
    default_line_id: Option<i64>,
    product_type: Option<String>,
}

impl ProductBuilder {
    pub fn new(id: i64, code: &str) -> Self {
        Self {
            id,
            code: code.to_string(),
            category_id: None,
            default_line_id: None,
            product_type: None,
        }
    }

    pub fn on_line(mut self, line_id: i64) -> Self {
        self.default_line_id = Some(line_id);
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn product_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }

    pub fn build(self) -> Product {
        Product {
            id: self.id,
            name: format!("产品 {}", self.code),
            code: self.code,
            category_id: self.category_id,
            default_line_id: self.default_line_id,
            product_type: self.product_type,
            recipe: None,
            material: None,
            packaging: None,
            is_active: true,
        }
    }
}

// ==========================================
// OverrideBuilder
// ==========================================

pub struct OverrideBuilder {
    inner: LineConfigOverride,
}

impl OverrideBuilder {
    pub fn new(id: i64, line_id: i64, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            inner: LineConfigOverride {
                id,
                line_id,
                start_date: start,
                end_date: end,
                shifts_per_day: 0,
                hours_per_shift: 0.0,
                days_per_week: None,
                include_saturday: false,
                include_sunday: false,
                recurrence_weeks: None,
                reason: None,
                is_active: true,
            },
        }
    }

    pub fn shifts(mut self, shifts_per_day: u32, hours_per_shift: f64) -> Self {
        self.inner.shifts_per_day = shifts_per_day;
        self.inner.hours_per_shift = hours_per_shift;
        self
    }

    pub fn weekend(mut self, saturday: bool, sunday: bool) -> Self {
        self.inner.include_saturday = saturday;
        self.inner.include_sunday = sunday;
        self
    }

    pub fn every_weeks(mut self, k: u32) -> Self {
        self.inner.recurrence_weeks = Some(k);
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.inner.reason = Some(reason.to_string());
        self
    }

    pub fn build(self) -> LineConfigOverride {
        self.inner
    }
}

// ==========================================
// 产线产能模拟 - 模拟请求校验器
// ==========================================
// 职责: 在进入引擎前拦截明显无效的请求
// 校验项: 日期区间、跨度上限、新客户注入量、需求调整参数
// 说明: 产线集合为空不在此拦截, 由引擎返回 NothingInScope
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::forecast::DemandModification;
use crate::domain::simulation::SimulationRequest;
use serde::{Deserialize, Serialize};

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// 字段路径（如 demand_modifications[1].percentage）
    pub field: String,
    /// 违规原因
    pub reason: String,
}

impl ValidationViolation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ==========================================
// SimulationRequestValidator - 请求校验器
// ==========================================
pub struct SimulationRequestValidator {
    max_simulation_days: i64,
}

impl SimulationRequestValidator {
    pub fn new(max_simulation_days: i64) -> Self {
        Self { max_simulation_days }
    }

    /// 收集全部违规项
    pub fn violations(&self, request: &SimulationRequest) -> Vec<ValidationViolation> {
        let mut violations = Vec::new();

        let (start, end, _) = request.window();
        if start > end {
            violations.push(ValidationViolation::new(
                "end_date",
                format!("结束日期 {} 早于开始日期 {}", end, start),
            ));
        } else {
            let days = (end - start).num_days() + 1;
            if days > self.max_simulation_days {
                violations.push(ValidationViolation::new(
                    "end_date",
                    format!("模拟跨度 {} 天超过上限 {} 天", days, self.max_simulation_days),
                ));
            }
        }

        if let SimulationRequest::NewClient(req) = request {
            if !req.new_client_demand.is_finite() || req.new_client_demand < 0.0 {
                violations.push(ValidationViolation::new(
                    "new_client_demand",
                    format!("新客户周需求必须为非负数: {}", req.new_client_demand),
                ));
            }
        }

        for (i, m) in request.demand_modifications().iter().enumerate() {
            Self::check_modification(i, m, &mut violations);
        }

        violations
    }

    fn check_modification(
        index: usize,
        m: &DemandModification,
        violations: &mut Vec<ValidationViolation>,
    ) {
        if !m.percentage.is_finite() {
            violations.push(ValidationViolation::new(
                format!("demand_modifications[{}].percentage", index),
                "百分比必须为有限数值",
            ));
        }
        if m.start_date > m.end_date {
            violations.push(ValidationViolation::new(
                format!("demand_modifications[{}].end_date", index),
                format!("调整结束日期 {} 早于开始日期 {}", m.end_date, m.start_date),
            ));
        }
    }

    /// 校验请求
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ApiError::InvalidInput): 违规项拼接后的说明
    pub fn validate(&self, request: &SimulationRequest) -> ApiResult<()> {
        let violations = self.violations(request);
        if violations.is_empty() {
            return Ok(());
        }
        tracing::warn!(violation_count = violations.len(), "模拟请求校验失败");
        let message = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.reason))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ApiError::InvalidInput(message))
    }
}

// ==========================================
// 产线产能模拟 - 模拟 API
// ==========================================
// 职责: 请求校验 → 引擎编排 → 错误映射
// ==========================================

use chrono::NaiveDate;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::validator::SimulationRequestValidator;
use crate::domain::simulation::{
    CategorySimulationRequest, LabSimulationRequest, LineConfigDetail, LineSimulationRequest,
    LostClientSimulationRequest, NewClientSimulationRequest, SimulationOutcome, SimulationRequest,
};
use crate::engine::SimulationOrchestrator;

// ==========================================
// SimulationApi - 模拟 API
// ==========================================

/// 模拟API
///
/// 职责：
/// 1. 五种模式的模拟入口
/// 2. 产线配置明细查询
pub struct SimulationApi {
    orchestrator: Arc<SimulationOrchestrator>,
    validator: SimulationRequestValidator,
}

impl SimulationApi {
    pub fn new(orchestrator: Arc<SimulationOrchestrator>) -> Self {
        let validator = SimulationRequestValidator::new(orchestrator.settings().max_simulation_days);
        Self {
            orchestrator,
            validator,
        }
    }

    /// 执行模拟
    ///
    /// # 返回
    /// - Ok(SimulationOutcome): 完成结果或"无可模拟对象"
    /// - Err(ApiError): 输入无效 / 数据访问失败
    pub fn simulate(&self, request: &SimulationRequest) -> ApiResult<SimulationOutcome> {
        self.validator.validate(request)?;
        Ok(self.orchestrator.run(request)?)
    }

    pub fn simulate_line(&self, request: LineSimulationRequest) -> ApiResult<SimulationOutcome> {
        self.simulate(&SimulationRequest::Line(request))
    }

    pub fn simulate_category(
        &self,
        request: CategorySimulationRequest,
    ) -> ApiResult<SimulationOutcome> {
        self.simulate(&SimulationRequest::Category(request))
    }

    pub fn simulate_new_client(
        &self,
        request: NewClientSimulationRequest,
    ) -> ApiResult<SimulationOutcome> {
        self.simulate(&SimulationRequest::NewClient(request))
    }

    pub fn simulate_lost_client(
        &self,
        request: LostClientSimulationRequest,
    ) -> ApiResult<SimulationOutcome> {
        self.simulate(&SimulationRequest::LostClient(request))
    }

    pub fn simulate_lab(&self, request: LabSimulationRequest) -> ApiResult<SimulationOutcome> {
        self.simulate(&SimulationRequest::Lab(request))
    }

    /// 产线在某日的生效配置明细
    pub fn line_config_details(
        &self,
        line_ids: &[i64],
        date: NaiveDate,
    ) -> ApiResult<Vec<LineConfigDetail>> {
        Ok(self.orchestrator.line_config_details(line_ids, date)?)
    }
}

// ==========================================
// 产线产能模拟 - 引擎编排器
// ==========================================
// 用途: 按模拟模式协调 分桶 → 产能 → 需求 → 调整 → 汇总
// 模式: LINE / CATEGORY / NEW_CLIENT / LOST_CLIENT / LAB
// 红线: 每次调用新建 SimulationContext, 调用结束即丢弃
// 红线: 引擎只读仓储, 不写库
// ==========================================

use crate::config::EngineSettings;
use crate::domain::catalog::{Client, Product, ProductFilter};
use crate::domain::forecast::DemandModification;
use crate::domain::lab::LabForecastFilter;
use crate::domain::line::ProductionLine;
use crate::domain::simulation::{
    CategorySimulationRequest, ClientOverlay, DataPoint, LabSimulationRequest, LabTotals,
    LineConfigDetail, LineShiftSelection, LineSimulationRequest, LostClientSimulationRequest,
    NewClientSimulationRequest, OverlayData, OverlayPoint, SimulationOutcome, SimulationReport,
    SimulationRequest,
};
use crate::domain::types::{DateRange, EmptyScopeReason, Granularity, ScenarioMode, Utilization};
use crate::engine::calendar::{self, is_weekday, Bucket, WEEKDAYS_PER_WEEK};
use crate::engine::capacity::{BucketCapacity, CapacityCalculator, ScheduledLine};
use crate::engine::config_resolver::ScheduleSelection;
use crate::engine::context::SimulationContext;
use crate::engine::demand::{ClientSelection, DemandAggregator, DemandQuery};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::modifier::DemandModifier;
use crate::engine::seasonality::{SeasonalityDistributor, SeasonalityProfile};
use crate::engine::summary::{freed_capacity_percent, summarize};
use crate::perf::PerfGuard;
use crate::repository::SimulationRepository;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 内部辅助类型
// ==========================================

/// 单次调用的时间框架
struct RunFrame {
    mode: ScenarioMode,
    granularity: Granularity,
    range: DateRange,
    forecast_range: DateRange,
    buckets: Vec<Bucket>,
}

impl RunFrame {
    fn zeros(&self) -> Vec<f64> {
        vec![0.0; self.buckets.len()]
    }
}

/// 产品代码筛选的解析结果
enum ProductCode {
    Any,
    Known(Product),
    Unknown,
}

impl ProductCode {
    fn product_id(&self) -> Option<i64> {
        match self {
            ProductCode::Known(p) => Some(p.id),
            _ => None,
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            ProductCode::Known(p) => Some(p.label()),
            _ => None,
        }
    }

    /// 未知产品代码: 产品集合清空, 需求为 0
    fn narrow(&self, product_ids: &mut BTreeSet<i64>) {
        if let ProductCode::Unknown = self {
            product_ids.clear();
        }
    }
}

/// 客户代码筛选的解析结果
struct ClientScope {
    selection: ClientSelection,
    clients: Vec<Client>,
}

impl ClientScope {
    fn names(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.name.clone()).collect()
    }
}

fn non_empty_codes(codes: &[String]) -> impl Iterator<Item = &str> {
    codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty())
}

// ==========================================
// SimulationOrchestrator - 引擎编排器
// ==========================================

pub struct SimulationOrchestrator {
    repo: Arc<dyn SimulationRepository>,
    settings: EngineSettings,
    capacity: CapacityCalculator,
    demand: DemandAggregator,
    modifier: DemandModifier,
    seasonality: SeasonalityDistributor,
}

impl SimulationOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - repo: 只读仓储
    /// - settings: 启动时加载的引擎参数
    pub fn new(repo: Arc<dyn SimulationRepository>, settings: EngineSettings) -> Self {
        Self {
            repo,
            settings,
            capacity: CapacityCalculator::new(),
            demand: DemandAggregator::new(),
            modifier: DemandModifier::new(),
            seasonality: SeasonalityDistributor::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// 执行一次模拟
    ///
    /// # 返回
    /// - Completed: 逐桶结果 + 汇总
    /// - NothingInScope: 没有可模拟的产线/产品
    #[instrument(skip(self, request), fields(mode = %request.mode()))]
    pub fn run(&self, request: &SimulationRequest) -> EngineResult<SimulationOutcome> {
        let _perf = PerfGuard::new("simulation_run");

        let (start, end, granularity) = request.window();
        self.validate_range(start, end)?;
        let granularity = granularity.unwrap_or(self.settings.default_granularity);
        let range = DateRange::new(start, end);

        // 覆写窗口覆盖首桶周一到末桶周日
        let window = DateRange::new(
            calendar::week_start(start),
            calendar::week_start(end) + Duration::days(6),
        );
        let mut ctx = SimulationContext::new(self.settings, window);
        let frame = RunFrame {
            mode: request.mode(),
            granularity,
            range,
            forecast_range: calendar::forecast_range(range),
            buckets: calendar::buckets(range, granularity),
        };

        info!(
            run_id = %ctx.run_id,
            mode = %frame.mode,
            granularity = %granularity,
            start_date = %start,
            end_date = %end,
            bucket_count = frame.buckets.len(),
            "开始模拟"
        );

        let outcome = match request {
            SimulationRequest::Line(req) => self.run_line(&mut ctx, &frame, req)?,
            SimulationRequest::Category(req) => self.run_category(&mut ctx, &frame, req)?,
            SimulationRequest::NewClient(req) => self.run_new_client(&mut ctx, &frame, req)?,
            SimulationRequest::LostClient(req) => self.run_lost_client(&mut ctx, &frame, req)?,
            SimulationRequest::Lab(req) => self.run_lab(&mut ctx, &frame, req)?,
        };

        match &outcome {
            SimulationOutcome::Completed(report) => info!(
                run_id = %report.run_id,
                average_utilization = report.summary.average_utilization,
                peak_utilization = report.summary.peak_utilization,
                over_capacity_period_count = report.summary.over_capacity_period_count,
                undefined_period_count = report.summary.undefined_period_count,
                "模拟完成"
            ),
            SimulationOutcome::NothingInScope { run_id, reason, .. } => {
                info!(run_id = %run_id, reason = %reason, "模拟范围为空")
            }
        }

        Ok(outcome)
    }

    /// 产线在某日的生效配置明细
    #[instrument(skip(self))]
    pub fn line_config_details(
        &self,
        line_ids: &[i64],
        date: NaiveDate,
    ) -> EngineResult<Vec<LineConfigDetail>> {
        let lines = self
            .repo
            .get_lines(line_ids, true, DateRange::new(date, date))?;
        Ok(self.capacity.line_config_details(&lines, date))
    }

    // ==========================================
    // 模式: 产线
    // ==========================================

    #[instrument(skip_all, fields(run_id = %ctx.run_id, line_count = req.line_ids.len()))]
    fn run_line(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        req: &LineSimulationRequest,
    ) -> EngineResult<SimulationOutcome> {
        let repo = self.repo.as_ref();
        let lines = ctx.lines(repo, &req.line_ids)?;
        if lines.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoLines));
        }
        let line_ids = Self::line_ids(&lines);
        let capacity = self.capacity_series(ctx, frame, lines, &req.shift_configs)?;

        let filter = req.product_filter.as_ref().filter(|f| !f.is_empty());
        let product = self.resolve_product(ctx, req.product_code.as_deref())?;
        let clients = self.resolve_clients(ctx, &req.client_codes)?;

        let mut product_ids = ctx.default_product_ids(repo, &line_ids, filter)?;
        product.narrow(&mut product_ids);
        let query = DemandQuery::for_products(product_ids)
            .with_clients(clients.selection.clone())
            .with_product(product.product_id());
        let demand = self.modified_demand(frame, &query, &req.demand_modifications)?;

        let mut points = Self::base_points(frame, &demand, &capacity);

        // 叠加曲线基于产线全部默认产品（不受产品/分类收窄）
        let needs_line_products =
            clients.selection != ClientSelection::All || !req.overlay_client_codes.is_empty();
        let line_products = if needs_line_products {
            ctx.default_product_ids(repo, &line_ids, None)?
        } else {
            BTreeSet::new()
        };
        let client_overlays = self.attach_client_overlays(
            ctx,
            frame,
            &line_products,
            &clients,
            &req.overlay_client_codes,
            &mut points,
        )?;

        let overlay = OverlayData {
            client_names: clients.names(),
            product_name: product.label(),
            category_name: self.category_name(filter)?,
            ..Default::default()
        };
        Ok(Self::completed(ctx, frame, points, overlay, client_overlays, None))
    }

    // ==========================================
    // 模式: 模拟分类
    // ==========================================

    #[instrument(skip_all, fields(run_id = %ctx.run_id, category_id = req.category_id))]
    fn run_category(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        req: &CategorySimulationRequest,
    ) -> EngineResult<SimulationOutcome> {
        let repo = self.repo.as_ref();
        let scope = repo
            .get_simulation_category(req.category_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "SimulationCategory".to_string(),
                id: req.category_id.to_string(),
            })?;

        let lines = ctx.lines(repo, &scope.line_ids)?;
        if lines.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoLines));
        }
        let line_ids = Self::line_ids(&lines);

        // 匹配产品 ∩ 默认产线在分类产线集合内的产品
        let line_products = ctx.default_product_ids(repo, &line_ids, None)?;
        let mut product_ids: BTreeSet<i64> = scope
            .matching_product_ids
            .intersection(&line_products)
            .copied()
            .collect();
        if product_ids.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoProducts));
        }
        debug!(
            line_count = line_ids.len(),
            product_count = product_ids.len(),
            "分类范围已解析"
        );

        let capacity = self.capacity_series(ctx, frame, lines, &req.shift_configs)?;
        let product = self.resolve_product(ctx, req.product_code.as_deref())?;
        let clients = self.resolve_clients(ctx, &req.client_codes)?;
        product.narrow(&mut product_ids);
        let query = DemandQuery::for_products(product_ids)
            .with_clients(clients.selection.clone())
            .with_product(product.product_id());
        let demand = self.modified_demand(frame, &query, &req.demand_modifications)?;

        let mut points = Self::base_points(frame, &demand, &capacity);
        let client_overlays = self.attach_client_overlays(
            ctx,
            frame,
            &line_products,
            &clients,
            &req.overlay_client_codes,
            &mut points,
        )?;

        let overlay = OverlayData {
            client_names: clients.names(),
            product_name: product.label(),
            category_name: Some(scope.category.name.clone()),
            ..Default::default()
        };
        Ok(Self::completed(ctx, frame, points, overlay, client_overlays, None))
    }

    // ==========================================
    // 模式: 新客户
    // ==========================================

    #[instrument(skip_all, fields(
        run_id = %ctx.run_id,
        new_client_demand = req.new_client_demand,
        remove_client_id = ?req.remove_client_id
    ))]
    fn run_new_client(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        req: &NewClientSimulationRequest,
    ) -> EngineResult<SimulationOutcome> {
        let repo = self.repo.as_ref();
        let lines = ctx.lines(repo, &req.line_ids)?;
        if lines.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoLines));
        }
        let line_ids = Self::line_ids(&lines);
        let capacity = self.capacity_series(ctx, frame, lines, &req.shift_configs)?;

        let products = ctx.default_product_ids(repo, &line_ids, None)?;
        let base = self.demand.bucket_demand(
            repo,
            &DemandQuery::for_products(products.clone()),
            frame.forecast_range,
            &frame.buckets,
            frame.granularity,
        )?;
        let (removed, removed_client) = match req.remove_client_id {
            Some(client_id) => self.client_demand(ctx, frame, &products, client_id)?,
            None => (frame.zeros(), None),
        };

        let points = frame
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                let injected =
                    Self::injected_demand(bucket, frame.granularity, req.new_client_demand);
                let demand = (base[i] + injected - removed[i]).max(0.0);
                let mut point = DataPoint::new(
                    bucket.label.clone(),
                    bucket.start,
                    demand,
                    capacity[i].capacity,
                    capacity[i].has_override,
                );
                point.base_demand = Some(base[i]);
                point.new_client_demand = Some(injected);
                point.removed_demand = Some(removed[i]);
                point
            })
            .collect();

        let overlay = OverlayData {
            new_client_weekly_demand: Some(req.new_client_demand),
            removed_client_name: removed_client.map(|c| c.name),
            ..Default::default()
        };
        Ok(Self::completed(ctx, frame, points, overlay, BTreeMap::new(), None))
    }

    // ==========================================
    // 模式: 流失客户
    // ==========================================

    #[instrument(skip_all, fields(run_id = %ctx.run_id, lost_client_id = req.lost_client_id))]
    fn run_lost_client(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        req: &LostClientSimulationRequest,
    ) -> EngineResult<SimulationOutcome> {
        let repo = self.repo.as_ref();
        let lines = ctx.lines(repo, &req.line_ids)?;
        if lines.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoLines));
        }
        let line_ids = Self::line_ids(&lines);
        let capacity = self.capacity_series(ctx, frame, lines, &req.shift_configs)?;

        let products = ctx.default_product_ids(repo, &line_ids, None)?;
        let base = self.demand.bucket_demand(
            repo,
            &DemandQuery::for_products(products.clone()),
            frame.forecast_range,
            &frame.buckets,
            frame.granularity,
        )?;
        let (lost, lost_client) = self.client_demand(ctx, frame, &products, req.lost_client_id)?;

        let mut freed_input = Vec::with_capacity(frame.buckets.len());
        let points = frame
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                let cap = capacity[i].capacity;
                let demand = (base[i] - lost[i]).max(0.0);
                freed_input.push((base[i], demand, cap));
                let mut point = DataPoint::new(
                    bucket.label.clone(),
                    bucket.start,
                    demand,
                    cap,
                    capacity[i].has_override,
                );
                point.base_demand = Some(base[i]);
                point.lost_demand = Some(lost[i]);
                point.original_utilization = Some(Utilization::compute(base[i], cap).rounded());
                point
            })
            .collect();

        let overlay = OverlayData {
            lost_client_name: lost_client.map(|c| c.name),
            total_lost_demand: Some(lost.iter().sum()),
            freed_capacity_percent: Some(freed_capacity_percent(&freed_input)),
            ..Default::default()
        };
        Ok(Self::completed(ctx, frame, points, overlay, BTreeMap::new(), None))
    }

    // ==========================================
    // 模式: 实验室
    // ==========================================

    #[instrument(skip_all, fields(
        run_id = %ctx.run_id,
        line_count = req.line_ids.len(),
        lab_line_count = req.lab_line_ids.len()
    ))]
    fn run_lab(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        req: &LabSimulationRequest,
    ) -> EngineResult<SimulationOutcome> {
        let repo = self.repo.as_ref();
        let lines = if req.line_ids.is_empty() {
            Vec::new()
        } else {
            ctx.lines(repo, &req.line_ids)?
        };
        let lab_lines = if req.lab_line_ids.is_empty() {
            Vec::new()
        } else {
            repo.get_lab_lines(&req.lab_line_ids)?
        };
        if lines.is_empty() && lab_lines.is_empty() {
            return Ok(Self::nothing_in_scope(ctx, frame, EmptyScopeReason::NoLines));
        }

        let line_ids = Self::line_ids(&lines);
        let lab_line_ids: Vec<i64> = lab_lines.iter().map(|l| l.id).collect();
        let real_capacity = self.capacity_series(ctx, frame, lines, &req.shift_configs)?;
        let lab_capacity = self
            .capacity
            .lab_series(&lab_lines, &frame.buckets, frame.granularity);

        // 真实需求（客户/产品/属性筛选 + 调整）
        let filter = req.product_filter.as_ref().filter(|f| !f.is_empty());
        let product = self.resolve_product(ctx, req.product_code.as_deref())?;
        let clients = self.resolve_clients(ctx, &req.client_codes)?;
        let real_demand = if line_ids.is_empty() {
            frame.zeros()
        } else {
            let mut product_ids = ctx.default_product_ids(repo, &line_ids, filter)?;
            product.narrow(&mut product_ids);
            let query = DemandQuery::for_products(product_ids)
                .with_clients(clients.selection.clone())
                .with_product(product.product_id());
            self.modified_demand(frame, &query, &req.demand_modifications)?
        };

        let lab_demand = if req.include_lab_forecasts {
            self.lab_demand(ctx, frame, &line_ids, &lab_line_ids)?
        } else {
            frame.zeros()
        };

        let mut totals = LabTotals::default();
        let points = frame
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                totals.total_real_capacity += real_capacity[i].capacity;
                totals.total_lab_capacity += lab_capacity[i];
                totals.total_real_demand += real_demand[i];
                totals.total_lab_demand += lab_demand[i];

                let mut point = DataPoint::new(
                    bucket.label.clone(),
                    bucket.start,
                    real_demand[i] + lab_demand[i],
                    real_capacity[i].capacity + lab_capacity[i],
                    real_capacity[i].has_override,
                );
                point.real_demand = Some(real_demand[i]);
                point.lab_demand = Some(lab_demand[i]);
                point.real_capacity = Some(real_capacity[i].capacity);
                point.lab_capacity = Some(lab_capacity[i]);
                point
            })
            .collect();

        let overlay = OverlayData {
            client_names: clients.names(),
            product_name: product.label(),
            category_name: self.category_name(filter)?,
            ..Default::default()
        };
        Ok(Self::completed(ctx, frame, points, overlay, BTreeMap::new(), Some(totals)))
    }

    /// 实验室预测按季节性分摊后的桶需求
    fn lab_demand(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        line_ids: &[i64],
        lab_line_ids: &[i64],
    ) -> EngineResult<Vec<f64>> {
        let repo = self.repo.as_ref();
        let forecasts = repo.get_lab_forecasts(&LabForecastFilter {
            line_ids: line_ids.to_vec(),
            lab_line_ids: lab_line_ids.to_vec(),
            start_date: frame.forecast_range.start,
            end_date: frame.range.end,
        })?;

        let mondays: Vec<NaiveDate> = calendar::weekly_buckets(frame.range)
            .iter()
            .map(|b| b.start)
            .collect();
        let mut weekly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for forecast in &forecasts {
            let profile = match forecast.reference_product_id {
                Some(product_id) => Some(SeasonalityProfile::from_history(
                    &ctx.weekly_history(repo, product_id)?,
                )),
                None => None,
            };
            let distributed =
                self.seasonality
                    .distribute(forecast, &mondays, profile.as_ref(), &ctx.settings);
            for (monday, quantity) in distributed {
                *weekly.entry(monday).or_insert(0.0) += quantity;
            }
        }
        debug!(forecast_count = forecasts.len(), "实验室需求已分摊");

        Ok(calendar::spread_to_buckets(
            &weekly,
            &frame.buckets,
            frame.granularity,
        ))
    }

    // ==========================================
    // 共用步骤
    // ==========================================

    fn validate_range(&self, start: NaiveDate, end: NaiveDate) -> EngineResult<()> {
        if start > end {
            return Err(EngineError::InvalidDateRange { start, end });
        }
        let days = (end - start).num_days() + 1;
        if days > self.settings.max_simulation_days {
            return Err(EngineError::RangeTooLong {
                days,
                max_days: self.settings.max_simulation_days,
            });
        }
        Ok(())
    }

    fn line_ids(lines: &[ProductionLine]) -> Vec<i64> {
        lines.iter().map(|l| l.id).collect()
    }

    /// 产线 + 班次选择 → 产能序列
    fn capacity_series(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        lines: Vec<ProductionLine>,
        selections: &[LineShiftSelection],
    ) -> EngineResult<Vec<BucketCapacity>> {
        let scheduled = self.schedule_lines(ctx, lines, selections)?;
        Ok(self.capacity.series(
            &scheduled,
            &frame.buckets,
            frame.granularity,
            ctx.settings.weekly_probe_offset_days,
        ))
    }

    /// 班次选择: use_override 优先; 指定班次不存在时回退按日期解析
    fn schedule_lines(
        &self,
        ctx: &mut SimulationContext,
        lines: Vec<ProductionLine>,
        selections: &[LineShiftSelection],
    ) -> EngineResult<Vec<ScheduledLine>> {
        let repo = self.repo.as_ref();
        let mut scheduled = Vec::with_capacity(lines.len());
        for line in lines {
            let forced_id = selections
                .iter()
                .find(|s| s.line_id == line.id)
                .filter(|s| !s.use_override)
                .and_then(|s| s.shift_config_id);

            let selection = match forced_id {
                Some(config_id) => match ctx.shift_configuration(repo, config_id)? {
                    Some(config) => ScheduleSelection::Forced(config),
                    None => {
                        warn!(
                            line_id = line.id,
                            shift_config_id = config_id,
                            "指定班次不存在, 回退按日期解析"
                        );
                        ScheduleSelection::DateBased
                    }
                },
                None => ScheduleSelection::DateBased,
            };
            scheduled.push(ScheduledLine { line, selection });
        }
        Ok(scheduled)
    }

    /// 客户代码 → 客户范围（未知代码忽略）
    fn resolve_clients(
        &self,
        ctx: &mut SimulationContext,
        codes: &[String],
    ) -> EngineResult<ClientScope> {
        let mut requested = non_empty_codes(codes).peekable();
        if requested.peek().is_none() {
            return Ok(ClientScope {
                selection: ClientSelection::All,
                clients: Vec::new(),
            });
        }

        let mut clients: Vec<Client> = Vec::new();
        for code in requested {
            match ctx.client_by_code(self.repo.as_ref(), code)? {
                Some(client) => {
                    if !clients.iter().any(|c| c.id == client.id) {
                        clients.push(client);
                    }
                }
                None => warn!(client_code = code, "客户代码不存在, 已忽略"),
            }
        }

        Ok(ClientScope {
            selection: ClientSelection::Clients(clients.iter().map(|c| c.id).collect()),
            clients,
        })
    }

    fn resolve_product(
        &self,
        ctx: &mut SimulationContext,
        code: Option<&str>,
    ) -> EngineResult<ProductCode> {
        let code = match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c,
            None => return Ok(ProductCode::Any),
        };
        match ctx.product_by_code(self.repo.as_ref(), code)? {
            Some(product) => Ok(ProductCode::Known(product)),
            None => {
                warn!(product_code = code, "产品代码不存在, 需求按 0 计");
                Ok(ProductCode::Unknown)
            }
        }
    }

    fn category_name(&self, filter: Option<&ProductFilter>) -> EngineResult<Option<String>> {
        match filter.and_then(|f| f.category_id) {
            Some(id) => Ok(self.repo.get_product_category(id)?.map(|c| c.name)),
            None => Ok(None),
        }
    }

    /// 需求序列 + 假设调整
    fn modified_demand(
        &self,
        frame: &RunFrame,
        query: &DemandQuery,
        modifications: &[DemandModification],
    ) -> EngineResult<Vec<f64>> {
        let repo = self.repo.as_ref();
        let mut demand = self.demand.bucket_demand(
            repo,
            query,
            frame.forecast_range,
            &frame.buckets,
            frame.granularity,
        )?;
        if !modifications.is_empty() {
            self.modifier.apply(
                repo,
                query,
                modifications,
                &frame.buckets,
                frame.granularity,
                frame.forecast_range,
                &mut demand,
            )?;
        }
        Ok(demand)
    }

    /// 单客户在产品集合上的需求（客户不存在时为 0）
    fn client_demand(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        products: &BTreeSet<i64>,
        client_id: i64,
    ) -> EngineResult<(Vec<f64>, Option<Client>)> {
        let repo = self.repo.as_ref();
        match ctx.client(repo, client_id)? {
            Some(client) => {
                let query = DemandQuery::for_products(products.clone())
                    .with_clients(ClientSelection::Clients(vec![client.id]));
                let demand = self.demand.bucket_demand(
                    repo,
                    &query,
                    frame.forecast_range,
                    &frame.buckets,
                    frame.granularity,
                )?;
                Ok((demand, Some(client)))
            }
            None => {
                warn!(client_id, "客户不存在, 需求按 0 计");
                Ok((frame.zeros(), None))
            }
        }
    }

    /// 客户筛选生效时写入 overlay_demand, 并生成叠加客户曲线
    ///
    /// # 参数
    /// - line_products: 产线集合的全部默认产品
    /// - clients: 主曲线的客户范围
    /// - overlay_codes: 额外叠加的客户代码
    fn attach_client_overlays(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        line_products: &BTreeSet<i64>,
        clients: &ClientScope,
        overlay_codes: &[String],
        points: &mut [DataPoint],
    ) -> EngineResult<BTreeMap<String, ClientOverlay>> {
        if clients.selection != ClientSelection::All {
            let overlay_query = DemandQuery::for_products(line_products.clone())
                .with_clients(clients.selection.clone());
            let overlay = self.demand.bucket_demand(
                self.repo.as_ref(),
                &overlay_query,
                frame.forecast_range,
                &frame.buckets,
                frame.granularity,
            )?;
            for (point, value) in points.iter_mut().zip(overlay) {
                point.overlay_demand = Some(value);
            }
        }
        self.client_overlays(ctx, frame, line_products, overlay_codes)
    }

    /// 按客户代码生成叠加曲线
    fn client_overlays(
        &self,
        ctx: &mut SimulationContext,
        frame: &RunFrame,
        product_ids: &BTreeSet<i64>,
        codes: &[String],
    ) -> EngineResult<BTreeMap<String, ClientOverlay>> {
        let repo = self.repo.as_ref();
        let mut overlays = BTreeMap::new();
        for code in non_empty_codes(codes) {
            let client = match ctx.client_by_code(repo, code)? {
                Some(c) => c,
                None => {
                    warn!(client_code = code, "叠加客户代码不存在, 已忽略");
                    continue;
                }
            };
            let query = DemandQuery::for_products(product_ids.clone())
                .with_clients(ClientSelection::Clients(vec![client.id]));
            let demand = self.demand.bucket_demand(
                repo,
                &query,
                frame.forecast_range,
                &frame.buckets,
                frame.granularity,
            )?;
            let data_points = frame
                .buckets
                .iter()
                .zip(demand.iter())
                .map(|(bucket, value)| OverlayPoint {
                    label: bucket.label.clone(),
                    bucket_start: bucket.start,
                    demand: *value,
                })
                .collect();
            overlays.insert(
                client.code.clone(),
                ClientOverlay {
                    client_id: client.id,
                    client_name: client.name.clone(),
                    data_points,
                    total_demand: demand.iter().sum(),
                },
            );
        }
        Ok(overlays)
    }

    /// 新客户注入量: 周桶整周, 日桶周一至周五均分
    fn injected_demand(bucket: &Bucket, granularity: Granularity, weekly: f64) -> f64 {
        match granularity {
            Granularity::Week => weekly,
            Granularity::Day if is_weekday(bucket.start) => weekly / WEEKDAYS_PER_WEEK,
            Granularity::Day => 0.0,
        }
    }

    fn base_points(frame: &RunFrame, demand: &[f64], capacity: &[BucketCapacity]) -> Vec<DataPoint> {
        frame
            .buckets
            .iter()
            .zip(demand)
            .zip(capacity)
            .map(|((bucket, d), c)| {
                DataPoint::new(bucket.label.clone(), bucket.start, *d, c.capacity, c.has_override)
            })
            .collect()
    }

    fn completed(
        ctx: &SimulationContext,
        frame: &RunFrame,
        points: Vec<DataPoint>,
        overlay: OverlayData,
        client_overlays: BTreeMap<String, ClientOverlay>,
        lab_totals: Option<LabTotals>,
    ) -> SimulationOutcome {
        SimulationOutcome::Completed(SimulationReport {
            run_id: ctx.run_id,
            mode: frame.mode,
            granularity: frame.granularity,
            start_date: frame.range.start,
            end_date: frame.range.end,
            summary: summarize(&points),
            data_points: points,
            overlay_data: if overlay.is_empty() { None } else { Some(overlay) },
            client_overlays,
            lab_totals,
        })
    }

    fn nothing_in_scope(
        ctx: &SimulationContext,
        frame: &RunFrame,
        reason: EmptyScopeReason,
    ) -> SimulationOutcome {
        let message = match reason {
            EmptyScopeReason::NoLines => "没有可模拟的启用产线".to_string(),
            EmptyScopeReason::NoProducts => "模拟分类没有匹配的产品".to_string(),
        };
        SimulationOutcome::NothingInScope {
            run_id: ctx.run_id,
            mode: frame.mode,
            reason,
            message,
        }
    }
}

// ==========================================
// 产线产能模拟 - 单次调用上下文
// ==========================================
// 每次 run 开始时创建, 结束时丢弃
// 缓存只在本次调用内有效, 不跨调用共享
// ==========================================

use crate::config::EngineSettings;
use crate::domain::catalog::{Client, Product, ProductFilter};
use crate::domain::forecast::WeeklyHistory;
use crate::domain::line::{ProductionLine, ShiftConfiguration};
use crate::domain::types::DateRange;
use crate::engine::error::EngineResult;
use crate::repository::SimulationRepository;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

pub struct SimulationContext {
    pub run_id: Uuid,
    pub settings: EngineSettings,
    /// 覆写按此窗口裁剪
    pub window: DateRange,

    lines: HashMap<Vec<i64>, Vec<ProductionLine>>,
    shift_configs: HashMap<i64, Option<ShiftConfiguration>>,
    default_products: HashMap<(Vec<i64>, Option<ProductFilter>), BTreeSet<i64>>,
    clients_by_code: HashMap<String, Option<Client>>,
    clients: HashMap<i64, Option<Client>>,
    products_by_code: HashMap<String, Option<Product>>,
    histories: HashMap<i64, Vec<WeeklyHistory>>,
}

fn sorted_ids(ids: &[i64]) -> Vec<i64> {
    let set: BTreeSet<i64> = ids.iter().copied().collect();
    set.into_iter().collect()
}

impl SimulationContext {
    pub fn new(settings: EngineSettings, window: DateRange) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            settings,
            window,
            lines: HashMap::new(),
            shift_configs: HashMap::new(),
            default_products: HashMap::new(),
            clients_by_code: HashMap::new(),
            clients: HashMap::new(),
            products_by_code: HashMap::new(),
            histories: HashMap::new(),
        }
    }

    /// 启用产线快照（含窗口内覆写）
    pub fn lines(
        &mut self,
        repo: &dyn SimulationRepository,
        line_ids: &[i64],
    ) -> EngineResult<Vec<ProductionLine>> {
        let key = sorted_ids(line_ids);
        if let Some(lines) = self.lines.get(&key) {
            return Ok(lines.clone());
        }
        let lines = repo.get_lines(&key, true, self.window)?;
        self.lines.insert(key, lines.clone());
        Ok(lines)
    }

    pub fn shift_configuration(
        &mut self,
        repo: &dyn SimulationRepository,
        id: i64,
    ) -> EngineResult<Option<ShiftConfiguration>> {
        if let Some(config) = self.shift_configs.get(&id) {
            return Ok(config.clone());
        }
        let config = repo.get_shift_configuration(id)?;
        self.shift_configs.insert(id, config.clone());
        Ok(config)
    }

    /// 默认产线在 line_ids 中的产品集合
    pub fn default_product_ids(
        &mut self,
        repo: &dyn SimulationRepository,
        line_ids: &[i64],
        filter: Option<&ProductFilter>,
    ) -> EngineResult<BTreeSet<i64>> {
        let key = (sorted_ids(line_ids), filter.cloned());
        if let Some(ids) = self.default_products.get(&key) {
            return Ok(ids.clone());
        }
        let ids = repo.get_default_product_ids(&key.0, filter)?;
        self.default_products.insert(key, ids.clone());
        Ok(ids)
    }

    pub fn client_by_code(
        &mut self,
        repo: &dyn SimulationRepository,
        code: &str,
    ) -> EngineResult<Option<Client>> {
        let key = code.trim().to_uppercase();
        if let Some(client) = self.clients_by_code.get(&key) {
            return Ok(client.clone());
        }
        let client = repo.get_client_by_code(&key)?;
        self.clients_by_code.insert(key, client.clone());
        Ok(client)
    }

    pub fn client(
        &mut self,
        repo: &dyn SimulationRepository,
        id: i64,
    ) -> EngineResult<Option<Client>> {
        if let Some(client) = self.clients.get(&id) {
            return Ok(client.clone());
        }
        let client = repo.get_client(id)?;
        self.clients.insert(id, client.clone());
        Ok(client)
    }

    pub fn product_by_code(
        &mut self,
        repo: &dyn SimulationRepository,
        code: &str,
    ) -> EngineResult<Option<Product>> {
        let key = code.trim().to_uppercase();
        if let Some(product) = self.products_by_code.get(&key) {
            return Ok(product.clone());
        }
        let product = repo.get_product_by_code(&key)?;
        self.products_by_code.insert(key, product.clone());
        Ok(product)
    }

    pub fn weekly_history(
        &mut self,
        repo: &dyn SimulationRepository,
        product_id: i64,
    ) -> EngineResult<Vec<WeeklyHistory>> {
        if let Some(history) = self.histories.get(&product_id) {
            return Ok(history.clone());
        }
        let history = repo.get_product_weekly_history(product_id)?;
        self.histories.insert(product_id, history.clone());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Client;
    use crate::repository::InMemorySimulationRepository;
    use chrono::NaiveDate;

    fn window() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(),
        )
    }

    #[test]
    fn test_each_context_gets_fresh_run_id() {
        let a = SimulationContext::new(EngineSettings::default(), window());
        let b = SimulationContext::new(EngineSettings::default(), window());
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_client_code_lookup_is_case_insensitive_and_memoized() {
        let repo = InMemorySimulationRepository::new().with_client(Client {
            id: 7,
            code: "ACME".to_string(),
            name: "Acme".to_string(),
            priority: 2,
            is_active: true,
        });
        let mut ctx = SimulationContext::new(EngineSettings::default(), window());
        assert_eq!(ctx.client_by_code(&repo, "acme").unwrap().map(|c| c.id), Some(7));
        assert_eq!(ctx.client_by_code(&repo, " ACME ").unwrap().map(|c| c.id), Some(7));
        assert!(ctx.client_by_code(&repo, "nobody").unwrap().is_none());
    }
}

// ==========================================
// 产线产能模拟 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供实体快照读取接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod error;
pub mod memory_repo;
pub mod simulation_repo;
pub mod sqlite_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use memory_repo::InMemorySimulationRepository;
pub use simulation_repo::SimulationRepository;
pub use sqlite_repo::SqliteSimulationRepository;

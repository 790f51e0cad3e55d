// ==========================================
// 定制蛋糕排期系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod capacity_repo;
pub mod error;
pub mod order_repo;

// 重导出核心仓储
pub use capacity_repo::{CapacityLedgerRepository, SlotAvailability};
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderIntentRepository;

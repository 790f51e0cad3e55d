// ==========================================
// 定制蛋糕排期系统 - 业务引擎层
// ==========================================
// 职责: 配置/日历/结算的核心业务规则
// 红线: 引擎不直接拼 SQL, 数据访问全部经由仓储层
// ==========================================

pub mod calendar;
pub mod checkout;
pub mod configurator;

// 重导出核心引擎
pub use calendar::{grid_range, month_grid, next_month, prev_month, DeliverySlot, GRID_CELLS};
pub use checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutSession, CheckoutStep, OrderSink,
};
pub use configurator::ConfiguratorEngine;

// ==========================================
// 定制蛋糕排期系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 定制下单配置 + 交付产能排期的领域核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeliveryType, DesignType, OrderStatus, SelectionMode};

// 领域实体
pub use domain::{
    Catalog, ContactInfo, DeliveryInfo, DesignSpec, FillingChoice, LineItem, OrderIntent,
    Selection, SelectionAction, SelectionIssue,
};

// 仓储
pub use repository::{
    CapacityLedgerRepository, OrderIntentRepository, RepositoryError, RepositoryResult,
    SlotAvailability,
};

// 引擎
pub use engine::{
    CheckoutError, CheckoutOrchestrator, CheckoutSession, CheckoutStep, ConfiguratorEngine,
    DeliverySlot, OrderSink,
};

// API
pub use api::{ApiError, ApiResult, AvailabilityApi, DayAvailability, OrderApi};

// 配置
pub use config::ConfigManager;

/// 库版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用名称
pub const APP_NAME: &str = "tortas-agenda";

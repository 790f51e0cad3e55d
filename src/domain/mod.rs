// ==========================================
// 定制蛋糕排期系统 - 领域模型层
// ==========================================
// 职责: 定义目录数据、配置选择、订单等领域实体与类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod order;
pub mod selection;
pub mod types;

// 重导出核心类型
pub use catalog::{
    BaseFlavor, Catalog, FillingOption, SimpleDesign, SizeOption, PREMIUM_SURCHARGE,
    SIMPLE_FILLING_CAP,
};
pub use order::{
    generate_order_number, ContactInfo, DeliveryInfo, LineItem, OrderIntent,
};
pub use selection::{DesignSpec, FillingChoice, Selection, SelectionAction, SelectionIssue};
pub use types::{DeliveryType, DesignType, OrderStatus, SelectionMode};

// ==========================================
// 定制蛋糕排期系统 - API 层
// ==========================================
// 职责: 对外查询接口, 做输入校验与错误转换
// 架构: API 层 → Engine 层 → Repository 层
// ==========================================

pub mod availability_api;
pub mod error;
pub mod order_api;

// 重导出核心 API
pub use availability_api::{AvailabilityApi, DayAvailability};
pub use error::{ApiError, ApiResult};
pub use order_api::OrderApi;

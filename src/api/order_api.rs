// ==========================================
// 定制蛋糕排期系统 - 订单查询 API
// ==========================================
// 职责: 订单号查询与最近订单列表
// 架构: API 层 → Repository 层 (orders)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::OrderIntent;
use crate::repository::OrderIntentRepository;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// OrderApi - 订单查询 API
// ==========================================
pub struct OrderApi {
    orders: Arc<OrderIntentRepository>,
}

impl OrderApi {
    /// 创建新的OrderApi实例
    pub fn new(orders: Arc<OrderIntentRepository>) -> Self {
        Self { orders }
    }

    /// 按订单号查询（含行项）
    ///
    /// # 返回
    /// - Ok(OrderIntent): 订单详情
    /// - Err(NotFound): 订单号不存在
    #[instrument(skip(self))]
    pub fn get_order(&self, order_number: &str) -> ApiResult<OrderIntent> {
        let number = order_number.trim();
        if number.is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }

        self.orders
            .find_by_number(number)?
            .ok_or_else(|| ApiError::NotFound(format!("Order(id={})不存在", number)))
    }

    /// 最近提交的订单（倒序, 不含行项）
    #[instrument(skip(self))]
    pub fn list_recent(&self, limit: u32) -> ApiResult<Vec<OrderIntent>> {
        Ok(self.orders.list_recent(limit.clamp(1, 100))?)
    }
}

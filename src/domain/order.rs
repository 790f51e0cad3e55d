// ==========================================
// 定制蛋糕排期系统 - 订单领域模型
// ==========================================
// 红线: LineItem 价格由 Selection 派生, 不允许手工改价
// 红线: OrderIntent 在提交时一次性构建, 预约成功后不可变
// ==========================================

use crate::domain::types::{DeliveryType, OrderStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// LineItem - 已定价行项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,        // 展示名, 如 "Torta personalizada — 15 porciones · Minimalista"
    pub unit_price: i64,     // 单价（比索）, 派生自配置
    pub quantity: u32,       // 定制蛋糕固定为 1
    pub description: String, // 生成的配置摘要（收据/WhatsApp/内部备注共用）
}

impl LineItem {
    /// 行项小计
    pub fn subtotal(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

// ==========================================
// ContactInfo - 联系人信息
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

// ==========================================
// DeliveryInfo - 交付信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub delivery_type: DeliveryType,
    pub address: Option<String>, // delivery 时必填
    pub city: Option<String>,    // delivery 时必填
    pub date: Option<NaiveDate>, // 结算第2步选定
    pub time_slot: Option<String>, // 如 "10:00-12:00"
    pub notes: Option<String>,
}

impl Default for DeliveryInfo {
    fn default() -> Self {
        Self {
            delivery_type: DeliveryType::Pickup,
            address: None,
            city: None,
            date: None,
            time_slot: None,
            notes: None,
        }
    }
}

// ==========================================
// OrderIntent - 提交的订单意向
// ==========================================
// 只由 CheckoutOrchestrator 在 reserve 成功后构建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub order_number: String, // "TK-" + 8位十六进制大写
    pub contact: ContactInfo,
    pub delivery_type: DeliveryType,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_date: NaiveDate, // 已预约成功的日期
    pub delivery_time_slot: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: Option<NaiveDateTime>, // 落库时由存储方填写
}

/// 生成订单号: TK-XXXXXXXX
pub fn generate_order_number() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("TK-{}", hex[..8].to_uppercase())
}

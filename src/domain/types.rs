// ==========================================
// 定制蛋糕排期系统 - 领域类型定义
// ==========================================
// 序列化格式: 与线上存储一致的小写字符串
// （原系统为西语店面，数据库/接口沿用西语字面值）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 选择模式 (Selection Mode)
// ==========================================
// 红线: 10/15 人份 = 单选一种馅料, 30 人份 = 多选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single, // 仅允许一种馅料
    Multi,  // 简单馅最多2种 + 高级馅不限
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Single => write!(f, "single"),
            SelectionMode::Multi => write!(f, "multi"),
        }
    }
}

// ==========================================
// 设计类型 (Design Type)
// ==========================================
// simple = 选图库设计, 走线上结算
// elaborado = 复杂设计, 转 WhatsApp 人工协调, 不占当日产能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignType {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "elaborado")]
    Elaborate,
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesignType::Simple => write!(f, "simple"),
            DesignType::Elaborate => write!(f, "elaborado"),
        }
    }
}

// ==========================================
// 交付方式 (Delivery Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Pickup,   // 到店自取
    Delivery, // 配送（需地址+城市, 收配送费）
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryType::Pickup => write!(f, "pickup"),
            DeliveryType::Delivery => write!(f, "delivery"),
        }
    }
}

impl DeliveryType {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "delivery" => DeliveryType::Delivery,
            _ => DeliveryType::Pickup,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DeliveryType::Pickup => "pickup",
            DeliveryType::Delivery => "delivery",
        }
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 本核心只产出 Creada; 后续状态由上游订单系统流转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Creada,
    Pagando,
    Pagada,
    Fallida,
    EnPreparacion,
    Lista,
    Entregada,
    Cancelada,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OrderStatus {
    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "pagando" => OrderStatus::Pagando,
            "pagada" => OrderStatus::Pagada,
            "fallida" => OrderStatus::Fallida,
            "en_preparacion" => OrderStatus::EnPreparacion,
            "lista" => OrderStatus::Lista,
            "entregada" => OrderStatus::Entregada,
            "cancelada" => OrderStatus::Cancelada,
            _ => OrderStatus::Creada, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Creada => "creada",
            OrderStatus::Pagando => "pagando",
            OrderStatus::Pagada => "pagada",
            OrderStatus::Fallida => "fallida",
            OrderStatus::EnPreparacion => "en_preparacion",
            OrderStatus::Lista => "lista",
            OrderStatus::Entregada => "entregada",
            OrderStatus::Cancelada => "cancelada",
        }
    }
}

// ==========================================
// 定制蛋糕排期系统 - 结算编排器
// ==========================================
// 职责: Contact → Delivery → Confirm 三步状态机与最终提交
// 红线: 步骤守卫不通过就不前进; 提交时先占名额再落订单
// 红线: 名额已满 => 回退 Delivery 步并刷新快照, 绝不自动重试
// 红线: 订单落库失败 => 释放已占名额, 不留悬挂预约
// ==========================================

use crate::domain::order::{
    generate_order_number, ContactInfo, DeliveryInfo, LineItem, OrderIntent,
};
use crate::domain::selection::SelectionIssue;
use crate::domain::types::{DeliveryType, OrderStatus};
use crate::repository::{
    CapacityLedgerRepository, RepositoryError, RepositoryResult, SlotAvailability,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

// ==========================================
// 订单落库出口
// ==========================================

/// 订单意向的持久化出口
///
/// 编排器通过该 trait 与订单存储解耦, 测试中可注入故障实现。
pub trait OrderSink: Send + Sync {
    fn submit(&self, intent: &OrderIntent) -> RepositoryResult<()>;
}

impl OrderSink for crate::repository::OrderIntentRepository {
    fn submit(&self, intent: &OrderIntent) -> RepositoryResult<()> {
        self.insert(intent)
    }
}

// ==========================================
// 结算状态
// ==========================================

/// 结算步骤（只能经守卫逐步前进, back 可回退）
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Contact,
    Delivery,
    Confirm,
}

/// 一次结算会话的全部可变状态
///
/// today 注入而非取系统时钟, 与日历引擎口径一致。
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub step: CheckoutStep,
    pub contact: ContactInfo,
    pub delivery: DeliveryInfo,
    pub items: Vec<LineItem>,
    pub today: NaiveDate,
}

impl CheckoutSession {
    pub fn new(items: Vec<LineItem>, today: NaiveDate) -> Self {
        Self {
            step: CheckoutStep::Contact,
            contact: ContactInfo::default(),
            delivery: DeliveryInfo::default(),
            items,
            today,
        }
    }
}

// ==========================================
// 错误类型
// ==========================================

/// 结算编排错误
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// 当前步骤守卫未通过（字段级错误列表）
    #[error("步骤校验未通过: {0:?}")]
    StepValidationFailed(Vec<SelectionIssue>),

    /// 提交时名额竞争失败, 会话已回退到 Delivery 步
    /// 附带刷新后的快照, 供界面立即标灰该日期
    #[error("当日产能已满: date={date}")]
    CapacityExceeded {
        date: NaiveDate,
        refreshed: BTreeMap<NaiveDate, SlotAvailability>,
    },

    /// 购物车为空, 无法提交
    #[error("购物车为空, 无法提交")]
    EmptyCart,

    /// 只有 Confirm 步允许提交
    #[error("当前步骤不允许提交: {0:?}")]
    NotAtConfirmStep(CheckoutStep),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// CheckoutOrchestrator - 结算编排器
// ==========================================
pub struct CheckoutOrchestrator {
    ledger: Arc<CapacityLedgerRepository>,
    sink: Arc<dyn OrderSink>,
    delivery_fee: i64,
    lead_time_days: u32,
}

impl CheckoutOrchestrator {
    /// 构造函数
    ///
    /// # 参数
    /// - ledger: 产能台账仓储
    /// - sink: 订单落库出口
    /// - delivery_fee: 配送方式的固定运费
    /// - lead_time_days: 最短前置天数
    pub fn new(
        ledger: Arc<CapacityLedgerRepository>,
        sink: Arc<dyn OrderSink>,
        delivery_fee: i64,
        lead_time_days: u32,
    ) -> Self {
        Self {
            ledger,
            sink,
            delivery_fee,
            lead_time_days,
        }
    }

    // ==========================================
    // 步骤迁移
    // ==========================================

    /// 尝试前进到下一步
    ///
    /// # 返回
    /// - Ok(step): 守卫通过后的新步骤
    /// - Err(StepValidationFailed): 守卫未通过, 步骤不变
    pub fn advance(&self, session: &mut CheckoutSession) -> Result<CheckoutStep, CheckoutError> {
        match session.step {
            CheckoutStep::Contact => {
                let issues = self.validate_contact(&session.contact);
                if !issues.is_empty() {
                    return Err(CheckoutError::StepValidationFailed(issues));
                }
                session.step = CheckoutStep::Delivery;
            }
            CheckoutStep::Delivery => {
                let issues = self.validate_delivery(&session.delivery, session.today)?;
                if !issues.is_empty() {
                    return Err(CheckoutError::StepValidationFailed(issues));
                }
                session.step = CheckoutStep::Confirm;
            }
            CheckoutStep::Confirm => {}
        }
        Ok(session.step)
    }

    /// 回退一步（Contact 步不动）
    pub fn back(&self, session: &mut CheckoutSession) -> CheckoutStep {
        session.step = match session.step {
            CheckoutStep::Contact => CheckoutStep::Contact,
            CheckoutStep::Delivery => CheckoutStep::Contact,
            CheckoutStep::Confirm => CheckoutStep::Delivery,
        };
        session.step
    }

    // ==========================================
    // 步骤守卫
    // ==========================================

    /// Contact 步守卫: 姓名/邮箱/电话必填, 邮箱只做语法检查
    fn validate_contact(&self, contact: &ContactInfo) -> Vec<SelectionIssue> {
        let mut issues = Vec::new();
        if contact.name.trim().is_empty() {
            issues.push(SelectionIssue::new("name", "Ingresá tu nombre"));
        }
        if !is_plausible_email(contact.email.trim()) {
            issues.push(SelectionIssue::new("email", "Ingresá un email válido"));
        }
        if contact.phone.trim().is_empty() {
            issues.push(SelectionIssue::new("phone", "Ingresá un teléfono de contacto"));
        }
        issues
    }

    /// Delivery 步守卫: 字段级检查 + 对台账实时重查剩余名额
    ///
    /// 不信任界面缓存的快照。守卫通过也只是"当时可选",
    /// 最终判定在 submit 的原子预约。
    fn validate_delivery(
        &self,
        delivery: &DeliveryInfo,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<SelectionIssue>> {
        let mut issues = self.validate_delivery_fields(delivery, today);

        if issues.is_empty() {
            if let Some(date) = delivery.date {
                if self.ledger.day_availability(date)?.remaining() == 0 {
                    issues.push(SelectionIssue::new(
                        "date",
                        "Esa fecha ya no tiene cupos disponibles",
                    ));
                }
            }
        }

        Ok(issues)
    }

    /// Delivery 步的纯字段检查（不读台账）
    ///
    /// submit 只重校字段, 名额判定交给原子预约本身。
    fn validate_delivery_fields(
        &self,
        delivery: &DeliveryInfo,
        today: NaiveDate,
    ) -> Vec<SelectionIssue> {
        let mut issues = Vec::new();

        match delivery.date {
            None => issues.push(SelectionIssue::new("date", "Elegí una fecha de entrega")),
            Some(date) => {
                let earliest = today + Duration::days(self.lead_time_days as i64);
                if date < earliest {
                    issues.push(SelectionIssue::new(
                        "date",
                        "Necesitamos al menos 48hs para preparar tu torta",
                    ));
                }
            }
        }

        if delivery.delivery_type == DeliveryType::Delivery {
            if delivery.address.as_deref().unwrap_or("").trim().is_empty() {
                issues.push(SelectionIssue::new("address", "Ingresá la dirección de entrega"));
            }
            if delivery.city.as_deref().unwrap_or("").trim().is_empty() {
                issues.push(SelectionIssue::new("city", "Ingresá la ciudad"));
            }
        }

        issues
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 提交订单: 原子占名额 → 构造订单意向 → 落库
    ///
    /// 失败路径:
    /// - 名额已满: 回退 Delivery 步, 返回带刷新快照的 CapacityExceeded
    /// - 落库失败: 释放刚占的名额后返回错误, 台账不留悬挂预约
    #[instrument(skip(self, session), fields(step = ?session.step))]
    pub fn submit(&self, session: &mut CheckoutSession) -> Result<OrderIntent, CheckoutError> {
        if session.step != CheckoutStep::Confirm {
            return Err(CheckoutError::NotAtConfirmStep(session.step));
        }
        if session.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 前两步的数据可能在 Confirm 步被改过, 提交前重校字段;
        // 名额不在这里预查, 原子预约是唯一裁判
        let mut issues = self.validate_contact(&session.contact);
        issues.extend(self.validate_delivery_fields(&session.delivery, session.today));
        if !issues.is_empty() {
            return Err(CheckoutError::StepValidationFailed(issues));
        }

        let date = session
            .delivery
            .date
            .ok_or_else(|| {
                CheckoutError::StepValidationFailed(vec![SelectionIssue::new(
                    "date",
                    "Elegí una fecha de entrega",
                )])
            })?;

        // 原子预约: 满员是常态失败, 不是异常
        let reservation_id = match self.ledger.reserve(date) {
            Ok(id) => id,
            Err(RepositoryError::CapacityExceeded { date, .. }) => {
                warn!(%date, "提交时名额竞争失败, 回退 Delivery 步");
                session.step = CheckoutStep::Delivery;
                let (start, end) = crate::engine::calendar::grid_range(date);
                let refreshed = self.ledger.get_availability(start, end)?;
                return Err(CheckoutError::CapacityExceeded { date, refreshed });
            }
            Err(e) => return Err(e.into()),
        };

        let intent = self.build_intent(session, date);
        if let Err(e) = self.sink.submit(&intent) {
            warn!(order_number = %intent.order_number, error = %e, "订单落库失败, 释放名额");
            self.ledger.release_reservation(&reservation_id)?;
            return Err(e.into());
        }

        info!(
            order_number = %intent.order_number,
            delivery_date = %date,
            total = intent.total,
            "订单提交成功"
        );
        Ok(intent)
    }

    /// 由会话状态构造不可变订单意向
    fn build_intent(&self, session: &CheckoutSession, date: NaiveDate) -> OrderIntent {
        let subtotal: i64 = session.items.iter().map(|item| item.subtotal()).sum();
        let delivery_fee = match session.delivery.delivery_type {
            DeliveryType::Delivery => self.delivery_fee,
            DeliveryType::Pickup => 0,
        };

        OrderIntent {
            order_number: generate_order_number(),
            contact: session.contact.clone(),
            delivery_type: session.delivery.delivery_type,
            delivery_address: session.delivery.address.clone(),
            delivery_city: session.delivery.city.clone(),
            delivery_date: date,
            delivery_time_slot: session.delivery.time_slot.clone(),
            notes: session.delivery.notes.clone(),
            items: session.items.clone(),
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
            status: OrderStatus::Creada,
            created_at: None,
        }
    }
}

/// 邮箱语法检查: local@domain 且 domain 含点号, 不做投递验证
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_syntax_check() {
        assert!(is_plausible_email("ana@example.com"));
        assert!(is_plausible_email("a.b+c@sub.dominio.uy"));
        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("sin-arroba"));
        assert!(!is_plausible_email("@dominio.com"));
        assert!(!is_plausible_email("ana@"));
        assert!(!is_plausible_email("ana@dominio"));
        assert!(!is_plausible_email("ana@.com"));
        assert!(!is_plausible_email("ana maria@x.com"));
    }
}

// ==========================================
// 定制蛋糕排期系统 - 产能查询 API
// ==========================================
// 职责: 区间产能快照查询 + 月视图投影
// 架构: API 层 → Engine 层 (calendar) → Repository 层 (ledger)
// 约束: 区间必须 from ≤ to 且不超过 365 天
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::calendar::{self, DeliverySlot};
use crate::repository::{CapacityLedgerRepository, SlotAvailability};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// 区间长度上限（天）
const MAX_RANGE_DAYS: i64 = 365;

/// 单日产能快照（对外 DTO, 带日期）
#[derive(Debug, Clone, serde::Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub reserved: u32,
    pub capacity: u32,
    pub remaining: u32,
}

// ==========================================
// AvailabilityApi - 产能查询 API
// ==========================================
pub struct AvailabilityApi {
    ledger: Arc<CapacityLedgerRepository>,
    lead_time_days: u32,
}

impl AvailabilityApi {
    /// 创建新的AvailabilityApi实例
    ///
    /// # 参数
    /// - ledger: 产能台账仓储
    /// - lead_time_days: 最短前置天数（月视图可选性判定用）
    pub fn new(ledger: Arc<CapacityLedgerRepository>, lead_time_days: u32) -> Self {
        Self {
            ledger,
            lead_time_days,
        }
    }

    /// 查询日期区间的每日产能
    ///
    /// # 返回
    /// - Ok(Vec<DayAvailability>): 按日期升序, 无记录日期补默认产能
    /// - Err(InvalidInput): from > to 或区间超过 365 天
    #[instrument(skip(self))]
    pub fn get_availability(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> ApiResult<Vec<DayAvailability>> {
        let snapshot = self.range_snapshot(from_date, to_date)?;
        Ok(snapshot
            .into_iter()
            .map(|(date, slot)| DayAvailability {
                date,
                reserved: slot.reserved,
                capacity: slot.capacity,
                remaining: slot.remaining(),
            })
            .collect())
    }

    /// 生成锚定月的 42 格月视图
    ///
    /// today 由调用方注入, 保证边界行为可复现。
    #[instrument(skip(self))]
    pub fn month_view(&self, anchor: NaiveDate, today: NaiveDate) -> ApiResult<Vec<DeliverySlot>> {
        let (start, end) = calendar::grid_range(anchor);
        let availability = self.ledger.get_availability(start, end)?;
        Ok(calendar::month_grid(
            anchor,
            &availability,
            today,
            self.lead_time_days,
            self.ledger.default_capacity(),
        ))
    }

    fn range_snapshot(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> ApiResult<BTreeMap<NaiveDate, SlotAvailability>> {
        if from_date > to_date {
            return Err(ApiError::InvalidInput(format!(
                "区间非法: from={} > to={}",
                from_date, to_date
            )));
        }
        if (to_date - from_date).num_days() > MAX_RANGE_DAYS {
            return Err(ApiError::InvalidInput(format!(
                "区间过长: 最多 {} 天",
                MAX_RANGE_DAYS
            )));
        }

        Ok(self.ledger.get_availability(from_date, to_date)?)
    }
}

// ==========================================
// 定制蛋糕排期系统 - 交付日历引擎
// ==========================================
// 职责: 把产能快照投影成固定 42 格(6 周)的月视图
// 红线: 可选性判定只读快照, 不碰数据库; 预约原子性由仓储保证
// 红线: is_selectable = 非过去 && 未满 && 满足前置期
// ==========================================

use crate::repository::SlotAvailability;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// 固定网格尺寸: 6 行 × 7 列, 周日起始
pub const GRID_CELLS: usize = 42;

/// 月视图中的一格
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeliverySlot {
    pub date: NaiveDate,
    /// 当月内的日号（跨月补位格也取其真实日号）
    pub day_number: u32,
    /// 是否属于锚定月（false 即补位格）
    pub in_month: bool,
    pub is_today: bool,
    pub is_past: bool,
    pub reserved: u32,
    pub capacity: u32,
    pub is_selectable: bool,
}

impl DeliverySlot {
    /// 剩余可预约量
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.reserved)
    }
}

// ==========================================
// 网格生成
// ==========================================

/// 网格覆盖的日期区间 [起, 止]（含跨月补位格）
///
/// 起点是锚定月 1 号当周或之前最近的周日, 终点固定在其后第 41 天。
pub fn grid_range(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = anchor.with_day(1).unwrap_or(anchor);
    let start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
    (start, start + Duration::days(GRID_CELLS as i64 - 1))
}

/// 生成锚定月的 42 格月视图
///
/// today 显式注入而非取系统时钟, 边界行为可复现可测。
/// availability 缺失的日期按 {0, default_capacity} 处理,
/// 与台账仓储对无记录日期的口径一致。
///
/// # 参数
/// - anchor: 锚定月中的任意日期
/// - availability: 产能快照（通常来自 get_availability(grid_range)）
/// - today: 注入的"今天"
/// - lead_time_days: 最短前置天数, 最早可选日 = today + lead_time_days
/// - default_capacity: 快照缺失日期的默认产能
pub fn month_grid(
    anchor: NaiveDate,
    availability: &BTreeMap<NaiveDate, SlotAvailability>,
    today: NaiveDate,
    lead_time_days: u32,
    default_capacity: u32,
) -> Vec<DeliverySlot> {
    let (start, _) = grid_range(anchor);
    let earliest = today + Duration::days(lead_time_days as i64);

    (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let in_month = date.month() == anchor.month() && date.year() == anchor.year();
            let slot = availability.get(&date).copied().unwrap_or(SlotAvailability {
                reserved: 0,
                capacity: default_capacity,
            });
            let is_past = date < today;
            let is_selectable =
                in_month && !is_past && slot.reserved < slot.capacity && date >= earliest;

            DeliverySlot {
                date,
                day_number: date.day(),
                in_month,
                is_today: date == today,
                is_past,
                reserved: slot.reserved,
                capacity: slot.capacity,
                is_selectable,
            }
        })
        .collect()
}

/// 下个月的锚定日（取 1 号）
pub fn next_month(anchor: NaiveDate) -> NaiveDate {
    let (year, month) = if anchor.month() == 12 {
        (anchor.year() + 1, 1)
    } else {
        (anchor.year(), anchor.month() + 1)
    };
    // 1 号对任意年月都合法
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(anchor)
}

/// 上个月的锚定日（取 1 号）
pub fn prev_month(anchor: NaiveDate) -> NaiveDate {
    let (year, month) = if anchor.month() == 1 {
        (anchor.year() - 1, 12)
    } else {
        (anchor.year(), anchor.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(anchor)
}

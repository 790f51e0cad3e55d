// ==========================================
// 定制蛋糕排期系统 - 交付产能台账仓储
// ==========================================
// 红线: 单日承诺订单数不得超过 capacity, 并发下也不允许超订
// 红线: Repository 不含业务逻辑, 只守护台账不变量
// ==========================================
// 并发方案: 条件更新(事务行级重查), 不是进程级全局锁;
//           多实例部署同样成立, 因为判定发生在数据库行上
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// 单日产能视图: reserved/capacity 快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlotAvailability {
    pub reserved: u32,
    pub capacity: u32,
}

impl SlotAvailability {
    /// 剩余可预约量
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.reserved)
    }
}

// ==========================================
// CapacityLedgerRepository - 产能台账仓储
// ==========================================

/// 产能台账仓储
/// 职责: delivery_capacity / capacity_reservation 两表的全部读写
pub struct CapacityLedgerRepository {
    conn: Arc<Mutex<Connection>>,
    default_capacity: u32,
}

impl CapacityLedgerRepository {
    /// 创建新的台账仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - default_capacity: 无历史记录日期的默认产能上限
    pub fn new(db_path: &str, default_capacity: u32) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            default_capacity,
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>, default_capacity: u32) -> Self {
        Self {
            conn,
            default_capacity,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 默认产能上限
    pub fn default_capacity(&self) -> u32 {
        self.default_capacity
    }

    /// 查询日期区间的产能快照（只读）
    ///
    /// 无记录的日期返回 {0, default_capacity}。单条 SELECT 读取,
    /// 不会出现 reserved > capacity 的中间态。
    ///
    /// # 参数
    /// - from_date: 起始日期（含）
    /// - to_date: 结束日期（含）
    ///
    /// # 返回
    /// - Ok(BTreeMap<NaiveDate, SlotAvailability>): 每日快照
    /// - Err: 数据库错误 / 区间非法
    pub fn get_availability(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> RepositoryResult<BTreeMap<NaiveDate, SlotAvailability>> {
        if from_date > to_date {
            return Err(RepositoryError::ValidationError(format!(
                "区间非法: from={} > to={}",
                from_date, to_date
            )));
        }

        let conn = self.get_conn()?;
        let from_str = from_date.format("%Y-%m-%d").to_string();
        let to_str = to_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn.prepare(
            r#"
            SELECT delivery_date, reserved, capacity
            FROM delivery_capacity
            WHERE delivery_date BETWEEN ?1 AND ?2
            ORDER BY delivery_date
            "#,
        )?;

        let mut recorded: BTreeMap<NaiveDate, SlotAvailability> = BTreeMap::new();
        let rows = stmt.query_map(params![from_str, to_str], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;
        for row in rows {
            let (date_str, reserved, capacity) = row?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| RepositoryError::ValidationError(e.to_string()))?;
            recorded.insert(date, SlotAvailability { reserved, capacity });
        }

        // 区间内无记录的日期补默认值
        let mut result = BTreeMap::new();
        let mut current = from_date;
        while current <= to_date {
            let slot = recorded.get(&current).copied().unwrap_or(SlotAvailability {
                reserved: 0,
                capacity: self.default_capacity,
            });
            result.insert(current, slot);
            current += Duration::days(1);
        }

        Ok(result)
    }

    /// 查询单日产能快照
    pub fn day_availability(&self, date: NaiveDate) -> RepositoryResult<SlotAvailability> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();

        let slot = conn
            .query_row(
                "SELECT reserved, capacity FROM delivery_capacity WHERE delivery_date = ?1",
                params![date_str],
                |row| {
                    Ok(SlotAvailability {
                        reserved: row.get(0)?,
                        capacity: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(slot.unwrap_or(SlotAvailability {
            reserved: 0,
            capacity: self.default_capacity,
        }))
    }

    /// 预约一个交付名额（原子）
    ///
    /// 内部生成预约凭据 id; 需要幂等重试时改用 reserve_with_id。
    ///
    /// # 返回
    /// - Ok(String): 预约凭据 id
    /// - Err(CapacityExceeded): 当日已满, 恰好剩一个名额时并发请求只有一个成功
    pub fn reserve(&self, date: NaiveDate) -> RepositoryResult<String> {
        let reservation_id = Uuid::new_v4().to_string();
        self.reserve_with_id(date, &reservation_id)?;
        Ok(reservation_id)
    }

    /// 按预约凭据预约（原子 + 幂等）
    ///
    /// 事务内流程:
    /// 1. 凭据已存在 => 已预约成功, no-op 返回 Ok（重试不会二次累加）
    /// 2. 惰性建行（默认产能）
    /// 3. 条件更新: reserved+1 仅当 reserved < capacity, 0 行受影响即满
    /// 4. 落凭据行, 提交
    ///
    /// # 参数
    /// - date: 交付日期
    /// - reservation_id: 调用方持有的预约凭据
    pub fn reserve_with_id(&self, date: NaiveDate, reservation_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let already: Option<String> = tx
            .query_row(
                "SELECT delivery_date FROM capacity_reservation WHERE reservation_id = ?1",
                params![reservation_id],
                |row| row.get(0),
            )
            .optional()?;
        if already.is_some() {
            debug!(%date, reservation_id, "预约凭据已存在, 幂等返回");
            return Ok(());
        }

        tx.execute(
            r#"
            INSERT OR IGNORE INTO delivery_capacity (delivery_date, reserved, capacity)
            VALUES (?1, 0, ?2)
            "#,
            params![date_str, self.default_capacity],
        )?;

        let affected = tx.execute(
            r#"
            UPDATE delivery_capacity
            SET reserved = reserved + 1,
                updated_at = datetime('now')
            WHERE delivery_date = ?1 AND reserved < capacity
            "#,
            params![date_str],
        )?;

        if affected == 0 {
            let capacity: u32 = tx.query_row(
                "SELECT capacity FROM delivery_capacity WHERE delivery_date = ?1",
                params![date_str],
                |row| row.get(0),
            )?;
            warn!(%date, capacity, "预约失败: 当日产能已满");
            // 事务随 drop 回滚
            return Err(RepositoryError::CapacityExceeded { date, capacity });
        }

        tx.execute(
            r#"
            INSERT INTO capacity_reservation (reservation_id, delivery_date)
            VALUES (?1, ?2)
            "#,
            params![reservation_id, date_str],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(%date, reservation_id, "预约成功");
        Ok(())
    }

    /// 释放一个交付名额（取消订单用, reserved 下限 0）
    ///
    /// 无记录日期视为 no-op。
    pub fn release(&self, date: NaiveDate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();

        conn.execute(
            r#"
            UPDATE delivery_capacity
            SET reserved = CASE WHEN reserved > 0 THEN reserved - 1 ELSE 0 END,
                updated_at = datetime('now')
            WHERE delivery_date = ?1
            "#,
            params![date_str],
        )?;

        Ok(())
    }

    /// 按预约凭据释放名额（与 reserve_with_id 对称, 幂等）
    pub fn release_reservation(&self, reservation_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let date_str: Option<String> = tx
            .query_row(
                "SELECT delivery_date FROM capacity_reservation WHERE reservation_id = ?1",
                params![reservation_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(date_str) = date_str else {
            // 凭据不存在: 已释放或从未预约成功
            return Ok(());
        };

        tx.execute(
            r#"
            UPDATE delivery_capacity
            SET reserved = CASE WHEN reserved > 0 THEN reserved - 1 ELSE 0 END,
                updated_at = datetime('now')
            WHERE delivery_date = ?1
            "#,
            params![date_str],
        )?;
        tx.execute(
            "DELETE FROM capacity_reservation WHERE reservation_id = ?1",
            params![reservation_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(reservation_id, "预约凭据已释放");
        Ok(())
    }
}

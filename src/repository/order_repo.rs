// ==========================================
// 定制蛋糕排期系统 - 订单意向仓储
// ==========================================
// 职责: orders / order_items 两表的写入与查询
// 约束: 订单与行项同事务落库; 行项保存提交时刻的快照
// 红线: 仓储只接收已预约成功的 OrderIntent, 不自行预约
// ==========================================

use crate::domain::order::{ContactInfo, LineItem, OrderIntent};
use crate::domain::types::{DeliveryType, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// OrderIntentRepository - 订单意向仓储
// ==========================================
pub struct OrderIntentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderIntentRepository {
    /// 创建新的订单仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 落库一个订单意向（订单 + 行项同事务）
    ///
    /// # 返回
    /// - Ok(()): 落库成功
    /// - Err: 数据库错误 / 订单号重复
    pub fn insert(&self, intent: &OrderIntent) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO orders (
                order_number, customer_name, customer_email, customer_phone,
                delivery_type, delivery_address, delivery_city,
                delivery_date, delivery_time_slot, notes,
                status, subtotal, delivery_fee, total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                intent.order_number,
                intent.contact.name,
                intent.contact.email,
                intent.contact.phone,
                intent.delivery_type.to_db_str(),
                intent.delivery_address,
                intent.delivery_city,
                intent.delivery_date.format("%Y-%m-%d").to_string(),
                intent.delivery_time_slot,
                intent.notes,
                intent.status.to_db_str(),
                intent.subtotal,
                intent.delivery_fee,
                intent.total,
            ],
        )?;

        for (seq_no, item) in intent.items.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO order_items (
                    order_number, seq_no, item_name, unit_price, quantity, description
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    intent.order_number,
                    (seq_no + 1) as i64,
                    item.name,
                    item.unit_price,
                    item.quantity,
                    item.description,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            order_number = %intent.order_number,
            delivery_date = %intent.delivery_date,
            total = intent.total,
            "订单意向已落库"
        );
        Ok(())
    }

    /// 按订单号查询
    ///
    /// # 返回
    /// - Ok(Some(OrderIntent)): 找到订单（含行项）
    /// - Ok(None): 未找到
    pub fn find_by_number(&self, order_number: &str) -> RepositoryResult<Option<OrderIntent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                order_number, customer_name, customer_email, customer_phone,
                delivery_type, delivery_address, delivery_city,
                delivery_date, delivery_time_slot, notes,
                status, subtotal, delivery_fee, total, created_at
            FROM orders
            WHERE order_number = ?1
            "#,
        )?;

        let intent = stmt
            .query_row(params![order_number], map_order_row)
            .optional()?;

        let Some(mut intent) = intent else {
            return Ok(None);
        };

        let mut items_stmt = conn.prepare(
            r#"
            SELECT item_name, unit_price, quantity, description
            FROM order_items
            WHERE order_number = ?1
            ORDER BY seq_no
            "#,
        )?;
        let items = items_stmt
            .query_map(params![order_number], |row| {
                Ok(LineItem {
                    name: row.get(0)?,
                    unit_price: row.get(1)?,
                    quantity: row.get(2)?,
                    description: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<LineItem>>>()?;

        intent.items = items;
        Ok(Some(intent))
    }

    /// 最近提交的订单（按创建时间倒序, 不含行项）
    pub fn list_recent(&self, limit: u32) -> RepositoryResult<Vec<OrderIntent>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                order_number, customer_name, customer_email, customer_phone,
                delivery_type, delivery_address, delivery_city,
                delivery_date, delivery_time_slot, notes,
                status, subtotal, delivery_fee, total, created_at
            FROM orders
            ORDER BY created_at DESC, order_number DESC
            LIMIT ?1
            "#,
        )?;

        let intents = stmt
            .query_map(params![limit], map_order_row)?
            .collect::<rusqlite::Result<Vec<OrderIntent>>>()?;

        Ok(intents)
    }
}

/// orders 行到 OrderIntent 的映射（items 由调用方补充）
fn map_order_row(row: &Row<'_>) -> rusqlite::Result<OrderIntent> {
    let delivery_date_str: String = row.get(7)?;
    let delivery_date = NaiveDate::parse_from_str(&delivery_date_str, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    let delivery_type_str: String = row.get(4)?;
    let status_str: String = row.get(10)?;
    let created_at_str: Option<String> = row.get(14)?;
    let created_at = created_at_str
        .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok());

    Ok(OrderIntent {
        order_number: row.get(0)?,
        contact: ContactInfo {
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
        },
        delivery_type: DeliveryType::from_db_str(&delivery_type_str),
        delivery_address: row.get(5)?,
        delivery_city: row.get(6)?,
        delivery_date,
        delivery_time_slot: row.get(8)?,
        notes: row.get(9)?,
        status: OrderStatus::from_db_str(&status_str),
        subtotal: row.get(11)?,
        delivery_fee: row.get(12)?,
        total: row.get(13)?,
        items: Vec::new(),
        created_at,
    })
}

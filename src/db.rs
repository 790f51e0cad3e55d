// ==========================================
// 定制蛋糕排期系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发预约时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构：
/// - delivery_capacity: 按日产能台账（预约计数 + 上限），行只增不删
/// - capacity_reservation: 预约凭据（reserve 幂等重试依据）
/// - orders / order_items: 已提交订单及行项快照
/// - config_kv: 配置键值（global scope）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS delivery_capacity (
            delivery_date TEXT PRIMARY KEY,
            reserved INTEGER NOT NULL DEFAULT 0,
            capacity INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (reserved >= 0),
            CHECK (reserved <= capacity)
        );

        CREATE TABLE IF NOT EXISTS capacity_reservation (
            reservation_id TEXT PRIMARY KEY,
            delivery_date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS orders (
            order_number TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            delivery_type TEXT NOT NULL,
            delivery_address TEXT,
            delivery_city TEXT,
            delivery_date TEXT NOT NULL,
            delivery_time_slot TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'creada',
            subtotal INTEGER NOT NULL,
            delivery_fee INTEGER NOT NULL DEFAULT 0,
            total INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS order_items (
            order_number TEXT NOT NULL REFERENCES orders(order_number) ON DELETE CASCADE,
            seq_no INTEGER NOT NULL,
            item_name TEXT NOT NULL,
            unit_price INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            description TEXT NOT NULL,
            PRIMARY KEY (order_number, seq_no)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// 定制蛋糕排期系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键全集
pub mod config_keys {
    /// 单日默认产能上限
    pub const DEFAULT_CAPACITY: &str = "default_capacity";
    /// 最短前置天数（今天起算）
    pub const LEAD_TIME_DAYS: &str = "lead_time_days";
    /// 配送方式固定运费
    pub const DELIVERY_FEE: &str = "delivery_fee";
    /// 复杂设计人工协调的 WhatsApp 号码
    pub const WHATSAPP_PHONE: &str = "whatsapp_phone";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = crate::db::open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入/覆写配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    // ===== 排期配置 =====

    /// 获取单日默认产能上限（默认 2 单/日）
    pub fn get_default_capacity(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_CAPACITY, "2")?;
        Ok(value.parse::<u32>().unwrap_or(2))
    }

    /// 获取最短前置天数（默认 2 天 = 48hs）
    pub fn get_lead_time_days(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LEAD_TIME_DAYS, "2")?;
        Ok(value.parse::<u32>().unwrap_or(2))
    }

    // ===== 结算配置 =====

    /// 获取配送方式固定运费（默认 $150, 自取为 0 不走配置）
    pub fn get_delivery_fee(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DELIVERY_FEE, "150")?;
        Ok(value.parse::<i64>().unwrap_or(150))
    }

    /// 获取复杂设计交接的 WhatsApp 号码
    pub fn get_whatsapp_phone(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::WHATSAPP_PHONE, "59899123456")
    }
}

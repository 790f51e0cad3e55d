// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、会话构造等功能
// ==========================================

use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;
use tortas_agenda::domain::order::LineItem;
use tortas_agenda::engine::{CheckoutSession, CheckoutStep};
use tortas_agenda::domain::types::DeliveryType;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    tortas_agenda::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 一条合法行项（15 porciones · Minimalista, $2500）
pub fn sample_line_item() -> LineItem {
    LineItem {
        name: "Torta personalizada — 15 porciones · Minimalista".to_string(),
        unit_price: 2500,
        quantity: 1,
        description: "Tamaño: 15 porciones | Bizcochuelo: Vainilla | Relleno(s): Dulce de leche | Diseño: Minimalista".to_string(),
    }
}

/// 已填好三步数据、停在 Confirm 步的会话
pub fn confirm_ready_session(today: NaiveDate, delivery_date: NaiveDate) -> CheckoutSession {
    let mut session = CheckoutSession::new(vec![sample_line_item()], today);
    session.contact.name = "Ana García".to_string();
    session.contact.email = "ana@example.com".to_string();
    session.contact.phone = "099111222".to_string();
    session.delivery.delivery_type = DeliveryType::Pickup;
    session.delivery.date = Some(delivery_date);
    session.step = CheckoutStep::Confirm;
    session
}

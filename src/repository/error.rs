// ==========================================
// 定制蛋糕排期系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 失败路径全部走类型化 Result, 不允许静默吞错
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 产能台账错误 =====
    /// 预约日产能已满（可纠正: 用户重新选日期）
    #[error("当日产能已满: date={date}, capacity={capacity}")]
    CapacityExceeded { date: NaiveDate, capacity: u32 },

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl RepositoryError {
    /// 是否为产能已满（供编排器路由回日期选择步骤）
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, RepositoryError::CapacityExceeded { .. })
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

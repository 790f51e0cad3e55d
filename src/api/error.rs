// ==========================================
// 定制蛋糕排期系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换Repository错误为用户友好的错误消息
// 红线: 产能已满是可纠正的业务失败, 必须保留类型化信息供界面路由
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 当日产能已满（可纠正: 换日期重试）
    #[error("当日产能已满: date={date}, capacity={capacity}")]
    CapacityExceeded { date: NaiveDate, capacity: u32 },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::CapacityExceeded { date, capacity } => {
                ApiError::CapacityExceeded { date, capacity }
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;

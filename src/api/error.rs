// ==========================================
// 绩效评分引擎 - API层错误类型
// ==========================================
// 职责: 定义调用方可见的错误分类，转换 Repository / Engine 错误
// ==========================================

use crate::domain::types::EvaluationState;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: action={action}, from={from}")]
    InvalidTransition {
        action: String,
        from: EvaluationState,
    },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 年度奖金配置不存在
    #[error("年度奖金配置不存在: year={0}")]
    ConfigNotFound(i32),

    #[error("外部评分服务失败: {0}")]
    ScoringUnavailable(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

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
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
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
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidTransition { action, from } => {
                ApiError::InvalidTransition { action, from }
            }
            EngineError::PermissionDenied(msg) => ApiError::PermissionDenied(msg),
            EngineError::ValidationError(msg) => ApiError::ValidationError(msg),
            EngineError::ScoringUnavailable(msg) => ApiError::ScoringUnavailable(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Evaluation".to_string(),
            id: "EV1".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m.contains("EV1")));
    }

    #[test]
    fn test_engine_transition_error_keeps_source_state() {
        let err: ApiError = EngineError::InvalidTransition {
            action: "close".to_string(),
            from: EvaluationState::ManagerDraft,
        }
        .into();
        match err {
            ApiError::InvalidTransition { action, from } => {
                assert_eq!(action, "close");
                assert_eq!(from, EvaluationState::ManagerDraft);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

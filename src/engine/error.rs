// ==========================================
// 绩效评分引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 守卫失败时不修改任何记录
// ==========================================

use crate::domain::period::PeriodKeyError;
use crate::domain::types::EvaluationState;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("无效的状态转换: action={action}, from={from}")]
    InvalidTransition {
        action: String,
        from: EvaluationState,
    },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("外部评分服务失败: {0}")]
    ScoringUnavailable(String),
}

impl From<PeriodKeyError> for EngineError {
    fn from(err: PeriodKeyError) -> Self {
        EngineError::ValidationError(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

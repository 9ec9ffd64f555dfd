// ==========================================
// 绩效评分引擎 - API层
// ==========================================
// 职责: 用例编排（仓储读取 -> 引擎计算 -> 持久化）
// 红线: 业务规则在 engine，SQL 在 repository
// ==========================================

pub mod assignment_api;
pub mod bonus_api;
pub mod error;
pub mod evaluation_api;

pub use assignment_api::AssignmentApi;
pub use bonus_api::{BonusApi, BonusRunSummary};
pub use error::{ApiError, ApiResult};
pub use evaluation_api::EvaluationApi;

use crate::repository::RepositoryResult;

/// 在阻塞线程池执行仓储调用
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("后台任务失败: {}", e)))?
        .map_err(ApiError::from)
}

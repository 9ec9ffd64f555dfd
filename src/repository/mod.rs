// ==========================================
// 绩效评分引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod bono_repo;
pub mod employee_repo;
pub mod error;
pub mod evaluation_repo;
pub mod participation_repo;
pub mod sql_utils;
pub mod template_repo;

// 重导出核心仓储
pub use bono_repo::{BonoAnualRepository, BonoConfigRepository};
pub use employee_repo::EmployeeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use evaluation_repo::EvaluationRepository;
pub use participation_repo::{OverrideRepository, ParticipationRepository};
pub use template_repo::TemplateRepository;

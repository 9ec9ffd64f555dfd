// ==========================================
// 绩效评分引擎 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 无状态, 数据加载与持久化由 API 层负责
// ==========================================

pub mod accumulation;
pub mod assignment;
pub mod bonus;
pub mod capability;
pub mod error;
pub mod period_score;
pub mod scoring;
pub mod workflow;

// 重导出核心引擎
pub use accumulation::AccumulationAggregator;
pub use assignment::AssignmentResolver;
pub use bonus::BonusEngine;
pub use capability::{Actor, CapabilityTable};
pub use error::{EngineError, EngineResult};
pub use period_score::PeriodScoreCalculator;
pub use scoring::{EmployeeFinalScore, EmployeeSelector, ScoreAggregator, StaticScoreAggregator};
pub use workflow::{EvaluationWorkflow, Transition, WorkflowPolicy};

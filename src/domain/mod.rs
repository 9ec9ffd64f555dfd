// ==========================================
// 绩效评分引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod bonus;
pub mod employee;
pub mod evaluation;
pub mod goal;
pub mod period;
pub mod template;
pub mod types;

// 重导出核心类型
pub use bonus::{BonoAnual, BonoConfig, BonoOverride, ConfigSource, EffectiveBonoConfig, PayoutScale};
pub use employee::{
    Employee, EmployeeObjectiveOverride, EmployeeSectorParticipation, EmployeeSummary,
};
pub use evaluation::{push_timeline, Evaluation, EvaluationComments, NewTimelineEntry, TimelineEntry};
pub use goal::{Goal, PeriodScore, ProcessedGoal, ReportedGoal};
pub use period::{FiscalPeriodKey, PeriodKeyError, PeriodSuffix};
pub use template::{AssignmentResult, AssignmentRow, ObjectiveTemplate};
pub use types::{
    AccumulationMode, ComparisonOperator, EvaluationState, OverrideScope, ScaleType, ScopeType,
    TemplateKind, TimelineAction, TrackingMethod,
};

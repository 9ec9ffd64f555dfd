// ==========================================
// 绩效评分引擎 - 核心库
// ==========================================
// 职责: 目标权重分配 / 期间评分 / 审批流 / 年度奖金
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 用例编排
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AccumulationMode, ComparisonOperator, EvaluationState, ScopeType, TemplateKind,
    TimelineAction, TrackingMethod,
};

// 领域实体
pub use domain::{
    AssignmentResult, AssignmentRow, BonoAnual, BonoConfig, Employee, Evaluation,
    FiscalPeriodKey, Goal, ObjectiveTemplate, PeriodScore,
};

// 引擎
pub use engine::{
    AccumulationAggregator, AssignmentResolver, BonusEngine, CapabilityTable,
    EvaluationWorkflow, PeriodScoreCalculator, ScoreAggregator, Transition,
};

// API
pub use api::{ApiError, ApiResult, AssignmentApi, BonusApi, EvaluationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "绩效评分引擎";

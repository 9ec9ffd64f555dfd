// ==========================================
// 绩效评分引擎 - 指标 (Meta) 领域模型
// ==========================================

use crate::domain::types::{AccumulationMode, ComparisonOperator};
use serde::{Deserialize, Serialize};

// ==========================================
// Goal - 指标定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub goal_id: String,
    pub template_id: String,
    pub name: String,
    pub expected: f64,
    pub operator: ComparisonOperator,
    pub weight: f64,
    #[serde(default)]
    pub accumulation: AccumulationMode,
    /// 允许达成率超过 100
    #[serde(default)]
    pub allow_exceed: bool,
}

/// 指标 + 本期上报值
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedGoal {
    pub goal: Goal,
    /// 本期上报值（未上报为 None）
    pub result: Option<f64>,
}

// ==========================================
// ProcessedGoal - 单指标评分结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedGoal {
    pub goal_id: String,
    pub name: String,
    pub expected: f64,
    pub operator: ComparisonOperator,
    pub weight: f64,
    pub accumulation: AccumulationMode,
    /// 本期上报值（不含历史累计）
    pub result: Option<f64>,
    /// 累计模式下参与判定的总值
    pub cumulative_total: Option<f64>,
    pub cumple: bool,
    pub achievement_pct: f64,
}

// ==========================================
// PeriodScore - 期间评分
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodScore {
    pub processed_goals: Vec<ProcessedGoal>,
    /// 无指标时为 None
    pub objective_score: Option<f64>,
}

impl PeriodScore {
    pub fn empty() -> Self {
        Self {
            processed_goals: Vec::new(),
            objective_score: None,
        }
    }
}

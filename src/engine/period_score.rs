// ==========================================
// 绩效评分引擎 - 期间评分计算器
// ==========================================
// 输入: 指标定义 + 本期上报值 + 历史累计 (goal_id -> sum)
// 输出: PeriodScore
// ==========================================
// 规则:
// - 累计指标: 判定值 = 本期值 + 历史累计; 期间指标: 判定值 = 本期值
// - cumple: 零容差比较
// - 达成率: 由判定值与期望值得出，不允许超额时封顶 100
// - processed.result 保留本期值，不回写累计值
// - objective_score: 按指标权重加权平均; 权重全为 0 时取算术平均
// ==========================================

use crate::domain::goal::{Goal, PeriodScore, ProcessedGoal, ReportedGoal};
use crate::domain::types::{AccumulationMode, ComparisonOperator};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// PeriodScoreCalculator - 期间评分计算器
// ==========================================
pub struct PeriodScoreCalculator {}

impl Default for PeriodScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodScoreCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 将评估单中的上报值挂到指标上
    pub fn attach_results(goals: Vec<Goal>, results: &BTreeMap<String, f64>) -> Vec<ReportedGoal> {
        goals
            .into_iter()
            .map(|goal| {
                let result = results.get(&goal.goal_id).copied();
                ReportedGoal { goal, result }
            })
            .collect()
    }

    /// 计算期间评分
    ///
    /// # 参数
    /// - `goals`: 指标 + 本期上报值
    /// - `prior`: 历史累计 (goal_id -> sum)，仅累计指标使用
    ///
    /// # 错误
    /// - ValidationError: 期望值/权重/上报值非法
    pub fn score(
        &self,
        goals: &[ReportedGoal],
        prior: &HashMap<String, f64>,
    ) -> EngineResult<PeriodScore> {
        if goals.is_empty() {
            return Ok(PeriodScore::empty());
        }

        for reported in goals {
            validate_goal(reported)?;
        }

        let processed_goals: Vec<ProcessedGoal> = goals
            .iter()
            .map(|reported| self.process_goal(reported, prior))
            .collect();

        let objective_score = Some(weighted_score(&processed_goals));

        Ok(PeriodScore {
            processed_goals,
            objective_score,
        })
    }

    fn process_goal(&self, reported: &ReportedGoal, prior: &HashMap<String, f64>) -> ProcessedGoal {
        let goal = &reported.goal;
        let period_value = reported.result.unwrap_or(0.0);

        let (total, cumulative_total) = match goal.accumulation {
            AccumulationMode::Cumulative => {
                let total = period_value + prior.get(&goal.goal_id).copied().unwrap_or(0.0);
                (total, Some(total))
            }
            AccumulationMode::Period => (period_value, None),
        };

        let cumple = goal.operator.compare(total, goal.expected);
        let achievement_pct =
            achievement_pct(total, goal.expected, goal.operator, cumple, goal.allow_exceed);

        ProcessedGoal {
            goal_id: goal.goal_id.clone(),
            name: goal.name.clone(),
            expected: goal.expected,
            operator: goal.operator,
            weight: goal.weight,
            accumulation: goal.accumulation,
            result: reported.result,
            cumulative_total,
            cumple,
            achievement_pct,
        }
    }
}

fn validate_goal(reported: &ReportedGoal) -> EngineResult<()> {
    let goal = &reported.goal;
    if !goal.expected.is_finite() {
        return Err(EngineError::ValidationError(format!(
            "指标{}期望值非法: {}",
            goal.goal_id, goal.expected
        )));
    }
    if !goal.weight.is_finite() || goal.weight < 0.0 {
        return Err(EngineError::ValidationError(format!(
            "指标{}权重非法: {}",
            goal.goal_id, goal.weight
        )));
    }
    if let Some(r) = reported.result {
        if !r.is_finite() {
            return Err(EngineError::ValidationError(format!(
                "指标{}上报值非法: {}",
                goal.goal_id, r
            )));
        }
    }
    Ok(())
}

/// 单指标达成率 (百分比)
///
/// - `>=` / `>`: 判定值 / 期望值
/// - `<=` / `<`: 期望值 / 判定值（越小越好）
/// - `==`: 达标 100，否则按相对偏差递减
///
/// 结果不小于 0；`allow_exceed=false` 时封顶 100。
pub fn achievement_pct(
    total: f64,
    expected: f64,
    operator: ComparisonOperator,
    cumple: bool,
    allow_exceed: bool,
) -> f64 {
    let fallback = if cumple { 100.0 } else { 0.0 };

    let raw = match operator {
        ComparisonOperator::Gte | ComparisonOperator::Gt => {
            if expected > 0.0 {
                total / expected * 100.0
            } else {
                fallback
            }
        }
        ComparisonOperator::Lte | ComparisonOperator::Lt => {
            if total > 0.0 && expected >= 0.0 {
                expected / total * 100.0
            } else {
                fallback
            }
        }
        ComparisonOperator::Eq => {
            if cumple {
                100.0
            } else if expected != 0.0 {
                (1.0 - (total - expected).abs() / expected.abs()) * 100.0
            } else {
                0.0
            }
        }
    };

    let pct = if raw.is_finite() { raw.max(0.0) } else { fallback };
    if allow_exceed {
        pct
    } else {
        pct.min(100.0)
    }
}

/// 按权重合成期间得分
fn weighted_score(goals: &[ProcessedGoal]) -> f64 {
    let total_weight: f64 = goals.iter().map(|g| g.weight).sum();
    if total_weight > 0.0 {
        goals
            .iter()
            .map(|g| g.achievement_pct * g.weight)
            .sum::<f64>()
            / total_weight
    } else {
        goals.iter().map(|g| g.achievement_pct).sum::<f64>() / goals.len() as f64
    }
}

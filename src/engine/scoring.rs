// ==========================================
// 绩效评分引擎 - 最终得分聚合接口
// ==========================================
// 目标得分与能力得分如何合成为最终得分不在本引擎内实现，
// 由外部聚合服务提供；本模块只定义接口与一个静态实现
// ==========================================

use crate::engine::error::EngineResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 员工选择器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSelector {
    pub year: i32,
    pub employee_ids: Vec<String>,
}

/// 员工最终得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeFinalScore {
    pub employee_id: String,
    /// 0..=100，缺失按 0 处理
    pub score_final: Option<f64>,
    #[serde(default)]
    pub breakdown: serde_json::Value,
}

// ==========================================
// ScoreAggregator Trait
// ==========================================
// 实现者: 外部评分服务适配器 / StaticScoreAggregator
#[async_trait]
pub trait ScoreAggregator: Send + Sync {
    async fn compute_for_employees(
        &self,
        selector: &EmployeeSelector,
    ) -> EngineResult<Vec<EmployeeFinalScore>>;
}

/// 静态得分表（命令行导入、测试）
#[derive(Debug, Clone, Default)]
pub struct StaticScoreAggregator {
    scores: HashMap<String, f64>,
}

impl StaticScoreAggregator {
    pub fn new(scores: HashMap<String, f64>) -> Self {
        Self { scores }
    }

    /// 从 JSON 数组加载: `[{"employee_id": "E001", "score_final": 80.0}, ...]`
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let rows: Vec<EmployeeFinalScore> = serde_json::from_str(raw)?;
        Ok(Self::new(
            rows.into_iter()
                .filter_map(|r| r.score_final.map(|s| (r.employee_id, s)))
                .collect(),
        ))
    }
}

#[async_trait]
impl ScoreAggregator for StaticScoreAggregator {
    async fn compute_for_employees(
        &self,
        selector: &EmployeeSelector,
    ) -> EngineResult<Vec<EmployeeFinalScore>> {
        Ok(selector
            .employee_ids
            .iter()
            .map(|id| EmployeeFinalScore {
                employee_id: id.clone(),
                score_final: self.scores.get(id).copied(),
                breakdown: serde_json::Value::Null,
            })
            .collect())
    }
}

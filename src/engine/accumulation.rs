// ==========================================
// 绩效评分引擎 - 历史累计聚合
// ==========================================
// 对同一员工+模板、期间严格早于当前期间的评估单，
// 按 goal_id 汇总上报值（同一指标可出现在多张历史单中，全部计入）
// ==========================================

use crate::domain::evaluation::Evaluation;
use crate::domain::period::FiscalPeriodKey;
use crate::engine::error::EngineResult;
use std::collections::HashMap;

pub struct AccumulationAggregator {}

impl Default for AccumulationAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulationAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总历史累计
    ///
    /// # 参数
    /// - `employee_id` / `template_id`: 过滤条件（传入记录中不匹配的会被忽略）
    /// - `period_key`: 当前期间
    /// - `records`: 候选历史评估单
    ///
    /// # 错误
    /// - ValidationError: 当前期间键非法
    ///
    /// 历史单自身期间键非法时跳过并告警，不影响其他记录。
    pub fn prior_accumulated(
        &self,
        employee_id: &str,
        template_id: &str,
        period_key: &str,
        records: &[Evaluation],
    ) -> EngineResult<HashMap<String, f64>> {
        let current = FiscalPeriodKey::parse(period_key)?;
        let mut sums: HashMap<String, f64> = HashMap::new();

        for record in records
            .iter()
            .filter(|r| r.employee_id == employee_id && r.template_id == template_id)
        {
            let key = match FiscalPeriodKey::parse(&record.period_key) {
                Ok(k) => k,
                Err(e) => {
                    tracing::warn!(
                        evaluation_id = %record.evaluation_id,
                        period_key = %record.period_key,
                        error = %e,
                        "历史评估单期间键非法，跳过"
                    );
                    continue;
                }
            };
            if !key.is_before(&current) {
                continue;
            }

            for (goal_id, value) in &record.goal_results {
                *sums.entry(goal_id.clone()).or_insert(0.0) += value;
            }
        }

        Ok(sums)
    }
}
